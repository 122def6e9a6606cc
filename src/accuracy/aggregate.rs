//! Reductions from documents to the accuracy matrix.
//!
//! Each document is measured once, then folded into per-type, per-field and
//! per-month tallies. Tallies are plain values combined by `with`, so every
//! section is an independent reduction over the same measurements.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Datelike, Utc};

use super::counting::{
    accuracy_percent, display_field_name, edited_field_paths, percent_half_up, total_field_count,
};
use super::types::{AccuracyMatrix, DocumentTypeAccuracy, FieldEditFrequency, MonthlyTrend};
use super::AccuracyError;
use crate::config::AccuracyConfig;
use crate::models::{last_segment, DocumentRecord, UNKNOWN_DOCUMENT_TYPE};

/// What one document contributes to the matrix.
#[derive(Debug, Clone, PartialEq)]
struct DocumentMeasure<'a> {
    document_type: &'a str,
    month: String,
    total_fields: usize,
    edited_fields: usize,
    /// Last segment of each edited path, as stored.
    edited_segments: Vec<&'a str>,
}

impl<'a> DocumentMeasure<'a> {
    fn of(doc: &'a DocumentRecord) -> Self {
        let edited_segments: Vec<&'a str> = edited_field_paths(&doc.extracted_data)
            .map(last_segment)
            .collect();
        let document_type = match doc.document_type.trim() {
            "" => UNKNOWN_DOCUMENT_TYPE,
            other => other,
        };
        Self {
            document_type,
            month: month_label(doc.created_at.year(), doc.created_at.month0()),
            total_fields: total_field_count(&doc.extracted_data),
            edited_fields: edited_segments.len(),
            edited_segments,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TypeTally {
    total_documents: usize,
    edited_documents: usize,
    total_fields: usize,
    edited_fields: usize,
}

impl TypeTally {
    fn with(self, measure: &DocumentMeasure<'_>) -> Self {
        Self {
            total_documents: self.total_documents + 1,
            edited_documents: self.edited_documents + usize::from(measure.edited_fields > 0),
            total_fields: self.total_fields + measure.total_fields,
            edited_fields: self.edited_fields + measure.edited_fields,
        }
    }

    fn combine(self, other: Self) -> Self {
        Self {
            total_documents: self.total_documents + other.total_documents,
            edited_documents: self.edited_documents + other.edited_documents,
            total_fields: self.total_fields + other.total_fields,
            edited_fields: self.edited_fields + other.edited_fields,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MonthTally {
    document_count: usize,
    total_fields: usize,
    edited_fields: usize,
}

impl MonthTally {
    fn with(self, measure: &DocumentMeasure<'_>) -> Self {
        Self {
            document_count: self.document_count + 1,
            total_fields: self.total_fields + measure.total_fields,
            edited_fields: self.edited_fields + measure.edited_fields,
        }
    }
}

/// Aggregate with the default dashboard settings (top 5 fields, 6 months).
pub fn aggregate(documents: &[DocumentRecord], now: DateTime<Utc>) -> AccuracyMatrix {
    aggregate_with_config(documents, now, &AccuracyConfig::default())
}

pub fn aggregate_with_config(
    documents: &[DocumentRecord],
    now: DateTime<Utc>,
    config: &AccuracyConfig,
) -> AccuracyMatrix {
    let measures: Vec<DocumentMeasure<'_>> = documents.iter().map(DocumentMeasure::of).collect();
    build_matrix(&measures, now, config)
}

/// Like [`aggregate_with_config`], but gives up as soon as `cancel` is set.
/// A cancelled run returns no partial matrix.
pub fn aggregate_cancellable(
    documents: &[DocumentRecord],
    now: DateTime<Utc>,
    config: &AccuracyConfig,
    cancel: &AtomicBool,
) -> Result<AccuracyMatrix, AccuracyError> {
    let measures = documents
        .iter()
        .map(|doc| {
            if cancel.load(Ordering::Relaxed) {
                Err(AccuracyError::Cancelled)
            } else {
                Ok(DocumentMeasure::of(doc))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    if cancel.load(Ordering::Relaxed) {
        return Err(AccuracyError::Cancelled);
    }
    Ok(build_matrix(&measures, now, config))
}

fn build_matrix(
    measures: &[DocumentMeasure<'_>],
    now: DateTime<Utc>,
    config: &AccuracyConfig,
) -> AccuracyMatrix {
    let by_type = measures
        .iter()
        .fold(BTreeMap::<&str, TypeTally>::new(), |mut acc, measure| {
            let tally = acc.remove(measure.document_type).unwrap_or_default();
            acc.insert(measure.document_type, tally.with(measure));
            acc
        });

    let overall = by_type
        .values()
        .fold(TypeTally::default(), |acc, tally| acc.combine(*tally));

    let document_types = by_type
        .into_iter()
        .map(|(document_type, tally)| DocumentTypeAccuracy {
            document_type: document_type.to_string(),
            total_documents: tally.total_documents,
            edited_documents: tally.edited_documents,
            total_fields: tally.total_fields,
            edited_fields: tally.edited_fields,
            accuracy_rate: accuracy_percent(tally.total_fields, tally.edited_fields, 2),
        })
        .collect();

    let (frequently_edited_fields, total_edits) =
        frequently_edited(measures, config.top_edited_fields);

    AccuracyMatrix {
        document_types,
        frequently_edited_fields,
        monthly_trends: monthly_trends(measures, now, config.trend_months),
        overall_accuracy: accuracy_percent(overall.total_fields, overall.edited_fields, 2),
        total_edits,
    }
}

/// Top `limit` fields by edit count, with percentages taken against every
/// counted edit, not only the ones shown.
///
/// Fields are tallied by their raw last segment; the display name is only
/// derived for the output rows.
fn frequently_edited(
    measures: &[DocumentMeasure<'_>],
    limit: usize,
) -> (Vec<FieldEditFrequency>, usize) {
    let counts = measures
        .iter()
        .flat_map(|m| m.edited_segments.iter().copied())
        .fold(BTreeMap::<&str, usize>::new(), |mut acc, segment| {
            *acc.entry(segment).or_default() += 1;
            acc
        });
    let total_edits: usize = counts.values().sum();
    if total_edits == 0 {
        return (Vec::new(), 0);
    }

    let mut ranked: Vec<(String, &str, usize)> = counts
        .into_iter()
        .map(|(segment, count)| (display_field_name(segment), segment, count))
        .collect();
    // Count descending, then display name, then raw segment.
    ranked.sort_by(|a, b| {
        b.2.cmp(&a.2)
            .then_with(|| a.0.cmp(&b.0))
            .then_with(|| a.1.cmp(b.1))
    });
    ranked.truncate(limit);

    let fields = ranked
        .into_iter()
        .map(|(field_name, _, edit_count)| FieldEditFrequency {
            field_name,
            edit_count,
            percentage: percent_half_up(edit_count as i64, total_edits as u64, 1),
        })
        .collect();
    (fields, total_edits)
}

/// One bucket per calendar month ending at `now`, zero-filled, oldest first.
/// Documents created outside the window are left out of the trend.
fn monthly_trends(
    measures: &[DocumentMeasure<'_>],
    now: DateTime<Utc>,
    months: u32,
) -> Vec<MonthlyTrend> {
    let seeded: BTreeMap<String, MonthTally> = trend_window(now, months)
        .into_iter()
        .map(|label| (label, MonthTally::default()))
        .collect();

    let buckets = measures.iter().fold(seeded, |mut acc, measure| {
        if let Some(tally) = acc.get(&measure.month).copied() {
            acc.insert(measure.month.clone(), tally.with(measure));
        }
        acc
    });

    // `YYYY-MM` keys sort chronologically.
    buckets
        .into_iter()
        .map(|(month, tally)| MonthlyTrend {
            month,
            accuracy: accuracy_percent(tally.total_fields, tally.edited_fields, 1),
            document_count: tally.document_count,
        })
        .collect()
}

/// Labels of the `months` calendar months ending with the month of `now`.
fn trend_window(now: DateTime<Utc>, months: u32) -> Vec<String> {
    let current = i64::from(now.year()) * 12 + i64::from(now.month0());
    (0..i64::from(months))
        .rev()
        .map(|back| {
            let index = current - back;
            let year = index.div_euclid(12);
            let month0 = index.rem_euclid(12);
            format!("{year:04}-{:02}", month0 + 1)
        })
        .collect()
}

fn month_label(year: i32, month0: u32) -> String {
    format!("{year:04}-{:02}", month0 + 1)
}
