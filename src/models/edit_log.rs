use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key under which the edit log is embedded in a document's `extracted_data`.
pub const EDIT_TRACKING_KEY: &str = "edit_tracking";

/// Timestamp of the most recent reviewer edit, stored next to the edit log.
pub const LAST_EDITED_AT_KEY: &str = "last_edited_at";

/// Metadata names that never count as a field or an edit, at any depth.
pub const RESERVED_FIELD_NAMES: &[&str] = &[
    LAST_EDITED_AT_KEY,
    EDIT_TRACKING_KEY,
    "created_at",
    "updated_at",
];

pub fn is_reserved_field(name: &str) -> bool {
    RESERVED_FIELD_NAMES.contains(&name)
}

/// Whether a test or restriction name can sit inside a field path and be
/// parsed back out. Dots are allowed; empty or reserved segments and
/// surrounding whitespace are not.
pub fn is_addressable_name(name: &str) -> bool {
    name == name.trim()
        && name
            .split('.')
            .all(|segment| !segment.is_empty() && !is_reserved_field(segment))
}

/// Final dot-delimited segment of a field path (`"patient.name"` → `"name"`).
pub fn last_segment(field_path: &str) -> &str {
    field_path.rsplit('.').next().unwrap_or(field_path)
}

/// One reviewer correction. Only the latest edit per path is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditLogEntry {
    pub field_path: String,
    pub previous_value: Value,
    pub new_value: Value,
    pub edited_at: DateTime<Utc>,
}

/// Per-document edit log keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditLog {
    entries: BTreeMap<String, EditLogEntry>,
}

impl EditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the `edit_tracking` map out of stored `extracted_data`.
    ///
    /// Entries that do not parse are skipped; a missing or non-object
    /// `edit_tracking` yields an empty log.
    pub fn from_extracted_data(extracted_data: &Value) -> Self {
        let Some(map) = extracted_data
            .get(EDIT_TRACKING_KEY)
            .and_then(Value::as_object)
        else {
            return Self::new();
        };

        let mut entries = BTreeMap::new();
        for (path, raw) in map {
            match serde_json::from_value::<EditLogEntry>(raw.clone()) {
                Ok(entry) => {
                    entries.insert(path.clone(), entry);
                }
                Err(e) => {
                    tracing::debug!(field_path = %path, error = %e, "Skipping unreadable edit log entry");
                }
            }
        }
        Self { entries }
    }

    /// Insert or overwrite the entry for `entry.field_path` (last write wins).
    pub fn record(&mut self, entry: EditLogEntry) -> Option<EditLogEntry> {
        self.entries.insert(entry.field_path.clone(), entry)
    }

    pub fn get(&self, field_path: &str) -> Option<&EditLogEntry> {
        self.entries.get(field_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EditLogEntry)> {
        self.entries.iter()
    }

    /// Entries whose final path segment is not a reserved name.
    pub fn counted_entries(&self) -> impl Iterator<Item = &EditLogEntry> {
        self.entries
            .iter()
            .filter(|(path, _)| !is_reserved_field(last_segment(path)))
            .map(|(_, entry)| entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn entry(path: &str, new_value: &str) -> EditLogEntry {
        EditLogEntry {
            field_path: path.into(),
            previous_value: json!(""),
            new_value: json!(new_value),
            edited_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn last_segment_of_nested_and_flat_paths() {
        assert_eq!(last_segment("patient.name"), "name");
        assert_eq!(last_segment("examination.tests.bloods.result"), "result");
        assert_eq!(last_segment("company"), "company");
    }

    #[test]
    fn addressable_names() {
        for name in ["heights", "wear.spectacles", "x ray"] {
            assert!(is_addressable_name(name), "{name}");
        }
        for name in ["", " ", "padded ", "a..b", ".lead", "meta.created_at", "updated_at"] {
            assert!(!is_addressable_name(name), "{name:?}");
        }
    }

    #[test]
    fn reserved_names_are_recognised() {
        for name in ["last_edited_at", "edit_tracking", "created_at", "updated_at"] {
            assert!(is_reserved_field(name));
        }
        assert!(!is_reserved_field("name"));
    }

    #[test]
    fn record_overwrites_same_path() {
        let mut log = EditLog::new();
        assert!(log.record(entry("patient.name", "A")).is_none());
        let previous = log.record(entry("patient.name", "B")).unwrap();
        assert_eq!(previous.new_value, json!("A"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.get("patient.name").unwrap().new_value, json!("B"));
    }

    #[test]
    fn counted_entries_skip_reserved_tails() {
        let mut log = EditLog::new();
        log.record(entry("patient.name", "A"));
        log.record(entry("meta.updated_at", "x"));
        log.record(entry("created_at", "x"));
        assert_eq!(log.counted_entries().count(), 1);
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut log = EditLog::new();
        log.record(entry("patient.company", "Acme"));
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["patient.company"]["new_value"], json!("Acme"));
        assert_eq!(value["patient.company"]["field_path"], json!("patient.company"));
    }

    #[test]
    fn from_extracted_data_skips_malformed_entries() {
        let data = json!({
            "patient": {"name": "x"},
            "edit_tracking": {
                "patient.name": {
                    "field_path": "patient.name",
                    "previous_value": "x",
                    "new_value": "y",
                    "edited_at": "2024-03-01T09:00:00Z"
                },
                "patient.company": "not an entry"
            }
        });
        let log = EditLog::from_extracted_data(&data);
        assert_eq!(log.len(), 1);
        assert!(log.get("patient.name").is_some());
    }

    #[test]
    fn from_extracted_data_without_tracking_is_empty() {
        assert!(EditLog::from_extracted_data(&json!({"patient": {}})).is_empty());
        assert!(EditLog::from_extracted_data(&json!({"edit_tracking": []})).is_empty());
    }
}
