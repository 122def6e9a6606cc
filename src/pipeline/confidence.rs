use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{ConfidenceLevel, FieldType};

/// Confidence thresholds used by the reviewer screen (0..=100 scale)
pub mod thresholds {
    /// At or above this: no special flagging.
    pub const HIGH: u8 = 80;

    /// At or above this: some uncertainty. Below it the value is likely wrong.
    pub const MEDIUM: u8 = 50;
}

/// Score given to values that still carry OCR/layout residue.
const ARTIFACT_SCORE: u8 = 10;

/// Score given to filler values such as "N/A".
const PLACEHOLDER_SCORE: u8 = 30;

const PLACEHOLDERS: &[&str] = &["unknown", "n/a", "na", "-", "--", "none", "null", "tbd", "?"];

const BOOLEAN_SPELLINGS: &[&str] = &[
    "true", "false", "yes", "no", "checked", "unchecked", "x", "1", "0",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%d %B %Y", "%d %b %Y",
];

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*<!--.*?-->\s*").unwrap());
static LAYOUT_COORDINATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\(l=[\d.]+,t=[\d.]+,r=[\d.]+,b=[\d.]+\)\s*").unwrap()
});
static ELEMENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*with ID [a-f0-9-]+\s*").unwrap());
static SIGNATURE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[signature\]|\[doctor's signature\]|signature here").unwrap()
});
static COMMENT_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!--|-->").unwrap());
static SIGNATURE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsignature\b").unwrap());
static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}$").unwrap());
static STRUCTURED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9-]{5,}$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub score: u8,
    pub level: ConfidenceLevel,
}

impl ConfidenceScore {
    pub fn new(score: u8) -> Self {
        let score = score.min(100);
        Self {
            score,
            level: level_for(score),
        }
    }

    /// Anything short of `high` is surfaced to the reviewer.
    pub fn needs_review(&self) -> bool {
        self.level != ConfidenceLevel::High
    }
}

pub fn level_for(score: u8) -> ConfidenceLevel {
    if score >= thresholds::HIGH {
        ConfidenceLevel::High
    } else if score >= thresholds::MEDIUM {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

/// Heuristic likelihood that a displayed field value is correct.
///
/// Residue from the layout extractor (HTML comments, bounding boxes, element
/// ids, a literal "signature" outside a signature field) forces `low`
/// before any shape check runs.
pub fn score(value: &str, field_type: FieldType) -> ConfidenceScore {
    let raw = value.trim();
    if raw.is_empty() {
        return ConfidenceScore::new(0);
    }
    if has_ocr_artifact(raw, field_type) {
        return ConfidenceScore::new(ARTIFACT_SCORE);
    }

    let cleaned = clean_extracted_value(raw);
    if cleaned.is_empty() {
        return ConfidenceScore::new(0);
    }
    if is_placeholder(&cleaned) {
        return ConfidenceScore::new(PLACEHOLDER_SCORE);
    }

    let points = match field_type {
        FieldType::Date => score_date(&cleaned),
        FieldType::Name => score_name(&cleaned),
        FieldType::Id => score_id(&cleaned),
        FieldType::Boolean => score_boolean(&cleaned),
        // Always needs a human look.
        FieldType::Signature => 30,
        FieldType::Text => score_text(&cleaned),
    };
    ConfidenceScore::new(points)
}

/// Strip layout residue the document extractor leaves inside field values.
pub fn clean_extracted_value(value: &str) -> String {
    let cleaned = HTML_COMMENT.replace_all(value, " ");
    let cleaned = LAYOUT_COORDINATES.replace_all(cleaned.trim(), " ");
    let cleaned = ELEMENT_ID.replace_all(cleaned.trim(), " ");
    let cleaned = SIGNATURE_PLACEHOLDER.replace_all(cleaned.trim(), "");
    let cleaned = COMMENT_FRAGMENT.replace_all(cleaned.trim(), "");
    cleaned.trim().to_string()
}

fn has_ocr_artifact(value: &str, field_type: FieldType) -> bool {
    if value.contains("<!--") || value.contains("-->") {
        return true;
    }
    if LAYOUT_COORDINATES.is_match(value) || ELEMENT_ID.is_match(value) {
        return true;
    }
    field_type != FieldType::Signature && SIGNATURE_WORD.is_match(value)
}

fn is_placeholder(value: &str) -> bool {
    let lower = value.to_lowercase();
    PLACEHOLDERS.contains(&lower.as_str())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn score_date(value: &str) -> u8 {
    if parse_date(value).is_some() {
        95
    } else if DATE_SHAPE.is_match(value) {
        // Looks like a date but is not one (e.g. 31/02/2024).
        40
    } else {
        55
    }
}

fn score_name(value: &str) -> u8 {
    if value.chars().any(|c| c.is_ascii_digit()) {
        return 40;
    }
    let letter_tokens = value
        .split_whitespace()
        .filter(|token| token.chars().any(char::is_alphabetic))
        .filter(|token| {
            token
                .chars()
                .all(|c| c.is_alphabetic() || matches!(c, '-' | '\'' | '.'))
        })
        .count();
    if letter_tokens >= 2 {
        90
    } else {
        60
    }
}

fn score_id(value: &str) -> u8 {
    if value.len() == 13 && value.bytes().all(|b| b.is_ascii_digit()) {
        return if is_valid_national_id(value) { 95 } else { 40 };
    }
    if STRUCTURED_ID.is_match(value) {
        75
    } else {
        45
    }
}

fn score_boolean(value: &str) -> u8 {
    let lower = value.to_lowercase();
    if BOOLEAN_SPELLINGS.contains(&lower.as_str()) {
        90
    } else {
        40
    }
}

fn score_text(value: &str) -> u8 {
    let len = value.chars().count().min(100) as u32;
    (50 + len * 3).min(85) as u8
}

/// 13-digit national identity number: `YYMMDD` birth date, then a Luhn
/// check digit over the whole number.
fn is_valid_national_id(value: &str) -> bool {
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 13 {
        return false;
    }

    let yy = (digits[0] * 10 + digits[1]) as i32;
    let month = digits[2] * 10 + digits[3];
    let day = digits[4] * 10 + digits[5];
    let has_birth_date = NaiveDate::from_ymd_opt(1900 + yy, month, day)
        .or_else(|| NaiveDate::from_ymd_opt(2000 + yy, month, day))
        .is_some();

    has_birth_date && luhn_valid(&digits)
}

fn luhn_valid(digits: &[u32]) -> bool {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
