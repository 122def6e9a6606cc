//! Tolerant accessors over untyped extractor JSON.
//!
//! Extractors disagree on types as much as on shapes: a checkbox may arrive
//! as `true`, `"yes"`, `"X"` or `1`. These helpers never fail; anything they
//! cannot read becomes the empty value for its leaf.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::{is_addressable_name, MedicalTest};

/// String spellings an extractor uses for a ticked checkbox.
const CHECKED_VALUES: &[&str] = &["yes", "true", "checked", "1", "x"];

/// Follow `path` through nested objects.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// First path that resolves to a non-null value.
pub fn lookup_any<'a>(value: &'a Value, paths: &[&[&str]]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| lookup(value, path))
        .find(|v| !v.is_null())
}

/// Read a leaf as text. Numbers are rendered, everything else is `""`.
pub fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Read a leaf as a checkbox.
pub fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => is_checked(s),
        Some(Value::Number(n)) => is_checked(&n.to_string()),
        _ => false,
    }
}

pub fn is_checked(raw: &str) -> bool {
    let lower = raw.trim().to_lowercase();
    CHECKED_VALUES.contains(&lower.as_str())
}

/// Read an object of checkboxes. Non-objects yield an empty map.
pub fn flag_map(value: Option<&Value>) -> BTreeMap<String, bool> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter(|(key, _)| addressable(key))
                .map(|(key, v)| (key.clone(), flag(Some(v))))
                .collect()
        })
        .unwrap_or_default()
}

/// Read one test entry. Accepts `{done|performed, result|results}`, a bare
/// checkbox, or a bare result string.
pub fn test_entry(value: &Value) -> MedicalTest {
    match value {
        Value::Object(_) => MedicalTest {
            done: flag(lookup_any(value, &[&["done"], &["performed"]])),
            result: text(lookup_any(value, &[&["result"], &["results"]])),
        },
        Value::String(s) => MedicalTest {
            done: false,
            result: s.clone(),
        },
        other => MedicalTest {
            done: flag(Some(other)),
            result: String::new(),
        },
    }
}

/// Read an object of test entries keyed by test name.
pub fn test_map(value: Option<&Value>) -> BTreeMap<String, MedicalTest> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter(|(name, _)| addressable(name))
                .map(|(name, entry)| (name.clone(), test_entry(entry)))
                .collect()
        })
        .unwrap_or_default()
}

/// Keys that could not be edited later are dropped on the way in.
fn addressable(key: &str) -> bool {
    let keep = is_addressable_name(key);
    if !keep {
        tracing::debug!(key, "Dropping unaddressable map key");
    }
    keep
}
