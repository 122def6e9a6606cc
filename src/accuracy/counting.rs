//! Field and edit counting shared by every section of the matrix.

use serde_json::Value;

use crate::models::{is_reserved_field, last_segment, EDIT_TRACKING_KEY};

/// Non-null leaves anywhere in stored `extracted_data`.
///
/// Arrays are recursed element by element. Keys with a reserved name are
/// skipped at any depth, which also drops the whole `edit_tracking` map.
/// Empty objects and arrays contribute nothing.
pub fn total_field_count(extracted_data: &Value) -> usize {
    match extracted_data {
        Value::Null => 0,
        Value::Object(map) => map
            .iter()
            .filter(|(key, _)| !is_reserved_field(key))
            .map(|(_, value)| total_field_count(value))
            .sum(),
        Value::Array(items) => items.iter().map(total_field_count).sum(),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => 1,
    }
}

/// Paths in the stored `edit_tracking` map, minus reserved tails.
///
/// A path counts by its presence alone: an entry whose new value equals
/// the old one, or that no longer parses, is still an edit.
pub fn edited_field_paths(extracted_data: &Value) -> impl Iterator<Item = &str> {
    extracted_data
        .get(EDIT_TRACKING_KEY)
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|map| map.keys())
        .map(String::as_str)
        .filter(|path| !is_reserved_field(last_segment(path)))
}

pub fn edited_field_count(extracted_data: &Value) -> usize {
    edited_field_paths(extracted_data).count()
}

/// Display key for a field path: its last segment, title-cased
/// (`patient.id_number` → `Id Number`).
pub fn display_field_name(field_path: &str) -> String {
    last_segment(field_path)
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `part / whole` as a percentage, rounded half-up at `decimals` places.
///
/// Worked in integers: in `f64`, exact ties such as 63.75 land just below
/// the midpoint and round down. `whole` must be non-zero.
pub fn percent_half_up(part: i64, whole: u64, decimals: u32) -> f64 {
    let scale = 10i128.pow(decimals);
    let whole = i128::from(whole);
    // floor((part * 100 * scale) / whole + 1/2) without leaving integers.
    let rounded = (2 * i128::from(part) * 100 * scale + whole).div_euclid(2 * whole);
    rounded as f64 / scale as f64
}

/// Share of fields left untouched, in percent. Nothing to extract counts
/// as fully accurate.
pub fn accuracy_percent(total_fields: usize, edited_fields: usize, decimals: u32) -> f64 {
    if total_fields == 0 {
        return 100.0;
    }
    let untouched = total_fields as i64 - edited_fields as i64;
    percent_half_up(untouched, total_fields as u64, decimals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_non_null_leaves() {
        let data = json!({
            "patient": {"name": "Jane", "id_number": "", "company": null},
            "certification": {"fit": false},
            "notes": ["a", null, {"b": 1}]
        });
        // name, id_number, fit, "a", b
        assert_eq!(total_field_count(&data), 5);
    }

    #[test]
    fn reserved_keys_skipped_at_any_depth() {
        let data = json!({
            "patient": {"name": "Jane", "updated_at": "2024-01-01"},
            "edit_tracking": {"patient.name": {"new_value": "Jane"}},
            "last_edited_at": "2024-01-02",
            "created_at": "2024-01-01"
        });
        assert_eq!(total_field_count(&data), 1);
    }

    #[test]
    fn empty_containers_and_scalars() {
        assert_eq!(total_field_count(&json!({})), 0);
        assert_eq!(total_field_count(&json!({"tests": {}, "list": []})), 0);
        assert_eq!(total_field_count(&json!(null)), 0);
        assert_eq!(total_field_count(&json!("loose")), 1);
    }

    #[test]
    fn edited_count_is_presence_based() {
        let data = json!({
            "edit_tracking": {
                "patient.name": {"previous_value": "A", "new_value": "A"},
                "patient.company": "unreadable",
                "meta.updated_at": {},
                "last_edited_at": {}
            }
        });
        assert_eq!(edited_field_count(&data), 2);
        let paths: Vec<&str> = edited_field_paths(&data).collect();
        assert_eq!(paths, vec!["patient.company", "patient.name"]);
    }

    #[test]
    fn edited_count_without_tracking_is_zero() {
        assert_eq!(edited_field_count(&json!({"patient": {}})), 0);
        assert_eq!(edited_field_count(&json!({"edit_tracking": "none"})), 0);
        assert_eq!(edited_field_count(&json!([1, 2])), 0);
    }

    #[test]
    fn display_names_are_title_cased_tails() {
        assert_eq!(display_field_name("patient.name"), "Name");
        assert_eq!(display_field_name("patient.id_number"), "Id Number");
        assert_eq!(display_field_name("examination.tests.x_ray.result"), "Result");
        assert_eq!(display_field_name("company"), "Company");
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(percent_half_up(16, 18, 2), 88.89);
        assert_eq!(percent_half_up(3, 4, 1), 75.0);
        assert_eq!(percent_half_up(1, 6, 1), 16.7);
        assert_eq!(percent_half_up(1, 8, 2), 12.5);
    }

    #[test]
    fn exact_ties_round_up() {
        // 51/80 = 63.75, 97/160 = 60.625, 1/8 = 12.5
        assert_eq!(percent_half_up(51, 80, 1), 63.8);
        assert_eq!(percent_half_up(97, 160, 2), 60.63);
        assert_eq!(percent_half_up(1, 8, 0), 13.0);
        assert_eq!(accuracy_percent(80, 29, 1), 63.8);
        assert_eq!(accuracy_percent(160, 63, 2), 60.63);
    }

    #[test]
    fn more_edits_than_fields_goes_negative() {
        assert_eq!(accuracy_percent(2, 3, 1), -50.0);
        assert_eq!(percent_half_up(-1, 8, 1), -12.5);
    }

    #[test]
    fn accuracy_defaults_to_full_when_nothing_counted() {
        assert_eq!(accuracy_percent(0, 0, 2), 100.0);
        assert_eq!(accuracy_percent(0, 3, 1), 100.0);
        assert_eq!(accuracy_percent(18, 2, 2), 88.89);
        assert_eq!(accuracy_percent(4, 1, 1), 75.0);
    }
}
