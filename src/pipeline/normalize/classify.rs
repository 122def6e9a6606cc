use serde_json::{Map, Value};

/// Which extractor shape a payload was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSchema {
    /// `employee_info` / `medical_examination` payloads.
    VendorA,
    /// Flat `certificate_info` payloads with boolean flags.
    VendorB,
    /// Already canonical (or the legacy `examination_results` spelling).
    Canonical,
    Unknown,
}

type Predicate = fn(&Map<String, Value>) -> bool;

/// Evaluated top to bottom; the first match wins.
const RULES: &[(SourceSchema, Predicate)] = &[
    (SourceSchema::VendorA, is_vendor_a),
    (SourceSchema::VendorB, is_vendor_b),
    (SourceSchema::Canonical, is_canonical),
];

fn is_vendor_a(map: &Map<String, Value>) -> bool {
    map.contains_key("employee_info") || map.contains_key("medical_examination")
}

fn is_vendor_b(map: &Map<String, Value>) -> bool {
    map.contains_key("certificate_info")
}

fn is_canonical(map: &Map<String, Value>) -> bool {
    ["patient", "examination", "examination_results", "certification"]
        .iter()
        .any(|key| map.contains_key(*key))
}

/// Classify a payload by key presence. Non-objects are `Unknown`.
pub fn classify(payload: &Value) -> SourceSchema {
    let Some(map) = payload.as_object() else {
        return SourceSchema::Unknown;
    };

    RULES
        .iter()
        .find(|(_, matches)| matches(map))
        .map(|(schema, _)| *schema)
        .unwrap_or(SourceSchema::Unknown)
}

/// Some extractors wrap the certificate in a `structured_data` object next
/// to the raw markdown; classification looks inside it.
pub fn unwrap_envelope(payload: &Value) -> &Value {
    match payload.get("structured_data") {
        Some(inner @ Value::Object(_)) => inner,
        _ => payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn employee_info_is_vendor_a() {
        assert_eq!(classify(&json!({"employee_info": {}})), SourceSchema::VendorA);
        assert_eq!(classify(&json!({"medical_examination": {}})), SourceSchema::VendorA);
    }

    #[test]
    fn vendor_a_wins_over_later_rules() {
        let payload = json!({
            "employee_info": {},
            "certificate_info": {},
            "patient": {}
        });
        assert_eq!(classify(&payload), SourceSchema::VendorA);
    }

    #[test]
    fn certificate_info_is_vendor_b() {
        let payload = json!({"certificate_info": {}, "patient": {}});
        assert_eq!(classify(&payload), SourceSchema::VendorB);
    }

    #[test]
    fn canonical_keys_are_detected() {
        for key in ["patient", "examination", "examination_results", "certification"] {
            let payload = json!({ key: {} });
            assert_eq!(classify(&payload), SourceSchema::Canonical, "key {key}");
        }
    }

    #[test]
    fn everything_else_is_unknown() {
        assert_eq!(classify(&json!({})), SourceSchema::Unknown);
        assert_eq!(classify(&json!({"restrictions": {}})), SourceSchema::Unknown);
        assert_eq!(classify(&json!([1, 2])), SourceSchema::Unknown);
    }

    #[test]
    fn envelope_only_unwrapped_when_object() {
        let wrapped = json!({"structured_data": {"patient": {}}});
        assert_eq!(unwrap_envelope(&wrapped), &json!({"patient": {}}));

        let not_object = json!({"structured_data": "text", "patient": {}});
        assert_eq!(unwrap_envelope(&not_object), &not_object);
    }
}
