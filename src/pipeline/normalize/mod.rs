//! Schema normalizer: reconciles every known extractor payload shape into one
//! [`CanonicalCertificate`].
//!
//! Shape detection is an ordered list of structural predicates (see
//! [`classify`]); each recognised shape has its own mapper. Unrecognised or
//! partial objects degrade to the empty skeleton. Only input that is not a
//! JSON object at all (array, string, number, bool, or unparseable text) is
//! rejected with a [`NormalizeError`].

pub mod canonical;
pub mod classify;
pub mod lenient;
pub mod vendor_a;
pub mod vendor_b;

pub use classify::{classify, unwrap_envelope, SourceSchema};

use serde_json::Value;
use thiserror::Error;

use crate::models::CanonicalCertificate;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Extraction payload must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("Extraction payload is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Map an arbitrary extraction payload into the canonical certificate.
///
/// `null` is treated as an absent payload and yields the skeleton.
/// Re-normalizing the output returns it unchanged.
pub fn normalize(raw: &Value) -> Result<CanonicalCertificate, NormalizeError> {
    match raw {
        Value::Object(_) => {}
        Value::Null => {
            tracing::debug!("Empty extraction payload, using skeleton");
            return Ok(CanonicalCertificate::skeleton());
        }
        other => {
            return Err(NormalizeError::NotAnObject {
                found: json_kind(other),
            })
        }
    }

    let payload = unwrap_envelope(raw);
    let schema = classify(payload);
    tracing::debug!(schema = ?schema, "Classified extraction payload");

    let certificate = match schema {
        SourceSchema::VendorA => vendor_a::map_vendor_a(payload),
        SourceSchema::VendorB => vendor_b::map_vendor_b(payload),
        SourceSchema::Canonical => canonical::map_canonical(payload),
        SourceSchema::Unknown => {
            tracing::warn!("Unrecognised extraction payload shape, using skeleton");
            CanonicalCertificate::skeleton()
        }
    };

    Ok(certificate)
}

/// Parse and normalize a raw JSON string.
pub fn normalize_str(raw: &str) -> Result<CanonicalCertificate, NormalizeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| NormalizeError::InvalidJson(e.to_string()))?;
    normalize(&value)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vendor_a_payload() -> Value {
        json!({
            "employee_info": {
                "full_name": "John Doe",
                "id_number": "8001015009087",
                "company_name": "Acme Mining",
                "job_title": "Drill Operator"
            },
            "medical_examination": {
                "examination_date": "2024-03-14",
                "examination_type": "PERIODICAL",
                "fitness_status": "FIT_WITH_RESTRICTIONS",
                "expiry_date": "2025-03-14",
                "work_restrictions": {"heights": true, "wear_spectacles": true}
            },
            "medical_tests": {
                "blood_test": {"performed": true, "result": "Normal"},
                "hearing_test": {"performed": true, "result": "Mild loss"}
            }
        })
    }

    fn vendor_b_payload() -> Value {
        json!({
            "certificate_info": {
                "employee_name": "Jane Roe",
                "id_number": "9202204720082",
                "company_name": "Blue Crane Logistics",
                "job_title": "Forklift Driver",
                "examination_date": "2024-06-01",
                "pre_employment_checked": true,
                "periodical_checked": false,
                "exit_checked": false,
                "expiry_date": "2025-06-01",
                "fitness_status": {"fit": true},
                "medical_tests": {"bloods": {"done": true, "result": "NAD"}},
                "restrictions": {"confined_spaces": "yes"},
                "comments": "None"
            }
        })
    }

    fn canonical_payload() -> Value {
        json!({
            "patient": {"name": "Sipho Dlamini", "id_number": "", "company": "Acme", "occupation": "Clerk"},
            "examination": {
                "date": "2024-01-10",
                "type": {"pre_employment": false, "periodical": false, "exit": true},
                "tests": {"x_ray": {"done": true, "result": "Clear"}}
            },
            "certification": {"valid_until": "", "unfit": true, "comments": "Exit medical"},
            "restrictions": {"heights": false}
        })
    }

    #[test]
    fn vendor_a_scenario_maps_name_and_bloods() {
        let raw = json!({
            "employee_info": {"full_name": "John Doe"},
            "medical_tests": {"blood_test": {"performed": true, "result": "Normal"}}
        });
        let cert = normalize(&raw).unwrap();
        assert_eq!(cert.patient.name, "John Doe");
        let bloods = &cert.examination.tests["bloods"];
        assert!(bloods.done);
        assert_eq!(bloods.result, "Normal");
    }

    #[test]
    fn normalize_is_idempotent_for_every_shape() {
        for raw in [
            json!({}),
            vendor_a_payload(),
            vendor_b_payload(),
            canonical_payload(),
        ] {
            let once = normalize(&raw).unwrap();
            let twice = normalize(&once.to_value()).unwrap();
            assert_eq!(once, twice, "not idempotent for {raw}");
        }
    }

    #[test]
    fn unknown_object_degrades_to_skeleton() {
        let cert = normalize(&json!({"foo": {"bar": 1}})).unwrap();
        assert_eq!(cert, CanonicalCertificate::skeleton());
    }

    #[test]
    fn null_payload_is_skeleton() {
        assert_eq!(normalize(&Value::Null).unwrap(), CanonicalCertificate::skeleton());
    }

    #[test]
    fn non_object_payload_fails_fast() {
        let err = normalize(&json!(["patient"])).unwrap_err();
        assert!(matches!(err, NormalizeError::NotAnObject { found: "array" }));
        let err = normalize(&json!("patient")).unwrap_err();
        assert!(matches!(err, NormalizeError::NotAnObject { found: "string" }));
    }

    #[test]
    fn normalize_str_rejects_invalid_json() {
        let err = normalize_str("{not json").unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidJson(_)));
    }

    #[test]
    fn normalize_str_accepts_vendor_b_text() {
        let text = vendor_b_payload().to_string();
        let cert = normalize_str(&text).unwrap();
        assert_eq!(cert.patient.name, "Jane Roe");
        assert!(cert.examination.exam_type.pre_employment);
    }

    #[test]
    fn structured_data_envelope_is_unwrapped() {
        let raw = json!({"structured_data": vendor_b_payload(), "raw_content": "# Certificate"});
        let cert = normalize(&raw).unwrap();
        assert_eq!(cert.patient.company, "Blue Crane Logistics");
    }
}
