//! Already-canonical payloads: re-read leaf by leaf so missing leaves get
//! their defaults and loosely-typed checkboxes are coerced.

use serde_json::Value;

use super::lenient::{flag, flag_map, lookup, lookup_any, test_map, text};
use crate::models::{CanonicalCertificate, ExaminationType, FitnessStatus};

pub fn map_canonical(payload: &Value) -> CanonicalCertificate {
    let mut cert = CanonicalCertificate::skeleton();

    let patient = |key: &str| text(lookup(payload, &["patient", key]));
    cert.patient.name = patient("name");
    cert.patient.id_number = patient("id_number");
    cert.patient.company = patient("company");
    cert.patient.occupation = patient("occupation");

    // Older records spell the branch `examination_results` and the test map
    // `test_results`.
    if let Some(exam) = lookup_any(payload, &[&["examination"], &["examination_results"]]) {
        cert.examination.date = text(exam.get("date"));
        for kind in ExaminationType::all() {
            let checked = flag(lookup(exam, &["type", kind.as_str()]));
            cert.examination.exam_type.set(*kind, checked);
        }
        cert.examination.tests = test_map(lookup_any(exam, &[&["tests"], &["test_results"]]));
    }

    if let Some(certification) = payload.get("certification") {
        let field = |key: &str| certification.get(key);
        cert.certification.valid_until = text(field("valid_until"));
        for status in FitnessStatus::all() {
            cert.certification
                .set_fitness(*status, flag(field(status.as_str())));
        }
        cert.certification.comments = text(field("comments"));
        cert.certification.follow_up = text(field("follow_up"));
        cert.certification.review_date = text(field("review_date"));
    }

    cert.restrictions = flag_map(payload.get("restrictions"));

    cert
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn well_formed_record_passes_through() {
        let mut expected = CanonicalCertificate::skeleton();
        expected.patient.name = "Sipho Dlamini".into();
        expected.examination.date = "2024-01-10".into();
        expected.examination.exam_type.exit = true;
        expected.certification.unfit = true;
        expected.restrictions.insert("heights".into(), false);

        assert_eq!(map_canonical(&expected.to_value()), expected);
    }

    #[test]
    fn missing_leaves_get_defaults() {
        let cert = map_canonical(&json!({"patient": {"name": "Lerato"}}));
        assert_eq!(cert.patient.name, "Lerato");
        assert_eq!(cert.patient.id_number, "");
        assert!(!cert.certification.fit);
        assert!(cert.examination.tests.is_empty());
    }

    #[test]
    fn legacy_examination_results_spelling() {
        let cert = map_canonical(&json!({
            "examination_results": {
                "date": "2023-11-02",
                "type": {"periodical": true},
                "test_results": {"bloods": {"done": true, "result": "Normal"}}
            }
        }));
        assert_eq!(cert.examination.date, "2023-11-02");
        assert!(cert.examination.exam_type.periodical);
        assert_eq!(cert.examination.tests["bloods"].result, "Normal");
    }

    #[test]
    fn string_checkboxes_are_coerced() {
        let cert = map_canonical(&json!({
            "certification": {"fit": "yes", "unfit": "no"},
            "restrictions": {"wear_spectacles": "checked"}
        }));
        assert!(cert.certification.fit);
        assert!(!cert.certification.unfit);
        assert_eq!(cert.restrictions.get("wear_spectacles"), Some(&true));
    }

    #[test]
    fn wrongly_typed_branches_are_ignored() {
        let cert = map_canonical(&json!({
            "patient": "John",
            "certification": [true],
            "restrictions": null
        }));
        assert_eq!(cert, CanonicalCertificate::skeleton());
    }
}
