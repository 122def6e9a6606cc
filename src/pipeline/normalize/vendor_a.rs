//! Vendor A: nested `employee_info` / `medical_examination` / `medical_tests`
//! payloads with single-enum examination type and fitness status.

use serde_json::Value;

use super::lenient::{flag, flag_map, lookup, lookup_any, text};
use crate::models::{CanonicalCertificate, ExaminationType, FitnessStatus, MedicalTest};

/// Vendor test key → canonical test key.
pub const TEST_KEYS: &[(&str, &str)] = &[
    ("blood_test", "bloods"),
    ("vision_test", "far_near_vision"),
    ("side_depth_test", "side_depth"),
    ("night_vision_test", "night_vision"),
    ("hearing_test", "hearing"),
    ("heights_test", "heights"),
    ("lung_function_test", "lung_function"),
    ("x_ray", "x_ray"),
    ("drug_screen", "drug_screen"),
];

const EXAMINATION_TYPE_CODES: &[(&str, ExaminationType)] = &[
    ("PRE-EMPLOYMENT", ExaminationType::PreEmployment),
    ("PERIODICAL", ExaminationType::Periodical),
    ("EXIT", ExaminationType::Exit),
];

const FITNESS_CODES: &[(&str, FitnessStatus)] = &[
    ("FIT", FitnessStatus::Fit),
    ("FIT_WITH_RESTRICTIONS", FitnessStatus::FitWithRestrictions),
    ("FIT_WITH_CONDITION", FitnessStatus::FitWithCondition),
    ("TEMPORARILY_UNFIT", FitnessStatus::TemporarilyUnfit),
    ("UNFIT", FitnessStatus::Unfit),
];

pub fn map_vendor_a(payload: &Value) -> CanonicalCertificate {
    let mut cert = CanonicalCertificate::skeleton();

    let employee = |key: &str| text(lookup(payload, &["employee_info", key]));
    let exam = |key: &str| lookup(payload, &["medical_examination", key]);

    cert.patient.name = employee("full_name");
    cert.patient.id_number = employee("id_number");
    cert.patient.company = employee("company_name");
    cert.patient.occupation = employee("job_title");

    cert.examination.date = text(exam("examination_date"));

    // Each flag is an independent equality test against the one enum value.
    let exam_code = text(exam("examination_type"));
    for (code, kind) in EXAMINATION_TYPE_CODES {
        cert.examination.exam_type.set(*kind, exam_code == *code);
    }

    let fitness_code = text(exam("fitness_status"));
    for (code, status) in FITNESS_CODES {
        cert.certification.set_fitness(*status, fitness_code == *code);
    }

    let tests = lookup_any(
        payload,
        &[&["medical_tests"], &["medical_examination", "medical_tests"]],
    );
    if let Some(tests) = tests {
        for (vendor_key, canonical_key) in TEST_KEYS {
            if let Some(entry) = tests.get(*vendor_key).filter(|e| e.is_object()) {
                cert.examination.tests.insert(
                    (*canonical_key).to_string(),
                    MedicalTest {
                        done: flag(entry.get("performed")),
                        result: text(entry.get("result")),
                    },
                );
            }
        }
    }

    cert.certification.valid_until = text(exam("expiry_date"));
    cert.certification.comments = text(exam("comments"));
    cert.certification.follow_up = text(exam("follow_up"));
    cert.certification.review_date = text(exam("review_date"));

    cert.restrictions = flag_map(exam("work_restrictions"));

    cert
}
