//! Vendor B: one flat `certificate_info` object whose examination type,
//! fitness and restriction values are already checkbox-shaped.

use serde_json::Value;

use super::lenient::{flag, flag_map, test_map, text};
use crate::models::{CanonicalCertificate, ExaminationType, FitnessStatus};

pub fn map_vendor_b(payload: &Value) -> CanonicalCertificate {
    let mut cert = CanonicalCertificate::skeleton();
    let Some(info) = payload.get("certificate_info").filter(|v| v.is_object()) else {
        return cert;
    };

    let field = |key: &str| info.get(key);

    cert.patient.name = text(field("employee_name"));
    cert.patient.id_number = text(field("id_number"));
    cert.patient.company = text(field("company_name"));
    cert.patient.occupation = text(field("job_title"));

    cert.examination.date = text(field("examination_date"));
    for (key, kind) in [
        ("pre_employment_checked", ExaminationType::PreEmployment),
        ("periodical_checked", ExaminationType::Periodical),
        ("exit_checked", ExaminationType::Exit),
    ] {
        cert.examination.exam_type.set(kind, flag(field(key)));
    }
    cert.examination.tests = test_map(field("medical_tests"));

    cert.certification.valid_until = text(field("expiry_date"));
    let fitness = field("fitness_status");
    for status in FitnessStatus::all() {
        let checked = flag(fitness.and_then(|f| f.get(status.as_str())));
        cert.certification.set_fitness(*status, checked);
    }
    cert.certification.comments = text(field("comments"));
    cert.certification.follow_up = text(field("follow_up"));
    cert.certification.review_date = text(field("review_date"));

    cert.restrictions = flag_map(field("restrictions"));

    cert
}
