use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::{ExaminationType, FitnessStatus};

/// Canonical test keys, in the order the certificate form lists them.
pub const STANDARD_TESTS: &[&str] = &[
    "bloods",
    "far_near_vision",
    "side_depth",
    "night_vision",
    "hearing",
    "heights",
    "lung_function",
    "x_ray",
    "drug_screen",
];

/// Restriction keys printed on the certificate form.
pub const STANDARD_RESTRICTIONS: &[&str] = &[
    "heights",
    "dust_exposure",
    "motorized_equipment",
    "wear_hearing_protection",
    "confined_spaces",
    "chemical_exposure",
    "wear_spectacles",
    "remain_on_treatment_for_chronic_conditions",
];

/// The single reconciled certificate shape every consumer depends on.
///
/// Every declared leaf is always present once serialized: strings default to
/// `""`, flags to `false`, and the open-ended maps to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalCertificate {
    pub patient: Patient,
    pub examination: Examination,
    pub certification: Certification,
    pub restrictions: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patient {
    pub name: String,
    pub id_number: String,
    pub company: String,
    pub occupation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Examination {
    pub date: String,
    #[serde(rename = "type")]
    pub exam_type: ExaminationTypes,
    pub tests: BTreeMap<String, MedicalTest>,
}

/// Examination type as three independent checkboxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExaminationTypes {
    pub pre_employment: bool,
    pub periodical: bool,
    pub exit: bool,
}

impl ExaminationTypes {
    pub fn get(&self, kind: ExaminationType) -> bool {
        match kind {
            ExaminationType::PreEmployment => self.pre_employment,
            ExaminationType::Periodical => self.periodical,
            ExaminationType::Exit => self.exit,
        }
    }

    pub fn set(&mut self, kind: ExaminationType, checked: bool) {
        match kind {
            ExaminationType::PreEmployment => self.pre_employment = checked,
            ExaminationType::Periodical => self.periodical = checked,
            ExaminationType::Exit => self.exit = checked,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicalTest {
    pub done: bool,
    pub result: String,
}

/// Certification block. Fitness is five independent flags, not an enum:
/// the normalizer reshapes, it does not enforce mutual exclusion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    pub valid_until: String,
    pub fit: bool,
    pub fit_with_restrictions: bool,
    pub fit_with_condition: bool,
    pub temporarily_unfit: bool,
    pub unfit: bool,
    pub comments: String,
    pub follow_up: String,
    pub review_date: String,
}

impl Certification {
    pub fn fitness(&self, status: FitnessStatus) -> bool {
        match status {
            FitnessStatus::Fit => self.fit,
            FitnessStatus::FitWithRestrictions => self.fit_with_restrictions,
            FitnessStatus::FitWithCondition => self.fit_with_condition,
            FitnessStatus::TemporarilyUnfit => self.temporarily_unfit,
            FitnessStatus::Unfit => self.unfit,
        }
    }

    pub fn set_fitness(&mut self, status: FitnessStatus, checked: bool) {
        match status {
            FitnessStatus::Fit => self.fit = checked,
            FitnessStatus::FitWithRestrictions => self.fit_with_restrictions = checked,
            FitnessStatus::FitWithCondition => self.fit_with_condition = checked,
            FitnessStatus::TemporarilyUnfit => self.temporarily_unfit = checked,
            FitnessStatus::Unfit => self.unfit = checked,
        }
    }

    /// Every fitness flag that is currently checked.
    pub fn checked_fitness(&self) -> Vec<FitnessStatus> {
        FitnessStatus::all()
            .iter()
            .copied()
            .filter(|s| self.fitness(*s))
            .collect()
    }
}

impl CanonicalCertificate {
    /// Fully-populated empty record.
    pub fn skeleton() -> Self {
        Self::default()
    }

    pub fn to_value(&self) -> serde_json::Value {
        // Plain structs and string-keyed maps always serialize.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skeleton_serializes_every_leaf() {
        let value = CanonicalCertificate::skeleton().to_value();
        assert_eq!(
            value,
            json!({
                "patient": {"name": "", "id_number": "", "company": "", "occupation": ""},
                "examination": {
                    "date": "",
                    "type": {"pre_employment": false, "periodical": false, "exit": false},
                    "tests": {}
                },
                "certification": {
                    "valid_until": "",
                    "fit": false,
                    "fit_with_restrictions": false,
                    "fit_with_condition": false,
                    "temporarily_unfit": false,
                    "unfit": false,
                    "comments": "",
                    "follow_up": "",
                    "review_date": ""
                },
                "restrictions": {}
            })
        );
    }

    #[test]
    fn missing_branches_deserialize_to_defaults() {
        let cert: CanonicalCertificate =
            serde_json::from_value(json!({"patient": {"name": "Jane Roe"}})).unwrap();
        assert_eq!(cert.patient.name, "Jane Roe");
        assert_eq!(cert.patient.company, "");
        assert!(!cert.certification.fit);
        assert!(cert.examination.tests.is_empty());
    }

    #[test]
    fn fitness_accessors_address_each_flag() {
        let mut cert = Certification::default();
        cert.set_fitness(FitnessStatus::TemporarilyUnfit, true);
        assert!(cert.temporarily_unfit);
        assert!(cert.fitness(FitnessStatus::TemporarilyUnfit));
        assert_eq!(cert.checked_fitness(), vec![FitnessStatus::TemporarilyUnfit]);
    }

    #[test]
    fn examination_type_accessors() {
        let mut types = ExaminationTypes::default();
        types.set(ExaminationType::Exit, true);
        assert!(types.exit);
        assert!(types.get(ExaminationType::Exit));
        assert!(!types.get(ExaminationType::Periodical));
    }

    #[test]
    fn standard_lists_have_no_duplicates() {
        let mut tests = STANDARD_TESTS.to_vec();
        tests.sort();
        tests.dedup();
        assert_eq!(tests.len(), STANDARD_TESTS.len());

        let mut restrictions = STANDARD_RESTRICTIONS.to_vec();
        restrictions.sort();
        restrictions.dedup();
        assert_eq!(restrictions.len(), STANDARD_RESTRICTIONS.len());
    }
}
