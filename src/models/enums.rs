use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ExaminationType {
    PreEmployment => "pre_employment",
    Periodical => "periodical",
    Exit => "exit",
});

str_enum!(FitnessStatus {
    Fit => "fit",
    FitWithRestrictions => "fit_with_restrictions",
    FitWithCondition => "fit_with_condition",
    TemporarilyUnfit => "temporarily_unfit",
    Unfit => "unfit",
});

str_enum!(FieldType {
    Text => "text",
    Date => "date",
    Name => "name",
    Id => "id",
    Boolean => "boolean",
    Signature => "signature",
});

str_enum!(ConfidenceLevel {
    High => "high",
    Medium => "medium",
    Low => "low",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn examination_type_round_trip() {
        for (variant, s) in [
            (ExaminationType::PreEmployment, "pre_employment"),
            (ExaminationType::Periodical, "periodical"),
            (ExaminationType::Exit, "exit"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ExaminationType::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn fitness_status_round_trip() {
        for (variant, s) in [
            (FitnessStatus::Fit, "fit"),
            (FitnessStatus::FitWithRestrictions, "fit_with_restrictions"),
            (FitnessStatus::FitWithCondition, "fit_with_condition"),
            (FitnessStatus::TemporarilyUnfit, "temporarily_unfit"),
            (FitnessStatus::Unfit, "unfit"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(FitnessStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn field_type_serializes_lowercase() {
        let json = serde_json::to_string(&FieldType::Signature).unwrap();
        assert_eq!(json, "\"signature\"");
        let back: FieldType = serde_json::from_str("\"id\"").unwrap();
        assert_eq!(back, FieldType::Id);
    }

    #[test]
    fn unknown_value_is_invalid_enum() {
        let err = FitnessStatus::from_str("mostly_fit").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn all_lists_every_variant() {
        assert_eq!(ExaminationType::all().len(), 3);
        assert_eq!(FitnessStatus::all().len(), 5);
        assert_eq!(ConfidenceLevel::all().len(), 3);
    }
}
