/// Application-level constants
pub const APP_NAME: &str = "Certwise";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable consulted for the tracing filter.
pub const LOG_ENV_VAR: &str = "RUST_LOG";

pub const TOP_EDITED_FIELDS_ENV_VAR: &str = "CERTWISE_TOP_EDITED_FIELDS";
pub const TREND_MONTHS_ENV_VAR: &str = "CERTWISE_TREND_MONTHS";

/// Filter used when `RUST_LOG` is unset or unparseable.
pub fn default_log_filter() -> &'static str {
    "certwise=info,warn"
}

/// Knobs for the accuracy matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccuracyConfig {
    /// How many frequently-edited fields to report.
    pub top_edited_fields: usize,
    /// How many calendar months the trend covers, ending at the current one.
    pub trend_months: u32,
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self {
            top_edited_fields: 5,
            trend_months: 6,
        }
    }
}

impl AccuracyConfig {
    /// Defaults, overridden by `CERTWISE_TOP_EDITED_FIELDS` and
    /// `CERTWISE_TREND_MONTHS` when they hold a positive integer.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            top_edited_fields: positive_override(&lookup, TOP_EDITED_FIELDS_ENV_VAR)
                .unwrap_or(defaults.top_edited_fields),
            trend_months: positive_override(&lookup, TREND_MONTHS_ENV_VAR)
                .unwrap_or(defaults.trend_months),
        }
    }
}

fn positive_override<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Some(value),
        _ => {
            tracing::warn!(variable = key, value = %raw, "Ignoring invalid configuration override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn app_name_is_certwise() {
        assert_eq!(APP_NAME, "Certwise");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn defaults_match_dashboard() {
        let config = AccuracyConfig::default();
        assert_eq!(config.top_edited_fields, 5);
        assert_eq!(config.trend_months, 6);
    }

    #[test]
    fn overrides_are_applied() {
        let config = AccuracyConfig::from_lookup(lookup_from(&[
            (TOP_EDITED_FIELDS_ENV_VAR, "10"),
            (TREND_MONTHS_ENV_VAR, " 12 "),
        ]));
        assert_eq!(config.top_edited_fields, 10);
        assert_eq!(config.trend_months, 12);
    }

    #[test]
    fn zero_and_garbage_fall_back_to_defaults() {
        let config = AccuracyConfig::from_lookup(lookup_from(&[
            (TOP_EDITED_FIELDS_ENV_VAR, "0"),
            (TREND_MONTHS_ENV_VAR, "six"),
        ]));
        assert_eq!(config, AccuracyConfig::default());
    }

    #[test]
    fn missing_variables_use_defaults() {
        assert_eq!(AccuracyConfig::from_lookup(|_| None), AccuracyConfig::default());
    }
}
