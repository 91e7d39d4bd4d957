//! Availability settings read from the environment.
//!
//! | variable | default |
//! |---|---|
//! | `AVAILERP_DATE_FORMAT` | `%m/%d/%Y` |
//! | `AVAILERP_DEFAULT_UOM` | `u` |
//! | `AVAILERP_STOCK_HORIZON_DAYS` | unset: unbounded forecast |
//!
//! Invalid values are logged and replaced by the default.

use thiserror::Error;
use tracing::warn;

use availerp_availability::{AvailabilityOptions, DEFAULT_DATE_FORMAT, SupplyFormat};
use availerp_products::DEFAULT_UOM;

pub const DATE_FORMAT_VAR: &str = "AVAILERP_DATE_FORMAT";
pub const DEFAULT_UOM_VAR: &str = "AVAILERP_DEFAULT_UOM";
pub const HORIZON_VAR: &str = "AVAILERP_STOCK_HORIZON_DAYS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: '{value}' is not a usable date format")]
    DateFormat { var: &'static str, value: String },

    #[error("{var}: '{value}' is not a number of days")]
    Horizon { var: &'static str, value: String },

    #[error("{var} must not be blank")]
    Blank { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityConfig {
    pub date_format: String,
    pub default_uom: String,
    pub forecast_horizon_days: Option<u32>,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            default_uom: DEFAULT_UOM.to_string(),
            forecast_horizon_days: None,
        }
    }
}

impl AvailabilityConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Lenient load: each invalid setting falls back to its default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let date_format = match parse_date_format(lookup(DATE_FORMAT_VAR)) {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %err, "using default date format");
                None
            }
        };
        let default_uom = match parse_uom(lookup(DEFAULT_UOM_VAR)) {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %err, "using default unit");
                None
            }
        };
        let forecast_horizon_days = match parse_horizon(lookup(HORIZON_VAR)) {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %err, "using unbounded forecast horizon");
                None
            }
        };

        Self {
            date_format: date_format.unwrap_or(defaults.date_format),
            default_uom: default_uom.unwrap_or(defaults.default_uom),
            forecast_horizon_days,
        }
    }

    /// Strict load: the first invalid setting is an error.
    pub fn try_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            date_format: parse_date_format(lookup(DATE_FORMAT_VAR))?
                .unwrap_or(defaults.date_format),
            default_uom: parse_uom(lookup(DEFAULT_UOM_VAR))?.unwrap_or(defaults.default_uom),
            forecast_horizon_days: parse_horizon(lookup(HORIZON_VAR))?,
        })
    }

    pub fn availability_options(&self) -> AvailabilityOptions {
        let supply_format = SupplyFormat::new(self.date_format.clone())
            .unwrap_or_default()
            .with_fallback_uom(self.default_uom.clone());
        AvailabilityOptions {
            supply_format,
            forecast_horizon_days: self.forecast_horizon_days,
        }
    }
}

fn parse_date_format(raw: Option<String>) -> Result<Option<String>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    SupplyFormat::new(raw.clone())
        .map(|f| Some(f.date_format().to_string()))
        .map_err(|_| ConfigError::DateFormat {
            var: DATE_FORMAT_VAR,
            value: raw,
        })
}

fn parse_uom(raw: Option<String>) -> Result<Option<String>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Err(ConfigError::Blank {
            var: DEFAULT_UOM_VAR,
        }),
        Some(v) => Ok(Some(v.trim().to_string())),
    }
}

fn parse_horizon(raw: Option<String>) -> Result<Option<u32>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ConfigError::Horizon {
            var: HORIZON_VAR,
            value: raw,
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;

    use availerp_availability::IncomingSupply;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| vars.get(k).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(AvailabilityConfig::from_lookup(env(&[])), AvailabilityConfig::default());
    }

    #[test]
    fn reads_all_settings() {
        let cfg = AvailabilityConfig::from_lookup(env(&[
            (DATE_FORMAT_VAR, "%Y-%m-%d"),
            (DEFAULT_UOM_VAR, " pcs "),
            (HORIZON_VAR, "30"),
        ]));
        assert_eq!(cfg.date_format, "%Y-%m-%d");
        assert_eq!(cfg.default_uom, "pcs");
        assert_eq!(cfg.forecast_horizon_days, Some(30));

        let options = cfg.availability_options();
        let supply = IncomingSupply {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            quantity: 3,
        };
        assert_eq!(options.supply_format.format(&supply, None), "2024-01-02 (3\u{a0}pcs)");
        assert_eq!(options.forecast_horizon_days, Some(30));
    }

    #[test]
    fn lenient_load_falls_back_per_setting() {
        let cfg = AvailabilityConfig::from_lookup(env(&[
            (DATE_FORMAT_VAR, "%Q"),
            (DEFAULT_UOM_VAR, "kg"),
            (HORIZON_VAR, "soon"),
        ]));
        assert_eq!(cfg.date_format, DEFAULT_DATE_FORMAT);
        assert_eq!(cfg.default_uom, "kg");
        assert_eq!(cfg.forecast_horizon_days, None);
    }

    #[test]
    fn strict_load_reports_the_bad_variable() {
        let err = AvailabilityConfig::try_from_lookup(env(&[(HORIZON_VAR, "-1")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Horizon {
                var: HORIZON_VAR,
                value: "-1".to_string()
            }
        );
        let err = AvailabilityConfig::try_from_lookup(env(&[(DEFAULT_UOM_VAR, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Blank { var: DEFAULT_UOM_VAR });
    }

    #[test]
    fn time_only_date_format_is_rejected() {
        let err = AvailabilityConfig::try_from_lookup(env(&[(DATE_FORMAT_VAR, "%H:%M")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DateFormat {
                var: DATE_FORMAT_VAR,
                value: "%H:%M".to_string()
            }
        );

        let cfg = AvailabilityConfig::from_lookup(env(&[(DATE_FORMAT_VAR, "%H:%M")]));
        assert_eq!(cfg.date_format, DEFAULT_DATE_FORMAT);
        let supply = IncomingSupply {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            quantity: 3,
        };
        assert_eq!(
            cfg.availability_options().supply_format.format(&supply, None),
            "01/02/2024 (3\u{a0}u)"
        );
    }
}
