//! # Engine Configuration
//!
//! Configuration for commission policy and scheduling defaults.
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! # Platform cut of every settled appointment, in percent (default: 0)
//! platform_fee_percent = 5.0
//!
//! # Bookable window of the working day
//! opens = "09:00:00"
//! closes = "19:00:00"
//! ```
//!
//! Every field carries a serde default, so a partial file (or none at all)
//! yields a working configuration. Values are validated once at load time;
//! the engine never re-checks them per call.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use sheba_core::{validation, Rate, WorkingHours};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Defaults
// =============================================================================

fn default_platform_fee_percent() -> f64 {
    0.0
}

fn default_opens() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_closes() -> NaiveTime {
    NaiveTime::from_hms_opt(19, 0, 0).unwrap_or(NaiveTime::MIN)
}

// =============================================================================
// Engine Config
// =============================================================================

/// Engine-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Platform cut applied to the appointment total before the
    /// staff/salon split. Percent, not basis points, at the config edge.
    #[serde(default = "default_platform_fee_percent")]
    pub platform_fee_percent: f64,

    /// Opening bound of the bookable day.
    #[serde(default = "default_opens")]
    pub opens: NaiveTime,

    /// Closing bound of the bookable day.
    #[serde(default = "default_closes")]
    pub closes: NaiveTime,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            platform_fee_percent: default_platform_fee_percent(),
            opens: default_opens(),
            closes: default_closes(),
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document and validates the result.
    pub fn from_toml_str(raw: &str) -> EngineResult<Self> {
        let config: EngineConfig =
            toml::from_str(raw).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The platform fee as a basis-point rate for split arithmetic.
    pub fn platform_fee(&self) -> Rate {
        Rate::from_percent(self.platform_fee_percent)
    }

    /// The configured working day.
    pub fn working_hours(&self) -> WorkingHours {
        WorkingHours {
            opens: self.opens,
            closes: self.closes,
        }
    }

    /// Rejects fee percentages outside 0-100 and backwards working hours.
    pub fn validate(&self) -> EngineResult<()> {
        if !(0.0..=100.0).contains(&self.platform_fee_percent) {
            return Err(EngineError::InvalidConfig(format!(
                "platform_fee_percent {} must be between 0 and 100",
                self.platform_fee_percent
            )));
        }
        validation::validate_rate("platform_fee_percent", self.platform_fee())
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;

        WorkingHours::new(self.opens, self.closes)
            .map_err(|_| {
                EngineError::InvalidConfig(format!(
                    "working hours {}..{} are backwards or empty",
                    self.opens, self.closes
                ))
            })
            .map(|_| ())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.platform_fee_percent, 0.0);
        assert!(config.platform_fee().is_zero());
        assert_eq!(config.working_hours(), WorkingHours::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("platform_fee_percent = 5.0").unwrap();
        assert_eq!(config.platform_fee().bps(), 500);
        assert_eq!(config.opens, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn test_full_toml() {
        let raw = r#"
            platform_fee_percent = 2.5
            opens = "08:30:00"
            closes = "20:00:00"
        "#;
        let config = EngineConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.platform_fee().bps(), 250);
        assert_eq!(config.opens, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(config.closes, NaiveTime::from_hms_opt(20, 0, 0).unwrap());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(EngineConfig::from_toml_str("platform_fee_percent = 101.0").is_err());
        assert!(EngineConfig::from_toml_str("platform_fee_percent = -1.0").is_err());

        let backwards = r#"
            opens = "19:00:00"
            closes = "09:00:00"
        "#;
        assert!(EngineConfig::from_toml_str(backwards).is_err());
    }
}
