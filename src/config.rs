//! Runtime configuration.
//!
//! Sources, lowest priority first: defaults, a JSON file, `SCANPAY_*`
//! environment variables, then command-line flags applied by the binary.

use crate::domain::money::Balance;
use crate::domain::receipt::ReceiptFormat;
use crate::error::{Result, ScanPayError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Highest accepted capture rate.
pub const MAX_TICK_RATE_HZ: u32 = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanPayConfig {
    /// Capture loop frequency.
    pub tick_rate_hz: u32,
    /// How long one frame pull may block before the tick gives up.
    pub frame_timeout_ms: u64,
    /// Ticks after a charge during which the same code is not charged again.
    pub debounce_ticks: u64,
    /// Failed pulls in a row after which scanning stops.
    pub max_consecutive_failures: u32,
    pub initial_balance: Decimal,
    pub log_path: PathBuf,
    pub receipt: ReceiptFormat,
}

impl Default for ScanPayConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30,
            frame_timeout_ms: 100,
            debounce_ticks: 15,
            max_consecutive_failures: 90,
            initial_balance: dec!(100.00),
            log_path: PathBuf::from("transactions.jsonl"),
            receipt: ReceiptFormat::default(),
        }
    }
}

impl ScanPayConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ScanPayError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            ScanPayError::ConfigError(format!("cannot parse {}: {}", path.display(), e))
        })
    }

    /// Applies `SCANPAY_TICK_RATE_HZ`, `SCANPAY_INITIAL_BALANCE` and `SCANPAY_LOG_PATH`.
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(rate) = var("SCANPAY_TICK_RATE_HZ") {
            self.tick_rate_hz = rate.trim().parse().map_err(|_| {
                ScanPayError::ConfigError(format!("SCANPAY_TICK_RATE_HZ is not a number: {}", rate))
            })?;
        }
        if let Some(balance) = var("SCANPAY_INITIAL_BALANCE") {
            self.initial_balance = balance.trim().parse().map_err(|_| {
                ScanPayError::ConfigError(format!(
                    "SCANPAY_INITIAL_BALANCE is not a decimal: {}",
                    balance
                ))
            })?;
        }
        if let Some(path) = var("SCANPAY_LOG_PATH") {
            self.log_path = PathBuf::from(path);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_rate_hz == 0 || self.tick_rate_hz > MAX_TICK_RATE_HZ {
            return Err(ScanPayError::ConfigError(format!(
                "tick_rate_hz must be between 1 and {}, got {}",
                MAX_TICK_RATE_HZ, self.tick_rate_hz
            )));
        }
        if self.frame_timeout_ms == 0 {
            return Err(ScanPayError::ConfigError(
                "frame_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_consecutive_failures == 0 {
            return Err(ScanPayError::ConfigError(
                "max_consecutive_failures must be greater than zero".to_string(),
            ));
        }
        if self.initial_balance < Decimal::ZERO {
            return Err(ScanPayError::ConfigError(format!(
                "initial_balance must not be negative, got {}",
                self.initial_balance
            )));
        }
        if self.initial_balance.normalize().scale() > 2 {
            return Err(ScanPayError::ConfigError(format!(
                "initial_balance must be in whole cents, got {}",
                self.initial_balance
            )));
        }
        Ok(())
    }

    /// Period between ticks. Rates outside `1..=MAX_TICK_RATE_HZ` are clamped.
    pub fn tick_interval(&self) -> Duration {
        let rate = self.tick_rate_hz.clamp(1, MAX_TICK_RATE_HZ);
        Duration::from_nanos(1_000_000_000 / u64::from(rate))
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    pub fn initial_balance(&self) -> Balance {
        Balance::new(self.initial_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ScanPayConfig::default();
        assert_eq!(config.tick_rate_hz, 30);
        assert_eq!(config.tick_interval(), Duration::from_nanos(33_333_333));
        assert_eq!(config.initial_balance(), Balance::new(dec!(100)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tick_rate_hz": 60, "initial_balance": "42.50", "receipt": {{"title": "Shop"}}}}"#
        )
        .unwrap();

        let config = ScanPayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.tick_rate_hz, 60);
        assert_eq!(config.initial_balance, dec!(42.50));
        assert_eq!(config.debounce_ticks, 15);
        assert_eq!(config.receipt.title, "Shop");
        assert_eq!(config.receipt.currency_symbol, "$");
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            ScanPayConfig::from_file(file.path()),
            Err(ScanPayError::ConfigError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SCANPAY_TICK_RATE_HZ", "10"),
            ("SCANPAY_INITIAL_BALANCE", "0.50"),
            ("SCANPAY_LOG_PATH", "/tmp/log.jsonl"),
        ]);
        let config = ScanPayConfig::default()
            .with_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.tick_rate_hz, 10);
        assert_eq!(config.initial_balance, dec!(0.50));
        assert_eq!(config.log_path, PathBuf::from("/tmp/log.jsonl"));
    }

    #[test]
    fn test_env_rejects_garbage() {
        let result = ScanPayConfig::default()
            .with_vars(|key| (key == "SCANPAY_TICK_RATE_HZ").then(|| "fast".to_string()));
        assert!(matches!(result, Err(ScanPayError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_zero_rate_and_negative_balance() {
        let config = ScanPayConfig {
            tick_rate_hz: 0,
            ..ScanPayConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ScanPayConfig {
            initial_balance: dec!(-1),
            ..ScanPayConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_rates_above_limit() {
        let config = ScanPayConfig {
            tick_rate_hz: 2_000_000_000,
            ..ScanPayConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ScanPayError::ConfigError(msg)) if msg.contains("tick_rate_hz")
        ));
        // Even unvalidated, the interval never collapses to zero.
        assert_eq!(config.tick_interval(), Duration::from_millis(1));

        let config = ScanPayConfig {
            tick_rate_hz: MAX_TICK_RATE_HZ,
            ..ScanPayConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_validate_rejects_sub_cent_balance() {
        let config = ScanPayConfig {
            initial_balance: dec!(10.005),
            ..ScanPayConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ScanPayConfig {
            initial_balance: dec!(10.500),
            ..ScanPayConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
