//! Wallet settings loading from config.toml.
//!
//! Fee rate, referral bonus schedule, operation limits, and currency all have
//! built-in defaults and can be overridden from a TOML file. Amounts are minor
//! currency units throughout.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Per-operation bounds: minimum, maximum, and a rolling daily cap.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LimitBounds {
    /// Smallest accepted amount, minor units
    pub min: i64,
    /// Largest accepted single amount, minor units
    pub max: i64,
    /// Cap on the day's cumulative same-kind volume, minor units
    pub daily_cap: i64,
}

/// Runtime settings for the wallet core.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WalletSettings {
    /// ISO 4217 currency code wallets are denominated in
    pub currency: String,
    /// Tip platform fee in basis points (200 = 2%)
    pub tip_fee_bps: i64,
    /// Referral bonus per level, minor units, index 0 = level 1
    pub referral_bonuses: [i64; 3],
    /// Minimum account age of the level-2 referrer before level-3 pays out
    pub level3_min_referrer_age_days: i64,
    /// Tip bounds
    pub tip_limits: LimitBounds,
    /// Withdrawal bounds
    pub withdrawal_limits: LimitBounds,
    /// Deposit bounds
    pub deposit_limits: LimitBounds,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            currency: "NGN".to_string(),
            tip_fee_bps: 200,
            referral_bonuses: [100, 50, 25],
            level3_min_referrer_age_days: 30,
            tip_limits: LimitBounds {
                min: 10,
                max: 50_000,
                daily_cap: 100_000,
            },
            withdrawal_limits: LimitBounds {
                min: 100,
                max: 500_000,
                daily_cap: 1_000_000,
            },
            deposit_limits: LimitBounds {
                min: 100,
                max: 2_000_000,
                daily_cap: 5_000_000,
            },
        }
    }
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<WalletSettings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from `./config.toml`, falling back to the built-in
/// defaults when no file exists.
pub fn load_default_settings() -> Result<WalletSettings> {
    if Path::new("config.toml").exists() {
        load_settings("config.toml")
    } else {
        Ok(WalletSettings::default())
    }
}
