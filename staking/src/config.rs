//! Module configuration with TOML file support.

use crate::error::StakingError;
use crate::withdrawal::{WithdrawalBounds, WithdrawalPolicy};
use serde::{Deserialize, Serialize};

/// Configuration for a staking module instance.
///
/// Can be loaded from a TOML file via [`StakingConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Longest withdrawal delay the slasher may set, in seconds.
    #[serde(default = "default_max_withdrawal_delay")]
    pub max_withdrawal_delay: u64,

    /// Shortest withdrawal window the slasher may set, in seconds.
    #[serde(default = "default_min_withdrawal_window")]
    pub min_withdrawal_window: u64,

    /// Upper bound on delay + window, in seconds.
    #[serde(default = "default_max_withdrawal_total")]
    pub max_withdrawal_total: u64,

    /// Initial withdrawal delay. Zero leaves the gate disabled.
    #[serde(default)]
    pub withdrawal_delay: u64,

    /// Initial withdrawal window. Ignored while the delay is zero.
    #[serde(default)]
    pub withdrawal_window: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_max_withdrawal_delay() -> u64 {
    3600
}

fn default_min_withdrawal_window() -> u64 {
    10
}

fn default_max_withdrawal_total() -> u64 {
    7 * 86_400
}

// ── Impl ───────────────────────────────────────────────────────────────

impl StakingConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, StakingError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StakingError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, StakingError> {
        let config: Self = toml::from_str(s).map_err(|e| StakingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, StakingError> {
        toml::to_string_pretty(self).map_err(|e| StakingError::Config(e.to_string()))
    }

    pub fn bounds(&self) -> WithdrawalBounds {
        WithdrawalBounds {
            max_delay: self.max_withdrawal_delay,
            min_window: self.min_withdrawal_window,
            max_total: self.max_withdrawal_total,
        }
    }

    pub fn initial_policy(&self) -> WithdrawalPolicy {
        WithdrawalPolicy {
            delay: self.withdrawal_delay,
            window: self.withdrawal_window,
        }
    }

    /// Reject bounds no policy could satisfy, and an initial policy outside them.
    pub fn validate(&self) -> Result<(), StakingError> {
        if self.min_withdrawal_window > self.max_withdrawal_total {
            return Err(StakingError::Config(format!(
                "min_withdrawal_window ({}) exceeds max_withdrawal_total ({})",
                self.min_withdrawal_window, self.max_withdrawal_total
            )));
        }
        let policy = self.initial_policy();
        if !policy.is_disabled() {
            self.bounds().check(&policy)?;
        }
        Ok(())
    }
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            max_withdrawal_delay: default_max_withdrawal_delay(),
            min_withdrawal_window: default_min_withdrawal_window(),
            max_withdrawal_total: default_max_withdrawal_total(),
            withdrawal_delay: 0,
            withdrawal_window: 0,
        }
    }
}
