//! Per-organization commission tunables.

use crate::domain::{MoneyError, Pence, Rate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default monthly profit threshold a BDM must clear: £3,500.
pub const DEFAULT_BDM_THRESHOLD: Pence = Pence(350_000);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("threshold amount must not be negative, got {0}")]
    NegativeThreshold(Pence),
    #[error(transparent)]
    Rate(#[from] MoneyError),
}

/// Commission rules of an organization.
///
/// Read fresh on every calculation run, never cached, so a settings change
/// takes effect on the next recalculation of any period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSettings {
    pub bdm_threshold_amount: Pence,
    pub bdm_commission_rate: Rate,
}

impl CommissionSettings {
    /// Validate a threshold/rate pair into settings.
    ///
    /// # Errors
    /// Returns an error for a negative threshold. (The rate is range-checked
    /// at `Rate` construction.)
    pub fn new(threshold: Pence, rate: Rate) -> Result<Self, SettingsError> {
        if threshold.is_negative() {
            return Err(SettingsError::NegativeThreshold(threshold));
        }
        Ok(CommissionSettings {
            bdm_threshold_amount: threshold,
            bdm_commission_rate: rate,
        })
    }
}

impl Default for CommissionSettings {
    /// £3,500 threshold, 100% of the excess paid out.
    fn default() -> Self {
        CommissionSettings {
            bdm_threshold_amount: DEFAULT_BDM_THRESHOLD,
            bdm_commission_rate: Rate::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CommissionSettings::default();
        assert_eq!(settings.bdm_threshold_amount, Pence(350_000));
        assert_eq!(settings.bdm_commission_rate, Rate::ONE);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err = CommissionSettings::new(Pence(-1), Rate::ONE).unwrap_err();
        assert_eq!(err, SettingsError::NegativeThreshold(Pence(-1)));
    }

    #[test]
    fn test_zero_threshold_allowed() {
        let settings = CommissionSettings::new(Pence(0), Rate::ONE).unwrap();
        assert_eq!(settings.bdm_threshold_amount, Pence::ZERO);
    }
}
