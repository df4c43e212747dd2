//! Runtime access-control configuration.
//!
//! The access mode, combination, polarities, and timings are collected into
//! a single [`AccessConfig`] value assembled and validated once at startup
//! and then shared read-only by every loop. There are no runtime flags
//! beyond this; defaults come from [`crate::constants`].

use crate::{
    Result,
    constants::{
        DEFAULT_ALLOWED_UIDS, DEFAULT_COMBO_TARGET, MAX_DIGIT, MAX_UNLOCK_OPEN, RELOCK_DELAY,
        SETTLE_DURATION,
    },
    error::Error,
    types::{AccessPolicy, CardUid, Polarity},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Complete configuration surface of the controller.
///
/// # Examples
///
/// ```
/// use latchkey_core::{AccessConfig, AccessPolicy};
///
/// let config = AccessConfig {
///     policy: AccessPolicy::And,
///     ..AccessConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// How the card and combination channels combine into one decision.
    pub policy: AccessPolicy,

    /// Digit sequence the captured combination is compared against.
    pub combo_target: Vec<u8>,

    /// Quiescent time before a dial position is accepted as a digit.
    pub settle: Duration,

    /// Delay between door-closed observation and deferred re-lock.
    pub relock_delay: Duration,

    /// Ceiling on how long the lock may stay released.
    pub max_unlock_open: Duration,

    /// Wire polarity of the door contact (`active` = closed).
    pub door_polarity: Polarity,

    /// Wire polarity of the lock actuator (`active` = locked).
    pub lock_polarity: Polarity,

    /// Card UIDs authorized for access.
    pub allowed_uids: Vec<CardUid>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            policy: AccessPolicy::Or,
            combo_target: DEFAULT_COMBO_TARGET.to_vec(),
            settle: SETTLE_DURATION,
            relock_delay: RELOCK_DELAY,
            max_unlock_open: MAX_UNLOCK_OPEN,
            door_polarity: Polarity::ActiveLow,
            lock_polarity: Polarity::ActiveHigh,
            allowed_uids: DEFAULT_ALLOWED_UIDS
                .iter()
                .copied()
                .map(CardUid::new)
                .collect(),
        }
    }
}

impl AccessConfig {
    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `Error::Config` for an empty combination target or a zero
    /// settle/unlock window, and `Error::InvalidComboDigit` when a target
    /// digit exceeds the quantizer range.
    pub fn validate(&self) -> Result<()> {
        if self.combo_target.is_empty() {
            return Err(Error::Config("combination target is empty".to_string()));
        }
        for &digit in &self.combo_target {
            if digit > MAX_DIGIT {
                return Err(Error::InvalidComboDigit {
                    digit,
                    max: MAX_DIGIT,
                });
            }
        }
        if self.settle.is_zero() {
            return Err(Error::Config("settle duration must be non-zero".to_string()));
        }
        if self.max_unlock_open.is_zero() {
            return Err(Error::Config(
                "max unlock-open duration must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The allow-list as a set for exact-match membership checks.
    #[must_use]
    pub fn allowed_set(&self) -> HashSet<CardUid> {
        self.allowed_uids.iter().copied().collect()
    }

    /// Length of the configured combination.
    #[must_use]
    pub fn combo_len(&self) -> usize {
        self.combo_target.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AccessConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.combo_len(), 3);
        assert_eq!(config.policy, AccessPolicy::Or);
    }

    #[test]
    fn test_empty_combo_target_rejected() {
        let config = AccessConfig {
            combo_target: vec![],
            ..AccessConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_digit_rejected() {
        let config = AccessConfig {
            combo_target: vec![3, 11, 4],
            ..AccessConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidComboDigit { digit: 11, .. }));
    }

    #[test]
    fn test_zero_settle_rejected() {
        let config = AccessConfig {
            settle: Duration::ZERO,
            ..AccessConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_allowed_set_membership() {
        let config = AccessConfig::default();
        let set = config.allowed_set();
        assert!(set.contains(&CardUid::new([0xEA, 0xE8, 0xD2, 0x84])));
        assert!(!set.contains(&CardUid::new([0, 0, 0, 0])));
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = AccessConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AccessConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
