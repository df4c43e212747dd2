use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Physical door position as reported by the door contact.
///
/// Written only by the door monitor; every other component is a reader.
/// `Unknown` exists only between process start and the first contact sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    Unknown,
    Open,
    Closed,
}

impl DoorState {
    /// Returns `true` if the door is known to be closed.
    #[inline]
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, DoorState::Closed)
    }

    /// Map a normalized contact reading (`true` = closed) onto a door state.
    #[inline]
    #[must_use]
    pub fn from_contact(closed: bool) -> Self {
        if closed { DoorState::Closed } else { DoorState::Open }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DoorState::Unknown => write!(f, "Unknown"),
            DoorState::Open => write!(f, "Open"),
            DoorState::Closed => write!(f, "Closed"),
        }
    }
}

/// Lock actuator position as last commanded by the lock controller.
///
/// `Locked` may only be entered while the door is closed; the controller
/// enforces this guard on every engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Unknown,
    Locked,
    Unlocked,
}

impl LockState {
    /// Returns `true` if the lock is known to be engaged.
    #[inline]
    #[must_use]
    pub fn is_locked(self) -> bool {
        matches!(self, LockState::Locked)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockState::Unknown => write!(f, "Unknown"),
            LockState::Locked => write!(f, "Locked"),
            LockState::Unlocked => write!(f, "Unlocked"),
        }
    }
}

/// Policy under which the two credential channels are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPolicy {
    /// Both the card and the combination must be presented.
    And,
    /// Either channel alone grants access.
    Or,
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AccessPolicy::And => write!(f, "AND"),
            AccessPolicy::Or => write!(f, "OR"),
        }
    }
}

impl std::str::FromStr for AccessPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" | "both" => Ok(AccessPolicy::And),
            "or" | "either" => Ok(AccessPolicy::Or),
            other => Err(Error::InvalidPolicy(other.to_string())),
        }
    }
}

/// Credential channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Card,
    Combo,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Channel::Card => write!(f, "Card"),
            Channel::Combo => write!(f, "Combo"),
        }
    }
}

/// Electrical polarity of a two-level signal.
///
/// Maps the normalized logical meaning (`active`) onto the wire level for
/// hardware whose wiring inverts the sense, e.g. a reed switch pulled to
/// ground when the door is closed or a lock coil energized on low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Wire level that represents the given logical state.
    #[inline]
    #[must_use]
    pub fn level_for(self, active: bool) -> bool {
        match self {
            Polarity::ActiveHigh => active,
            Polarity::ActiveLow => !active,
        }
    }

    /// Logical state represented by the given wire level.
    #[inline]
    #[must_use]
    pub fn is_active(self, level: bool) -> bool {
        match self {
            Polarity::ActiveHigh => level,
            Polarity::ActiveLow => !level,
        }
    }
}

/// Single-size (cascade level 1) card identifier: four UID bytes.
///
/// # Security
/// Equality is evaluated in constant time so that allow-list probing does not
/// leak how many leading bytes of a presented UID matched.
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
pub struct CardUid([u8; 4]);

impl CardUid {
    /// Wrap four raw UID bytes.
    #[must_use]
    pub fn new(bytes: [u8; 4]) -> Self {
        CardUid(bytes)
    }

    /// Get the raw UID bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Block check character for the anti-collision frame: XOR of the four
    /// UID bytes, transmitted by the card as a fifth byte.
    #[must_use]
    pub fn bcc(&self) -> u8 {
        self.0.iter().fold(0, |acc, b| acc ^ b)
    }

    /// Parse from a hex string, with or without `:` separators.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` if the string does not describe
    /// exactly four bytes of hex.
    pub fn from_hex(s: &str) -> Result<Self> {
        let cleaned: String = s.chars().filter(|c| *c != ':').collect();
        if cleaned.len() != 8 || !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidCardUid(format!(
                "expected 8 hex digits, got '{s}'"
            )));
        }
        let mut bytes = [0u8; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &cleaned[2 * i..2 * i + 2];
            *byte = u8::from_str_radix(pair, 16)
                .map_err(|_| Error::InvalidCardUid(format!("invalid hex pair '{pair}'")))?;
        }
        Ok(CardUid(bytes))
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl std::str::FromStr for CardUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CardUid::from_hex(s)
    }
}

impl From<[u8; 4]> for CardUid {
    fn from(bytes: [u8; 4]) -> Self {
        CardUid(bytes)
    }
}

/// Constant-time comparison implementation for CardUid
impl PartialEq for CardUid {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

/// Hash implementation for CardUid
///
/// Implements standard hashing for use in hash-based collections.
impl std::hash::Hash for CardUid {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
