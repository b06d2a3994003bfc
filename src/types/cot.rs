//! Cause of Transmission (COT).
//!
//! The cause of transmission encodes why a value is exchanged with a
//! datapoint. This layer treats it as a range-checked code rather than a
//! closed enumeration: backends are free to use any cause in [1,47],
//! including ones the IEC 60870-5-104 tables leave undefined.

use crate::error::{Result, RtuError};

/// Cause of Transmission (COT).
///
/// Valid codes span [1,47]. The value `0` is a sentinel meaning "use the
/// cause the datapoint was configured with" and is only legal in query
/// parameters, never in a stored datapoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cot(u8);

impl Cot {
    /// Smallest concrete cause code.
    pub const MIN: u8 = 1;

    /// Largest concrete cause code.
    pub const MAX: u8 = 47;

    /// Sentinel: defer to the datapoint's configured cause.
    pub const DEFAULT: Self = Self(0);

    /// Periodic/cyclic transmission (1). Datapoints stored with this
    /// cause deliver unsolicited periodic updates.
    pub const PERIODIC: Self = Self(1);

    /// Create a COT from a raw code.
    ///
    /// Accepts [1,47] and the sentinel `0`.
    #[inline]
    pub fn new(value: u8) -> Result<Self> {
        if Self::is_valid(value) {
            Ok(Self(value))
        } else {
            Err(RtuError::CotOutOfRange(value))
        }
    }

    /// Create a concrete (non-sentinel) COT in [1,47].
    ///
    /// This is the form stored datapoints carry.
    #[inline]
    pub fn concrete(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RtuError::CotOutOfRange(value))
        }
    }

    /// Check whether a raw code is a legal COT: in [1,47] or the
    /// sentinel `0`.
    #[inline]
    pub const fn is_valid(value: u8) -> bool {
        value <= Self::MAX
    }

    /// Get the raw code.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Check if this is the "use configured default" sentinel.
    #[inline]
    pub const fn is_default(self) -> bool {
        self.0 == 0
    }

    /// Check if this cause marks periodic delivery.
    #[inline]
    pub const fn is_periodic(self) -> bool {
        self.0 == 1
    }

    /// Resolve the sentinel against a configured default.
    #[inline]
    pub fn or_default(self, configured: Self) -> Self {
        if self.is_default() {
            configured
        } else {
            self
        }
    }
}

impl TryFrom<u8> for Cot {
    type Error = RtuError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl std::fmt::Display for Cot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_default() {
            f.write_str("default")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
