//! ASDU Type Identification.
//!
//! Datapoints carry the type identification of the ASDUs they expect.
//! Codes range informally over [1,127]; the sub-range [45,69] is reserved
//! for command queries (process information in control direction), and
//! only those are subject to the command-type restriction below.

use crate::error::{Result, RtuError};
use crate::types::IoValue;

/// ASDU type identification code.
///
/// Stored datapoints carry a concrete code in [1,127]. Query parameters
/// may additionally use the sentinel `0`, meaning "no type restriction
/// requested".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u8);

impl TypeId {
    /// Smallest concrete type code.
    pub const MIN: u8 = 1;

    /// Largest concrete type code.
    pub const MAX: u8 = 127;

    /// First command-query type code (C_SC_NA_1).
    pub const COMMAND_MIN: u8 = 45;

    /// Last command-query type code.
    pub const COMMAND_MAX: u8 = 69;

    /// Sentinel: no type restriction requested.
    pub const UNSPECIFIED: Self = Self(0);

    /// Create a type ID from a raw code. Accepts [1,127] and the
    /// sentinel `0`.
    #[inline]
    pub fn new(value: u8) -> Result<Self> {
        if value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(RtuError::TypeIdOutOfRange(value))
        }
    }

    /// Create a concrete (non-sentinel) type ID in [1,127].
    #[inline]
    pub fn concrete(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RtuError::TypeIdOutOfRange(value))
        }
    }

    /// Get the raw code.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Check if this is the "no restriction" sentinel.
    #[inline]
    pub const fn is_unspecified(self) -> bool {
        self.0 == 0
    }

    /// Check if this code lies in the reserved command-query sub-range
    /// [45,69].
    #[inline]
    pub const fn is_command(self) -> bool {
        self.0 >= Self::COMMAND_MIN && self.0 <= Self::COMMAND_MAX
    }

    /// Decide whether a query with `supplied` may address a datapoint
    /// declared with `stored`.
    ///
    /// Command queries are restricted to the exact type the datapoint
    /// was declared for; everything else is unconstrained by this layer,
    /// so the restriction only applies when both codes are command
    /// types.
    pub fn validate_command(stored: Self, supplied: Self) -> TypeIdCheck {
        if stored.is_command() && supplied.is_command() {
            if stored == supplied {
                TypeIdCheck::Match
            } else {
                TypeIdCheck::Mismatch
            }
        } else {
            TypeIdCheck::NotApplicable
        }
    }

    /// The set of IO values ASDUs of this type may legally carry, if
    /// this layer knows one for the code.
    ///
    /// Covers single-point, double-point and scaled-value types in both
    /// directions. Unknown codes are unconstrained.
    pub fn permitted_values(self) -> Option<PermittedIos> {
        match self.0 {
            1 | 2 | 30 | 45 | 58 => Some(PermittedIos::SinglePoint),
            3 | 4 | 31 | 46 | 59 => Some(PermittedIos::DoublePoint),
            11 | 12 | 49 | 62 => Some(PermittedIos::ScaledValue),
            _ => None,
        }
    }
}

impl TryFrom<u8> for TypeId {
    type Error = RtuError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unspecified() {
            f.write_str("unspecified")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Outcome of validating a supplied type ID against a datapoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeIdCheck {
    /// Both codes are command types and they agree.
    Match,
    /// Both codes are command types and they disagree; the query must
    /// not be sent.
    Mismatch,
    /// The command-type restriction does not apply to this pairing.
    NotApplicable,
    /// No datapoint exists at the queried address.
    Unattached,
}

impl TypeIdCheck {
    /// Check whether a query may proceed under this outcome.
    #[inline]
    pub const fn permits_query(self) -> bool {
        matches!(self, Self::Match | Self::NotApplicable)
    }
}

/// Value domain an ASDU type may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermittedIos {
    /// Single-point information: off/on.
    SinglePoint,
    /// Double-point information: intermediate/off/on/indeterminate.
    DoublePoint,
    /// Scaled measured value or set-point.
    ScaledValue,
}

impl PermittedIos {
    /// Check whether `value` lies in this domain.
    pub fn permits(self, value: &IoValue) -> bool {
        match self {
            Self::SinglePoint => match value {
                IoValue::Bool(_) => true,
                IoValue::Int(v) => (0..=1).contains(v),
                _ => false,
            },
            Self::DoublePoint => match value {
                IoValue::Int(v) => (0..=3).contains(v),
                _ => false,
            },
            Self::ScaledValue => match value {
                IoValue::Int(v) => {
                    (i64::from(i16::MIN)..=i64::from(i16::MAX)).contains(v)
                }
                _ => false,
            },
        }
    }
}
