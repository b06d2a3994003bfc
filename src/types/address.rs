//! Component addressing for RTU datapoints.
//!
//! Common Addresses (COA) and Information Object Addresses (IOA) are
//! tagged values of either integer or text kind. The tag is part of the
//! identity: an integer `5` and a text `"5"` never alias.

/// A Common Address (COA) or Information Object Address (IOA).
///
/// Backends that speak raw IEC 104 use numeric addresses; simulation
/// fabrics frequently address components by symbolic names instead. Both
/// kinds live in the same store, and equality requires the same kind
/// *and* the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// Numeric address (plain IEC 104 style).
    Numeric(i64),
    /// Symbolic address (simulator component names and the like).
    Text(String),
}

impl Address {
    /// Check if this is a numeric address.
    #[inline]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric(_))
    }

    /// Get the numeric value, if this is a numeric address.
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Numeric(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Get the text value, if this is a symbolic address.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Numeric(_) => None,
            Self::Text(s) => Some(s.as_str()),
        }
    }
}

impl From<i64> for Address {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Self::Numeric(value as i64)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "{:?}", s),
        }
    }
}
