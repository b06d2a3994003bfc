//! Error types for the RTU datapoint layer.

use thiserror::Error;

use crate::types::Address;

/// Result type alias for RTU operations.
pub type Result<T> = std::result::Result<T, RtuError>;

/// RTU datapoint layer error types.
#[derive(Debug, Error)]
pub enum RtuError {
    /// A stored relationship does not resolve to an attached datapoint
    #[error("datapoint ({coa}, {ioa}) has invalid relationship: no datapoint with IOA {related} under COA {coa}")]
    DanglingRelationship {
        /// COA scope of the offending datapoint
        coa: Address,
        /// IOA of the offending datapoint
        ioa: Address,
        /// The relationship IOA that failed to resolve
        related: Address,
    },

    /// Two datapoint rows share one (COA, IOA) key
    #[error("duplicate datapoint key ({coa}, {ioa})")]
    DuplicateKey {
        /// COA of the colliding key
        coa: Address,
        /// IOA of the colliding key
        ioa: Address,
    },

    /// A datapoint row does not convert to the expected shape
    #[error("malformed datapoint row: {0}")]
    MalformedRow(String),

    /// Cause of transmission outside [1,47] (or [0,47] where the
    /// sentinel is legal)
    #[error("cause of transmission {0} out of range")]
    CotOutOfRange(u8),

    /// ASDU type ID outside [1,127] (or [0,127] where the sentinel is
    /// legal)
    #[error("ASDU type ID {0} out of range")]
    TypeIdOutOfRange(u8),

    /// Readiness wait exceeded its bound
    #[error("timed out waiting for RTU readiness")]
    ReadyTimeout,

    /// Backend startup or teardown failure
    #[error("backend error: {0}")]
    Backend(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl RtuError {
    /// Create a malformed-row error with a message.
    pub fn malformed_row(msg: impl Into<String>) -> Self {
        Self::MalformedRow(msg.into())
    }

    /// Create a backend error with a message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Check if this error is a fatal configuration error.
    ///
    /// Construction surfaces these; the RTU must not be used afterwards.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DanglingRelationship { .. }
                | Self::DuplicateKey { .. }
                | Self::MalformedRow(_)
                | Self::CotOutOfRange(_)
                | Self::TypeIdOutOfRange(_)
        )
    }

    /// Check if this error is the recoverable readiness timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ReadyTimeout)
    }
}
