//! Typed error surface of the sync plane.
//!
//! Every fallible operation returns [`SyncResult`]; domain failures are
//! values, never panics. [`ErrorCode`] is the stable wire taxonomy each
//! error maps onto.

mod adapter_error;
mod client_error;
mod clock_error;
mod codec_error;
mod gateway_error;
mod rules_error;
mod storage_error;

pub use adapter_error::AdapterError;
pub use client_error::ClientError;
pub use clock_error::ClockError;
pub use codec_error::CodecError;
pub use gateway_error::GatewayError;
pub use rules_error::RulesError;
pub use storage_error::StorageError;

use serde::{Deserialize, Serialize};

use crate::models::protocol::ErrorBody;

/// Result alias used across the workspace.
pub type SyncResult<T> = Result<T, SyncError>;

/// Stable error codes carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ClockDrift,
    BufferFull,
    QuotaExceeded,
    HashMismatch,
    InvalidRule,
    TransportError,
    AdapterError,
    SchemaMismatch,
    CounterOverflow,
    DeadlineExceeded,
}

/// Top-level error of the sync plane.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Rules(#[from] RulesError),
}

impl SyncError {
    /// The wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SyncError::Clock(ClockError::CounterOverflow { .. }) => ErrorCode::CounterOverflow,
            SyncError::Codec(CodecError::HashMismatch { .. }) => ErrorCode::HashMismatch,
            SyncError::Codec(_) => ErrorCode::TransportError,
            SyncError::Gateway(GatewayError::ClockDrift { .. }) => ErrorCode::ClockDrift,
            SyncError::Gateway(GatewayError::BufferFull { .. }) => ErrorCode::BufferFull,
            SyncError::Gateway(GatewayError::DeadlineExceeded) => ErrorCode::DeadlineExceeded,
            // State-machine rejections surface as the control plane's signal.
            SyncError::Gateway(
                GatewayError::QuotaExceeded { .. }
                | GatewayError::Deleted { .. }
                | GatewayError::NotFound { .. },
            ) => ErrorCode::QuotaExceeded,
            SyncError::Client(ClientError::SchemaMismatch { .. }) => ErrorCode::SchemaMismatch,
            SyncError::Client(_) => ErrorCode::TransportError,
            SyncError::Adapter(_) => ErrorCode::AdapterError,
            SyncError::Storage(_) => ErrorCode::AdapterError,
            SyncError::Rules(_) => ErrorCode::InvalidRule,
        }
    }

    /// Back-off hint, when the error carries one.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            SyncError::Gateway(GatewayError::BufferFull { retry_after_ms, .. }) => {
                Some(*retry_after_ms)
            }
            SyncError::Gateway(GatewayError::QuotaExceeded { retry_after_ms, .. }) => {
                *retry_after_ms
            }
            _ => None,
        }
    }

    /// Render this error as the wire error body.
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
            retry_after_ms: self.retry_after_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_per_taxonomy() {
        let drift: SyncError = GatewayError::ClockDrift {
            drift_ms: 10_000,
            max_ms: 5_000,
        }
        .into();
        assert_eq!(drift.code(), ErrorCode::ClockDrift);

        let overflow: SyncError = ClockError::CounterOverflow { wall_ms: 12 }.into();
        assert_eq!(overflow.code(), ErrorCode::CounterOverflow);

        let mismatch: SyncError = CodecError::HashMismatch {
            transmitted: "aa".into(),
            recomputed: "bb".into(),
        }
        .into();
        assert_eq!(mismatch.code(), ErrorCode::HashMismatch);
    }

    #[test]
    fn retry_hints_survive_to_the_body() {
        let full: SyncError = GatewayError::BufferFull {
            byte_estimate: 600,
            max_bytes: 500,
            retry_after_ms: 1_500,
        }
        .into();
        let body = full.to_error_body();
        assert_eq!(body.code, ErrorCode::BufferFull);
        assert_eq!(body.retry_after_ms, Some(1_500));
    }
}
