/// Push/pull admission errors raised by the gateway core.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("clock drift of {drift_ms} ms exceeds the {max_ms} ms tolerance")]
    ClockDrift { drift_ms: u64, max_ms: u64 },

    #[error("buffer full: {byte_estimate} of {max_bytes} bytes in use")]
    BufferFull {
        byte_estimate: u64,
        max_bytes: u64,
        retry_after_ms: u64,
    },

    #[error("quota exceeded: {reason}")]
    QuotaExceeded {
        reason: String,
        retry_after_ms: Option<u64>,
    },

    #[error("deadline exceeded before the batch was admitted")]
    DeadlineExceeded,

    #[error("gateway {gateway_id} is deleted")]
    Deleted { gateway_id: String },

    #[error("gateway {gateway_id} not found")]
    NotFound { gateway_id: String },
}
