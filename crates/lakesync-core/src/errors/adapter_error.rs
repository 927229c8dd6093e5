/// Flush-target adapter errors.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("adapter write failed: {reason}")]
    WriteFailed { reason: String },

    #[error("adapter read failed: {reason}")]
    ReadFailed { reason: String },

    #[error("object {key} not found")]
    ObjectNotFound { key: String },

    #[error("flush exhausted after {attempts} attempts: {last_error}")]
    FlushExhausted { attempts: u32, last_error: String },
}
