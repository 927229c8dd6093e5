/// Durable-outbox storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("outbox storage failure: {reason}")]
    Storage { reason: String },

    #[error("outbox entry {id} is not in state {expected}")]
    BadState { id: u64, expected: &'static str },
}
