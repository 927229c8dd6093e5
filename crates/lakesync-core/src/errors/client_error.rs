/// Client-side sync errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport failure: {reason}")]
    Transport { reason: String },

    #[error("schema mismatch on {table}.{column}: expected {expected}, got {got}")]
    SchemaMismatch {
        table: String,
        column: String,
        expected: String,
        got: String,
    },

    #[error("push gave up after {attempts} consecutive transport failures")]
    RetriesExhausted { attempts: u32 },
}
