/// Sync-rules configuration errors.
///
/// Evaluation-time type mismatches are not errors: the evaluator treats the
/// delta as non-matching and logs. Only malformed rule documents fail.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("invalid sync rules: {reason}")]
    Parse { reason: String },
}
