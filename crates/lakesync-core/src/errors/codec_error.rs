/// Canonical-encoding and wire-framing errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("delta id mismatch: transmitted {transmitted}, recomputed {recomputed}")]
    HashMismatch {
        transmitted: String,
        recomputed: String,
    },

    #[error("truncated input: needed {needed} more bytes, {remaining} remain")]
    Truncated { needed: usize, remaining: usize },

    #[error("unknown {kind} tag {tag}")]
    UnknownTag { kind: &'static str, tag: u8 },

    #[error("invalid utf-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("frame of {len} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { len: usize, limit: usize },

    #[error("invalid json payload: {reason}")]
    InvalidJson { reason: String },
}
