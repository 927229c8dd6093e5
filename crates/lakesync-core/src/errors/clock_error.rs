/// Hybrid-logical-clock errors.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error("hlc counter overflow within wall millisecond {wall_ms}")]
    CounterOverflow { wall_ms: u64 },
}
