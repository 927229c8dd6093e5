//! # lakesync-clock
//!
//! The hybrid logical clock: a monotonic 64-bit time source combining
//! wall-clock milliseconds with a 16-bit logical counter. One instance lives
//! for the lifetime of a gateway or client and is the sole authority on
//! "when" for that process.

mod clock;

pub use clock::HlcClock;
pub use lakesync_core::models::hlc::HlcTimestamp;
