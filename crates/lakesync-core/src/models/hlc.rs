//! Packed hybrid-logical-clock timestamp.
//!
//! A 64-bit value: the high 48 bits are unsigned wall-clock milliseconds
//! since the Unix epoch, the low 16 bits are a logical counter. Total order
//! is numeric comparison, so `(wall, counter)` pairs order lexicographically.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of low bits reserved for the logical counter.
pub const COUNTER_BITS: u32 = 16;

/// Mask selecting the counter bits.
pub const COUNTER_MASK: u64 = (1 << COUNTER_BITS) - 1;

/// Largest wall-clock value representable in the high 48 bits.
pub const MAX_WALL_MS: u64 = (1 << 48) - 1;

/// An opaque 64-bit hybrid logical clock timestamp.
///
/// Encode with [`HlcTimestamp::from_parts`]; the numeric order of the packed
/// value is the clock order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct HlcTimestamp(u64);

impl HlcTimestamp {
    /// The zero timestamp, ordered before every emitted timestamp.
    pub const ZERO: HlcTimestamp = HlcTimestamp(0);

    /// Pack `(wall_ms, counter)` into a timestamp.
    ///
    /// Wall values beyond 48 bits are truncated to the representable range;
    /// real clocks stay far below that bound for the next few millennia.
    pub fn from_parts(wall_ms: u64, counter: u16) -> Self {
        HlcTimestamp(((wall_ms & MAX_WALL_MS) << COUNTER_BITS) | u64::from(counter))
    }

    /// Reinterpret a raw packed value.
    pub fn from_u64(raw: u64) -> Self {
        HlcTimestamp(raw)
    }

    /// The raw packed value.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// The wall-clock component, in milliseconds since the Unix epoch.
    pub fn wall_ms(self) -> u64 {
        self.0 >> COUNTER_BITS
    }

    /// The logical counter component.
    pub fn counter(self) -> u16 {
        (self.0 & COUNTER_MASK) as u16
    }

    /// Absolute distance between this timestamp's wall component and the
    /// given wall clock reading, in milliseconds.
    pub fn wall_distance_ms(self, wall_now_ms: u64) -> u64 {
        self.wall_ms().abs_diff(wall_now_ms)
    }
}

impl fmt::Display for HlcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.wall_ms(), self.counter())
    }
}

impl From<HlcTimestamp> for u64 {
    fn from(t: HlcTimestamp) -> u64 {
        t.0
    }
}
