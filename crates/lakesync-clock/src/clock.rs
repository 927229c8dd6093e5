//! Monotonic HLC generator.
//!
//! `now` never emits the same or a smaller timestamp twice; `observe` folds
//! externally-seen timestamps into the local state so subsequent emissions
//! dominate everything this process has seen.

use std::sync::{Arc, Mutex};

use lakesync_core::errors::{ClockError, SyncResult};
use lakesync_core::models::hlc::HlcTimestamp;
use lakesync_core::traits::clock::{SystemClock, WallClock};

/// Last-emitted `(wall, counter)` pair.
#[derive(Debug, Clone, Copy, Default)]
struct LastEmitted {
    wall_ms: u64,
    counter: u16,
}

/// A hybrid logical clock.
///
/// Cheap to clone-by-`Arc` and safe to share: emission is serialised behind
/// a mutex, so program-order emissions are strictly increasing.
pub struct HlcClock {
    source: Arc<dyn WallClock>,
    last: Mutex<LastEmitted>,
}

impl HlcClock {
    /// Clock backed by the process wall clock.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Clock backed by an injected wall-clock source.
    pub fn new(source: Arc<dyn WallClock>) -> Self {
        HlcClock {
            source,
            last: Mutex::new(LastEmitted::default()),
        }
    }

    /// Emit the next timestamp.
    ///
    /// If the wall clock moved past the last emission, the counter resets;
    /// otherwise the counter increments within the last wall millisecond.
    /// Fails with `CounterOverflow` when the 16-bit counter would wrap
    /// inside a single millisecond.
    pub fn now(&self) -> SyncResult<HlcTimestamp> {
        let mut last = self.lock();
        let wall = self.source.now_ms();

        let next = if wall > last.wall_ms {
            LastEmitted {
                wall_ms: wall,
                counter: 0,
            }
        } else {
            LastEmitted {
                wall_ms: last.wall_ms,
                counter: Self::bump(last.wall_ms, last.counter)?,
            }
        };

        *last = next;
        Ok(HlcTimestamp::from_parts(next.wall_ms, next.counter))
    }

    /// Fold an externally-seen timestamp into the clock state.
    ///
    /// After observing `t`, every future `now` result is strictly greater
    /// than both `t` and anything emitted before.
    pub fn observe(&self, t: HlcTimestamp) -> SyncResult<()> {
        let mut last = self.lock();
        let wall = self.source.now_ms();
        let (seen_wall, seen_counter) = (t.wall_ms(), t.counter());

        let next = if wall > last.wall_ms && wall > seen_wall {
            // Fresh wall time dominates both sides; counter restarts.
            LastEmitted {
                wall_ms: wall,
                counter: 0,
            }
        } else if seen_wall == last.wall_ms {
            LastEmitted {
                wall_ms: last.wall_ms,
                counter: Self::bump(last.wall_ms, seen_counter.max(last.counter))?,
            }
        } else {
            let wall_ms = seen_wall.max(last.wall_ms);
            LastEmitted {
                wall_ms,
                counter: Self::bump(wall_ms, seen_counter.max(last.counter))?,
            }
        };

        *last = next;
        Ok(())
    }

    /// The most recently emitted or observed timestamp.
    pub fn last_seen(&self) -> HlcTimestamp {
        let last = self.lock();
        HlcTimestamp::from_parts(last.wall_ms, last.counter)
    }

    /// Current wall reading of the injected source.
    pub fn wall_ms(&self) -> u64 {
        self.source.now_ms()
    }

    fn bump(wall_ms: u64, counter: u16) -> Result<u16, ClockError> {
        counter
            .checked_add(1)
            .ok_or(ClockError::CounterOverflow { wall_ms })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LastEmitted> {
        // A poisoned clock mutex means a panic mid-emission; the state is a
        // plain Copy pair, so continuing with it is sound.
        self.last.lock().unwrap_or_else(|e| e.into_inner())
    }
}
