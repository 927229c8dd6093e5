//! Seams the sync plane consumes or exposes.

pub mod adapter;
pub mod clock;
pub mod quota;

pub use adapter::{DatabaseAdapter, LakeAdapter};
pub use clock::{SystemClock, WallClock};
pub use quota::{QuotaChecker, QuotaDecision};
