//! # lakesync-client
//!
//! The client side of the sync plane: translate application mutations into
//! deltas, persist them through the outbox, drive push/pull cycles against
//! a transport, and apply incoming deltas to the local working set via
//! last-writer-wins projection.

mod backoff;
mod coordinator;
mod store;
mod transport;

pub use backoff::Backoff;
pub use coordinator::{PullReport, PushReport, SyncCoordinator, SyncReport};
pub use store::{ApplyDiagnostic, ApplyOutcome, LocalStore};
pub use transport::Transport;
