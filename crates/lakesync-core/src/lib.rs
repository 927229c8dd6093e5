//! # lakesync-core
//!
//! Foundation crate for the lakesync sync plane.
//! Defines all shared types, errors, config, constants, and adapter traits.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::SyncConfig;
pub use errors::{ErrorCode, SyncError, SyncResult};
pub use models::delta::{ColumnValue, DeltaOp, RowDelta, Scalar, WriteCoordinate};
pub use models::hlc::HlcTimestamp;
pub use models::schema::{ColumnDef, ColumnType, TableSchema};
