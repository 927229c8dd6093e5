//! Shared data model of the sync plane.

pub mod delta;
pub mod hlc;
pub mod protocol;
pub mod schema;

pub use delta::{ColumnValue, DeltaOp, RowDelta, Scalar, WriteCoordinate};
pub use hlc::HlcTimestamp;
pub use protocol::{
    ClaimsContext, ErrorBody, FlushReport, FlushRequest, PullRequest, PullResponse, PushRequest,
    PushResponse,
};
pub use schema::{ColumnDef, ColumnType, TableSchema};
