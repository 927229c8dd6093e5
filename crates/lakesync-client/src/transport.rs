//! The transport seam.
//!
//! Whether HTTP, WebSocket, or in-process, the coordinator only ever sees
//! this trait. Implementations map their failures to
//! `ClientError::Transport` so the retry/backoff discipline stays uniform.

use async_trait::async_trait;

use lakesync_core::errors::SyncResult;
use lakesync_core::models::protocol::{PullRequest, PullResponse, PushRequest, PushResponse};

/// A connection to one gateway.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn push(&self, request: PushRequest) -> SyncResult<PushResponse>;

    async fn pull(&self, request: PullRequest) -> SyncResult<PullResponse>;
}
