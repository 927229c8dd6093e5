//! In-process transport: a client wired straight into a gateway.
//!
//! Used by embedded deployments and the end-to-end tests; the HTTP and
//! WebSocket transports live outside the sync plane and implement the same
//! client-side trait.

use std::sync::Arc;

use async_trait::async_trait;

use lakesync_client::Transport;
use lakesync_core::errors::SyncResult;
use lakesync_core::models::protocol::{PullRequest, PullResponse, PushRequest, PushResponse};

use crate::gateway::Gateway;

/// Loopback transport over one gateway instance.
pub struct LoopbackTransport {
    gateway: Arc<Gateway>,
}

impl LoopbackTransport {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        LoopbackTransport { gateway }
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn push(&self, request: PushRequest) -> SyncResult<PushResponse> {
        self.gateway.handle_push(request).await
    }

    async fn pull(&self, request: PullRequest) -> SyncResult<PullResponse> {
        self.gateway.handle_pull(request)
    }
}
