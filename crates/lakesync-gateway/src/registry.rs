//! Sharded gateway registry.
//!
//! Gateways are independent; this map shards them by identifier so admin
//! operations (flush, suspend, delete) address one without touching the
//! others.

use std::sync::Arc;

use dashmap::DashMap;

use lakesync_core::errors::{GatewayError, SyncResult};
use lakesync_core::models::protocol::{FlushReport, FlushRequest};

use crate::gateway::Gateway;

/// Process-wide map of live gateways.
#[derive(Default)]
pub struct GatewayRegistry {
    gateways: DashMap<String, Arc<Gateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gateway under its id, replacing any previous instance.
    pub fn insert(&self, gateway: Arc<Gateway>) {
        self.gateways.insert(gateway.id().to_string(), gateway);
    }

    pub fn get(&self, gateway_id: &str) -> Option<Arc<Gateway>> {
        self.gateways
            .get(gateway_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, gateway_id: &str) -> Option<Arc<Gateway>> {
        self.gateways.remove(gateway_id).map(|(_, g)| g)
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }

    /// Admin flush addressed by gateway id.
    pub async fn flush(&self, request: FlushRequest) -> SyncResult<FlushReport> {
        let gateway = self.get(&request.gateway_id).ok_or_else(|| GatewayError::NotFound {
            gateway_id: request.gateway_id.clone(),
        })?;
        gateway.flush().await
    }
}
