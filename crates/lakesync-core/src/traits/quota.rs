//! Control-plane quota hook.

use async_trait::async_trait;

/// Outcome of a quota check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Within limits, admit the push.
    Allowed,
    /// Over a limit. The push is rejected before touching the HLC or buffer.
    Denied {
        reason: String,
        retry_after_ms: Option<u64>,
    },
}

/// Consulted by the gateway before admitting a push batch.
///
/// The control plane owns the policy; the sync plane only asks.
#[async_trait]
pub trait QuotaChecker: Send + Sync {
    async fn check_push(
        &self,
        client_id: &str,
        delta_count: usize,
        byte_estimate: u64,
    ) -> QuotaDecision;
}
