//! Gateway core: admission, state machine, pull serving.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, instrument, warn};

use lakesync_buffer::{BufferConfig, DeltaBuffer};
use lakesync_clock::HlcClock;
use lakesync_core::config::GatewayConfig;
use lakesync_core::errors::{GatewayError, SyncResult};
use lakesync_core::models::delta::Scalar;
use lakesync_core::models::protocol::{
    FlushReport, PullRequest, PullResponse, PushRequest, PushResponse,
};
use lakesync_core::traits::clock::{SystemClock, WallClock};
use lakesync_core::traits::quota::{QuotaChecker, QuotaDecision};
use lakesync_rules::SyncRules;

use crate::flush::{FlushPipeline, FlushTarget};

/// Lifecycle state of one gateway.
///
/// `Active` serves everything; `Suspended` rejects pushes but keeps serving
/// pulls; `Deleted` rejects all traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    Active,
    Suspended,
    Deleted,
}

/// One gateway instance: HLC + buffer + admission contracts.
pub struct Gateway {
    id: String,
    config: GatewayConfig,
    wall: Arc<dyn WallClock>,
    clock: Arc<HlcClock>,
    buffer: DeltaBuffer,
    rules: Option<SyncRules>,
    quota: Option<Arc<dyn QuotaChecker>>,
    flush: Option<FlushPipeline>,
    state: RwLock<GatewayState>,
    /// Set when the flush pipeline has exhausted its retries.
    degraded: AtomicBool,
}

impl Gateway {
    /// Gateway on the system wall clock.
    pub fn new(id: impl Into<String>, config: GatewayConfig) -> Self {
        Self::with_wall_clock(id, config, Arc::new(SystemClock))
    }

    /// Gateway on an injected wall clock (tests, simulations).
    pub fn with_wall_clock(
        id: impl Into<String>,
        config: GatewayConfig,
        wall: Arc<dyn WallClock>,
    ) -> Self {
        let clock = Arc::new(HlcClock::new(wall.clone()));
        let buffer = DeltaBuffer::new(
            clock.clone(),
            BufferConfig {
                max_bytes: config.max_buffer_bytes,
                max_age_ms: config.max_buffer_age_ms,
            },
        );
        Gateway {
            id: id.into(),
            config,
            wall,
            clock,
            buffer,
            rules: None,
            quota: None,
            flush: None,
            state: RwLock::new(GatewayState::Active),
            degraded: AtomicBool::new(false),
        }
    }

    /// Sync rules applied to claim-carrying pulls.
    pub fn with_rules(mut self, rules: SyncRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Control-plane quota hook consulted before each push.
    pub fn with_quota(mut self, quota: Arc<dyn QuotaChecker>) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Backing store receiving flushed deltas.
    pub fn with_flush_target(mut self, target: FlushTarget) -> Self {
        self.flush = Some(FlushPipeline::new(self.id.clone(), self.config.clone(), target));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> GatewayState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the flush pipeline has gone degraded.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    pub fn buffer(&self) -> &DeltaBuffer {
        &self.buffer
    }

    pub fn clock(&self) -> &Arc<HlcClock> {
        &self.clock
    }

    /// Suspend: pushes rejected, pulls still served.
    pub fn suspend(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if *state == GatewayState::Active {
            *state = GatewayState::Suspended;
        }
    }

    /// Resume from suspension.
    pub fn resume(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if *state == GatewayState::Suspended {
            *state = GatewayState::Active;
        }
    }

    /// Terminal state: all traffic rejected.
    pub fn mark_deleted(&self) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = GatewayState::Deleted;
    }

    /// Admit one push batch. All-or-nothing: any drift violation or
    /// admission failure rejects the whole batch before state changes.
    #[instrument(skip(self, request), fields(gateway_id = %self.id, client_id = %request.client_id, deltas = request.deltas.len()))]
    pub async fn handle_push(&self, request: PushRequest) -> SyncResult<PushResponse> {
        match self.state() {
            GatewayState::Active => {}
            GatewayState::Suspended => {
                return Err(GatewayError::QuotaExceeded {
                    reason: format!("gateway {} is suspended", self.id),
                    retry_after_ms: Some(self.config.flush_backoff_max_ms),
                }
                .into())
            }
            GatewayState::Deleted => {
                return Err(GatewayError::Deleted {
                    gateway_id: self.id.clone(),
                }
                .into())
            }
        }

        let now_ms = self.wall.now_ms();

        // Deadline is checked before any state mutates.
        if let Some(deadline_ms) = request.deadline_ms {
            if now_ms > deadline_ms {
                return Err(GatewayError::DeadlineExceeded.into());
            }
        }

        if let Some(quota) = &self.quota {
            let bytes: u64 = request.deltas.iter().map(|d| d.byte_estimate()).sum();
            if let QuotaDecision::Denied {
                reason,
                retry_after_ms,
            } = quota
                .check_push(&request.client_id, request.deltas.len(), bytes)
                .await
            {
                return Err(GatewayError::QuotaExceeded {
                    reason,
                    retry_after_ms,
                }
                .into());
            }
        }

        if self.buffer.is_full() {
            let stats = self.buffer.stats();
            warn!(byte_estimate = stats.byte_estimate, "push rejected, buffer full");
            return Err(GatewayError::BufferFull {
                byte_estimate: stats.byte_estimate,
                max_bytes: self.config.max_buffer_bytes,
                retry_after_ms: self.config.flush_backoff_base_ms,
            }
            .into());
        }

        // Drift validation for the whole batch, before the first append:
        // a rejected batch must leave the HLC and buffer untouched.
        for delta in &request.deltas {
            let drift_ms = delta.hlc.wall_distance_ms(now_ms);
            if drift_ms > self.config.max_drift_ms {
                warn!(delta_id = %delta.delta_id, drift_ms, "push rejected, clock drift");
                return Err(GatewayError::ClockDrift {
                    drift_ms,
                    max_ms: self.config.max_drift_ms,
                }
                .into());
            }
        }

        let accepted = request.deltas.len() as u32;
        for delta in request.deltas {
            // Observes the delta's HLC and merges; duplicates acknowledge.
            self.buffer.append(delta)?;
        }

        let pressure = self.buffer.pressure();
        let response = PushResponse {
            server_hlc: self.clock.now()?,
            accepted,
            buffer_pressure: (pressure >= self.config.pressure_threshold).then_some(pressure),
        };
        debug!(accepted, pressure, "push accepted");
        Ok(response)
    }

    /// Serve one pull page. Filtering never moves the cursor: it tracks log
    /// position, not filtered position.
    #[instrument(skip(self, request), fields(gateway_id = %self.id, client_id = %request.client_id))]
    pub fn handle_pull(&self, request: PullRequest) -> SyncResult<PullResponse> {
        if self.state() == GatewayState::Deleted {
            return Err(GatewayError::Deleted {
                gateway_id: self.id.clone(),
            }
            .into());
        }

        let page = self
            .buffer
            .get_events_since(request.since_hlc, request.max_deltas);
        let deltas: Vec<_> = page.entries.into_iter().map(|e| e.delta).collect();

        let deltas = match (&self.rules, &request.claims) {
            (Some(rules), Some(claims)) => lakesync_rules::filter_deltas(rules, deltas, claims),
            _ => deltas,
        };

        Ok(PullResponse {
            deltas,
            next_cursor: page.next_cursor,
            has_more: page.has_more,
        })
    }

    /// The merged projection of one row as currently buffered.
    pub fn latest_state(&self, table: &str, row_id: &str) -> Option<BTreeMap<String, Scalar>> {
        self.buffer.latest_state(table, row_id)
    }

    /// Explicit flush to the configured target.
    pub async fn flush(&self) -> SyncResult<FlushReport> {
        let Some(pipeline) = &self.flush else {
            return Ok(FlushReport::default());
        };
        match pipeline.flush(&self.buffer).await {
            Ok(report) => {
                self.degraded.store(false, Ordering::SeqCst);
                self.buffer.prune_index(self.config.max_index_entries);
                Ok(report)
            }
            Err(error) => {
                self.degraded.store(true, Ordering::SeqCst);
                Err(error)
            }
        }
    }

    /// Flush only if a size or age trigger fires.
    pub async fn maybe_flush(&self) -> SyncResult<Option<FlushReport>> {
        if self.flush.is_some() && self.buffer.needs_flush(self.wall.now_ms()) {
            self.flush().await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Shutdown: a final flush attempt, then the terminal state.
    pub async fn shutdown(&self) -> SyncResult<FlushReport> {
        let report = match self.flush().await {
            Ok(report) => report,
            Err(error) => {
                warn!(%error, "final flush failed during shutdown");
                FlushReport::default()
            }
        };
        self.mark_deleted();
        Ok(report)
    }
}
