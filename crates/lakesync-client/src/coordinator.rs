//! The sync coordinator.
//!
//! Single-threaded with respect to its own outbox and local store: tracked
//! mutations update the store and enqueue in one logical step; the push
//! cycle drains the outbox in pages; the pull cycle advances the cursor and
//! merges remote deltas locally. Re-applying anything is a no-op, so
//! crash-retry at any point converges.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use lakesync_clock::HlcClock;
use lakesync_codec::seal;
use lakesync_core::config::ClientConfig;
use lakesync_core::errors::{ClientError, SyncResult};
use lakesync_core::models::delta::{ColumnValue, DeltaOp, RowDelta, Scalar};
use lakesync_core::models::hlc::HlcTimestamp;
use lakesync_core::models::protocol::{ClaimsContext, PullRequest, PushRequest};
use lakesync_core::models::schema::TableSchema;
use lakesync_outbox::Outbox;

use crate::backoff::Backoff;
use crate::store::LocalStore;
use crate::transport::Transport;

/// Outcome of one push cycle.
#[derive(Debug, Default)]
pub struct PushReport {
    /// Deltas acknowledged by the gateway.
    pub pushed: usize,
    /// Entries past the retry bound, surfaced by the outbox.
    pub exhausted: Vec<u64>,
    /// Last pressure hint seen, if the gateway is filling up.
    pub pressure_hint: Option<f64>,
}

/// Outcome of one pull cycle.
#[derive(Debug, Default)]
pub struct PullReport {
    pub applied: usize,
    pub skipped_columns: usize,
}

/// Combined outcome of a full sync pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub push: PushReport,
    pub pull: PullReport,
}

/// Client-side orchestrator for one gateway connection.
pub struct SyncCoordinator {
    client_id: String,
    clock: Arc<HlcClock>,
    outbox: Arc<dyn Outbox>,
    transport: Arc<dyn Transport>,
    store: Mutex<LocalStore>,
    config: ClientConfig,
    last_synced: Mutex<HlcTimestamp>,
    claims: Option<ClaimsContext>,
}

impl SyncCoordinator {
    pub fn new(
        client_id: impl Into<String>,
        clock: Arc<HlcClock>,
        outbox: Arc<dyn Outbox>,
        transport: Arc<dyn Transport>,
        config: ClientConfig,
    ) -> Self {
        SyncCoordinator {
            client_id: client_id.into(),
            clock,
            outbox,
            transport,
            store: Mutex::new(LocalStore::new()),
            config,
            last_synced: Mutex::new(HlcTimestamp::ZERO),
            claims: None,
        }
    }

    /// A fresh unique client identity.
    pub fn generated_client_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Claims sent with every pull, for rule-filtered gateways.
    pub fn with_claims(mut self, claims: ClaimsContext) -> Self {
        self.claims = Some(claims);
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn last_synced_hlc(&self) -> HlcTimestamp {
        *self.lock_cursor()
    }

    /// Declare a table schema for local type validation.
    pub fn register_schema(&self, schema: TableSchema) {
        self.lock_store().register_schema(schema);
    }

    /// Track a local INSERT: build the delta, apply it locally, enqueue it.
    pub fn insert(
        &self,
        table: &str,
        row_id: &str,
        columns: Vec<ColumnValue>,
    ) -> SyncResult<String> {
        self.track(DeltaOp::Insert, table, row_id, columns)
    }

    /// Track a local UPDATE of the given columns.
    pub fn update(
        &self,
        table: &str,
        row_id: &str,
        columns: Vec<ColumnValue>,
    ) -> SyncResult<String> {
        self.track(DeltaOp::Update, table, row_id, columns)
    }

    /// Track a local DELETE.
    pub fn delete(&self, table: &str, row_id: &str) -> SyncResult<String> {
        self.track(DeltaOp::Delete, table, row_id, Vec::new())
    }

    /// The merged local projection of one row.
    pub fn local_state(&self, table: &str, row_id: &str) -> Option<BTreeMap<String, Scalar>> {
        self.lock_store().get(table, row_id)
    }

    fn track(
        &self,
        op: DeltaOp,
        table: &str,
        row_id: &str,
        columns: Vec<ColumnValue>,
    ) -> SyncResult<String> {
        let delta = seal(RowDelta {
            op,
            table: table.into(),
            row_id: row_id.into(),
            client_id: self.client_id.clone(),
            hlc: self.clock.now()?,
            columns,
            delta_id: String::new(),
        });

        {
            let mut store = self.lock_store();
            // The application's own writes must fit its declared schema.
            if let Some(violation) = store.schema_violations(&delta).into_iter().next() {
                return Err(ClientError::SchemaMismatch {
                    table: violation.table,
                    column: violation.column,
                    expected: violation.expected,
                    got: violation.got,
                }
                .into());
            }
            store.apply_local(&delta);
        }

        let delta_id = delta.delta_id.clone();
        self.outbox.push(delta)?;
        debug!(delta_id = %delta_id, table, row_id, "tracked local mutation");
        Ok(delta_id)
    }

    /// Drain the outbox in pages until empty; transient transport failures
    /// nack and back off, giving up after the configured bound.
    #[instrument(skip(self), fields(client_id = %self.client_id))]
    pub async fn push_cycle(&self) -> SyncResult<PushReport> {
        let mut report = PushReport::default();
        let mut backoff = Backoff::new(self.config.backoff_base_ms, self.config.backoff_max_ms);
        let mut consecutive_failures = 0u32;

        loop {
            let entries = self.outbox.peek(self.config.page_size as usize)?;
            if entries.is_empty() {
                break;
            }
            let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
            let deltas: Vec<RowDelta> = entries.into_iter().map(|e| e.delta).collect();
            self.outbox.mark_sending(&ids)?;

            let request = PushRequest {
                client_id: self.client_id.clone(),
                deltas,
                last_seen_hlc: self.clock.last_seen(),
                deadline_ms: None,
            };

            match self.transport.push(request).await {
                Ok(response) => {
                    self.outbox.ack(&ids)?;
                    self.clock.observe(response.server_hlc)?;
                    report.pushed += response.accepted as usize;
                    if let Some(pressure) = response.buffer_pressure {
                        warn!(pressure, "gateway buffer pressure hint");
                        report.pressure_hint = Some(pressure);
                    }
                    consecutive_failures = 0;
                    backoff.reset();
                }
                Err(error) => {
                    let exceeded = self.outbox.nack(&ids)?;
                    report.exhausted.extend(exceeded.into_iter().map(|e| e.id));
                    consecutive_failures += 1;
                    warn!(%error, consecutive_failures, "push failed, backing off");
                    if consecutive_failures > self.config.max_retries {
                        return Err(ClientError::RetriesExhausted {
                            attempts: consecutive_failures,
                        }
                        .into());
                    }
                    tokio::time::sleep(backoff.next_delay()).await;
                }
            }
        }
        Ok(report)
    }

    /// Pull pages after the cursor until the gateway reports no more,
    /// merging each delta locally and advancing the cursor.
    #[instrument(skip(self), fields(client_id = %self.client_id))]
    pub async fn pull_cycle(&self) -> SyncResult<PullReport> {
        let mut report = PullReport::default();

        loop {
            let request = PullRequest {
                client_id: self.client_id.clone(),
                since_hlc: self.last_synced_hlc(),
                max_deltas: self.config.page_size,
                claims: self.claims.clone(),
            };
            let response = self.transport.pull(request).await?;

            for delta in &response.deltas {
                self.clock.observe(delta.hlc)?;
                let outcome = self.lock_store().apply_remote(delta);
                report.applied += 1;
                report.skipped_columns += outcome.skipped.len();
            }
            *self.lock_cursor() = response.next_cursor;

            if !response.has_more {
                break;
            }
        }
        Ok(report)
    }

    /// One full pass: local changes out, remote changes in.
    pub async fn sync(&self) -> SyncResult<SyncReport> {
        let push = self.push_cycle().await?;
        let pull = self.pull_cycle().await?;
        Ok(SyncReport { push, pull })
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, LocalStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_cursor(&self) -> std::sync::MutexGuard<'_, HlcTimestamp> {
        self.last_synced.lock().unwrap_or_else(|e| e.into_inner())
    }
}
