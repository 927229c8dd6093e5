//! The flush pipeline: buffer → adapter with at-least-once semantics.
//!
//! `drain` is synchronous and atomic; adapter I/O is the only yielding
//! step, so the buffer's writer never holds its lock across the network.
//! A failed write restores the batch to the log head (arrival order
//! preserved) and retries with exponential backoff; exhaustion marks the
//! pipeline degraded while the gateway keeps accepting pushes until the
//! buffer fills.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use lakesync_buffer::{BufferEntry, DeltaBuffer};
use lakesync_client::Backoff;
use lakesync_codec::wire;
use lakesync_core::config::GatewayConfig;
use lakesync_core::errors::{AdapterError, SyncResult};
use lakesync_core::models::delta::RowDelta;
use lakesync_core::models::protocol::FlushReport;
use lakesync_core::traits::adapter::{DatabaseAdapter, LakeAdapter};

/// Where flushed deltas land.
pub enum FlushTarget {
    Database(Arc<dyn DatabaseAdapter>),
    Lake(Arc<dyn LakeAdapter>),
}

/// Drives batches from one buffer into one adapter.
pub struct FlushPipeline {
    gateway_id: String,
    config: GatewayConfig,
    target: FlushTarget,
}

impl FlushPipeline {
    pub fn new(gateway_id: String, config: GatewayConfig, target: FlushTarget) -> Self {
        FlushPipeline {
            gateway_id,
            config,
            target,
        }
    }

    /// Drain and deliver the buffered log. On adapter failure the batch is
    /// restored and the drain retried, so deltas appended during a retry
    /// window ride along in the next attempt.
    #[instrument(skip(self, buffer), fields(gateway_id = %self.gateway_id))]
    pub async fn flush(&self, buffer: &DeltaBuffer) -> SyncResult<FlushReport> {
        let mut backoff = Backoff::new(
            self.config.flush_backoff_base_ms,
            self.config.flush_backoff_max_ms,
        );
        let mut attempts = 0u32;

        loop {
            let batch = buffer.drain();
            if batch.is_empty() {
                return Ok(FlushReport::default());
            }
            let deltas: Vec<RowDelta> = batch.iter().map(|e| e.delta.clone()).collect();
            let bytes: u64 = deltas.iter().map(|d| d.byte_estimate()).sum();

            match self.write(&batch, &deltas).await {
                Ok(()) => {
                    debug!(deltas = deltas.len(), bytes, "flush committed");
                    return Ok(FlushReport {
                        batches_flushed: 1,
                        bytes_flushed: bytes,
                    });
                }
                Err(error) => {
                    warn!(%error, attempts, "adapter write failed, restoring batch");
                    buffer.restore_front(batch);
                    attempts += 1;
                    if attempts >= self.config.max_flush_retries {
                        return Err(AdapterError::FlushExhausted {
                            attempts,
                            last_error: error.to_string(),
                        }
                        .into());
                    }
                    tokio::time::sleep(backoff.next_delay()).await;
                }
            }
        }
    }

    async fn write(&self, batch: &[BufferEntry], deltas: &[RowDelta]) -> SyncResult<()> {
        match &self.target {
            FlushTarget::Database(adapter) => adapter.insert_deltas(deltas).await,
            FlushTarget::Lake(adapter) => {
                let first_arrival = batch
                    .first()
                    .map(|e| e.arrived_at_hlc.as_u64())
                    .unwrap_or_default();
                let key = format!("deltas/{}/{}.bin", self.gateway_id, first_arrival);
                adapter.put_object(&key, &wire::encode_batch(deltas)).await
            }
        }
    }
}
