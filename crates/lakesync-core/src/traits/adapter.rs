//! Backing-store adapter contracts consumed by the flush pipeline.
//!
//! Adapters must tolerate duplicate deltas: delivery is at-least-once, and
//! the same `delta_id` always carries the same content.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::errors::SyncResult;
use crate::models::delta::{RowDelta, Scalar};
use crate::models::hlc::HlcTimestamp;
use crate::models::schema::TableSchema;

/// A row-oriented backing store (SQL engine, warehouse).
///
/// Inserts are idempotent keyed by `delta_id`.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    async fn ensure_schema(&self, schema: &TableSchema) -> SyncResult<()>;

    async fn insert_deltas(&self, deltas: &[RowDelta]) -> SyncResult<()>;

    async fn query_deltas_since(
        &self,
        hlc: HlcTimestamp,
        tables: Option<&[String]>,
    ) -> SyncResult<Vec<RowDelta>>;

    async fn get_latest_state(
        &self,
        table: &str,
        row_id: &str,
    ) -> SyncResult<Option<BTreeMap<String, Scalar>>>;
}

/// An object-store backing (lake table formats, plain blobs).
#[async_trait]
pub trait LakeAdapter: Send + Sync {
    async fn put_object(&self, key: &str, bytes: &[u8]) -> SyncResult<()>;

    async fn get_object(&self, key: &str) -> SyncResult<Vec<u8>>;

    async fn list_objects(&self, prefix: &str) -> SyncResult<Vec<String>>;

    async fn delete_object(&self, key: &str) -> SyncResult<()>;
}
