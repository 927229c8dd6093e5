//! SQLite-backed durable outbox.
//!
//! One table, one writer. Crash recovery flips interrupted `sending`
//! entries back to `pending` on open, with retry counts preserved, so a
//! restarted client re-sends everything the gateway never acknowledged.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use tracing::debug;

use lakesync_core::constants;
use lakesync_core::errors::{StorageError, SyncResult};
use lakesync_core::models::delta::RowDelta;

use crate::{Outbox, OutboxEntry, OutboxState};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS outbox (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    delta_id    TEXT NOT NULL,
    delta_json  TEXT NOT NULL,
    retry_count INTEGER NOT NULL DEFAULT 0,
    state       TEXT NOT NULL DEFAULT 'pending'
);
CREATE INDEX IF NOT EXISTS outbox_state_idx ON outbox(state, id);
";

/// Durable outbox backed by a local SQLite file.
pub struct SqliteOutbox {
    conn: Mutex<Connection>,
    max_retries: u32,
}

impl SqliteOutbox {
    /// Open (or create) the outbox database at `path` and recover any
    /// entries interrupted mid-send.
    pub fn open(path: &Path) -> SyncResult<Self> {
        let conn = Connection::open(path).map_err(to_storage)?;
        Self::bootstrap(conn, constants::MAX_RETRIES)
    }

    /// In-memory database, for tests.
    pub fn open_in_memory() -> SyncResult<Self> {
        let conn = Connection::open_in_memory().map_err(to_storage)?;
        Self::bootstrap(conn, constants::MAX_RETRIES)
    }

    /// Override the retry bound surfaced by `nack`.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn bootstrap(conn: Connection, max_retries: u32) -> SyncResult<Self> {
        conn.execute_batch(SCHEMA).map_err(to_storage)?;
        let recovered = conn
            .execute("UPDATE outbox SET state = 'pending' WHERE state = 'sending'", [])
            .map_err(to_storage)?;
        if recovered > 0 {
            debug!(recovered, "recovered in-flight outbox entries to pending");
        }
        Ok(SqliteOutbox {
            conn: Mutex::new(conn),
            max_retries,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn to_storage(e: rusqlite::Error) -> StorageError {
    StorageError::Storage {
        reason: e.to_string(),
    }
}

fn decode_row(
    id: u64,
    delta_json: String,
    retry_count: u32,
    state: String,
) -> Result<OutboxEntry, StorageError> {
    let delta: RowDelta = serde_json::from_str(&delta_json).map_err(|e| StorageError::Storage {
        reason: format!("outbox row {id} holds invalid delta json: {e}"),
    })?;
    let state = match state.as_str() {
        "sending" => OutboxState::Sending,
        _ => OutboxState::Pending,
    };
    Ok(OutboxEntry {
        id,
        delta,
        retry_count,
        state,
    })
}

impl Outbox for SqliteOutbox {
    fn push(&self, delta: RowDelta) -> SyncResult<u64> {
        let json = serde_json::to_string(&delta).map_err(|e| StorageError::Storage {
            reason: format!("failed to serialize delta: {e}"),
        })?;
        let conn = self.lock();
        conn.execute(
            "INSERT INTO outbox (delta_id, delta_json) VALUES (?1, ?2)",
            params![delta.delta_id, json],
        )
        .map_err(to_storage)?;
        Ok(conn.last_insert_rowid() as u64)
    }

    fn peek(&self, n: usize) -> SyncResult<Vec<OutboxEntry>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, delta_json, retry_count, state FROM outbox
                 WHERE state = 'pending' ORDER BY id LIMIT ?1",
            )
            .map_err(to_storage)?;
        let rows = stmt
            .query_map(params![n as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)? as u64,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)? as u32,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(to_storage)?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, json, retries, state) = row.map_err(to_storage)?;
            entries.push(decode_row(id, json, retries, state)?);
        }
        Ok(entries)
    }

    fn mark_sending(&self, ids: &[u64]) -> SyncResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(to_storage)?;
        for id in ids {
            tx.execute(
                "UPDATE outbox SET state = 'sending' WHERE id = ?1 AND state = 'pending'",
                params![*id as i64],
            )
            .map_err(to_storage)?;
        }
        tx.commit().map_err(to_storage)?;
        Ok(())
    }

    fn ack(&self, ids: &[u64]) -> SyncResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(to_storage)?;
        for id in ids {
            tx.execute("DELETE FROM outbox WHERE id = ?1", params![*id as i64])
                .map_err(to_storage)?;
        }
        tx.commit().map_err(to_storage)?;
        Ok(())
    }

    fn nack(&self, ids: &[u64]) -> SyncResult<Vec<OutboxEntry>> {
        let mut exceeded = Vec::new();
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(to_storage)?;
        for id in ids {
            tx.execute(
                "UPDATE outbox SET state = 'pending', retry_count = retry_count + 1
                 WHERE id = ?1 AND state = 'sending'",
                params![*id as i64],
            )
            .map_err(to_storage)?;
        }
        {
            let mut stmt = tx
                .prepare(
                    "SELECT id, delta_json, retry_count, state FROM outbox
                     WHERE retry_count > ?1 ORDER BY id",
                )
                .map_err(to_storage)?;
            let rows = stmt
                .query_map(params![self.max_retries as i64], |row| {
                    Ok((
                        row.get::<_, i64>(0)? as u64,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)? as u32,
                        row.get::<_, String>(3)?,
                    ))
                })
                .map_err(to_storage)?;
            for row in rows {
                let (id, json, retries, state) = row.map_err(to_storage)?;
                if ids.contains(&id) {
                    exceeded.push(decode_row(id, json, retries, state)?);
                }
            }
        }
        tx.commit().map_err(to_storage)?;
        Ok(exceeded)
    }

    fn depth(&self) -> SyncResult<usize> {
        let conn = self.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM outbox", [], |row| row.get(0))
            .map_err(to_storage)?;
        Ok(count as usize)
    }
}
