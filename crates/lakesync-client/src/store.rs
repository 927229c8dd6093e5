//! Local working set.
//!
//! The client's view of synced rows: the same per-column LWW merge the
//! gateway runs, plus schema validation. An incoming column that fails its
//! declared type is skipped with a diagnostic; the rest of the delta still
//! applies.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use lakesync_buffer::RowIndex;
use lakesync_core::models::delta::{RowDelta, Scalar};
use lakesync_core::models::schema::TableSchema;

/// One skipped column from a remote apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyDiagnostic {
    pub table: String,
    pub column: String,
    pub expected: String,
    pub got: String,
}

/// Result of applying one remote delta locally.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    pub applied_columns: usize,
    pub skipped: Vec<ApplyDiagnostic>,
}

/// Column-versioned local row store.
#[derive(Default)]
pub struct LocalStore {
    index: RowIndex,
    schemas: HashMap<String, TableSchema>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table's shape for type validation.
    pub fn register_schema(&mut self, schema: TableSchema) {
        self.schemas.insert(schema.table.clone(), schema);
    }

    /// Columns of a delta that violate the declared schema.
    pub fn schema_violations(&self, delta: &RowDelta) -> Vec<ApplyDiagnostic> {
        let Some(schema) = self.schemas.get(&delta.table) else {
            return Vec::new();
        };
        delta
            .columns
            .iter()
            .filter(|col| !schema.accepts(&col.column, &col.value))
            .map(|col| ApplyDiagnostic {
                table: delta.table.clone(),
                column: col.column.clone(),
                expected: schema
                    .column_type(&col.column)
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_default(),
                got: col.value.kind().to_string(),
            })
            .collect()
    }

    /// Apply a locally-issued delta. Local mutations were validated when
    /// tracked, so this is a plain merge.
    pub fn apply_local(&mut self, delta: &RowDelta) {
        self.index.apply(delta);
    }

    /// Apply a remote delta under LWW, skipping schema-incompatible columns.
    pub fn apply_remote(&mut self, delta: &RowDelta) -> ApplyOutcome {
        let skipped = self.schema_violations(delta);
        for diagnostic in &skipped {
            warn!(
                table = %diagnostic.table,
                column = %diagnostic.column,
                expected = %diagnostic.expected,
                got = %diagnostic.got,
                "schema mismatch, skipping column"
            );
        }

        if skipped.is_empty() {
            self.index.apply(delta);
            return ApplyOutcome {
                applied_columns: delta.columns.len(),
                skipped,
            };
        }

        let mut filtered = delta.clone();
        filtered
            .columns
            .retain(|col| !skipped.iter().any(|d| d.column == col.column));
        let applied_columns = filtered.columns.len();
        self.index.apply(&filtered);
        ApplyOutcome {
            applied_columns,
            skipped,
        }
    }

    /// The merged local projection of one row.
    pub fn get(&self, table: &str, row_id: &str) -> Option<BTreeMap<String, Scalar>> {
        self.index.latest_state(table, row_id)
    }
}
