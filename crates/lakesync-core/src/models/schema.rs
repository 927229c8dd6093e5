//! Client-side table schemas.
//!
//! The gateway never enforces schemas; clients use them to validate local
//! applies and to skip incompatible columns with a diagnostic.

use serde::{Deserialize, Serialize};

use super::delta::Scalar;

/// Declared column type in a [`TableSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Json,
    Null,
    Integer,
}

impl ColumnType {
    /// Whether a scalar value is type-compatible with this column.
    ///
    /// `Scalar::Null` is accepted by every column type; a `null`-typed
    /// column accepts nothing else.
    pub fn accepts(self, value: &Scalar) -> bool {
        match (self, value) {
            (_, Scalar::Null) => true,
            (ColumnType::String, Scalar::Text(_)) => true,
            (ColumnType::Number, Scalar::I64(_) | Scalar::F64(_)) => true,
            (ColumnType::Integer, Scalar::I64(_)) => true,
            (ColumnType::Boolean, Scalar::Bool(_)) => true,
            (ColumnType::Json, Scalar::Json(_)) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
            ColumnType::Json => "json",
            ColumnType::Null => "null",
            ColumnType::Integer => "integer",
        }
    }
}

/// A single column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Declared shape of one synced table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        TableSchema {
            table: table.into(),
            columns,
        }
    }

    /// Declared type of a column, if the schema knows it.
    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.column_type)
    }

    /// Whether a value may be written to the named column. Columns the
    /// schema does not declare are passed through untyped.
    pub fn accepts(&self, column: &str, value: &Scalar) -> bool {
        match self.column_type(column) {
            Some(ty) => ty.accepts(value),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todos() -> TableSchema {
        TableSchema::new(
            "todos",
            vec![
                ColumnDef {
                    name: "title".into(),
                    column_type: ColumnType::String,
                },
                ColumnDef {
                    name: "completed".into(),
                    column_type: ColumnType::Boolean,
                },
                ColumnDef {
                    name: "position".into(),
                    column_type: ColumnType::Integer,
                },
            ],
        )
    }

    #[test]
    fn typed_columns_reject_mismatches() {
        let schema = todos();
        assert!(schema.accepts("title", &Scalar::Text("x".into())));
        assert!(!schema.accepts("title", &Scalar::I64(1)));
        assert!(schema.accepts("position", &Scalar::I64(1)));
        assert!(!schema.accepts("position", &Scalar::F64(1.5)));
    }

    #[test]
    fn null_passes_any_typed_column() {
        let schema = todos();
        assert!(schema.accepts("title", &Scalar::Null));
        assert!(schema.accepts("completed", &Scalar::Null));
    }

    #[test]
    fn undeclared_columns_pass_untyped() {
        let schema = todos();
        assert!(schema.accepts("notes", &Scalar::Json(serde_json::json!([1]))));
    }
}
