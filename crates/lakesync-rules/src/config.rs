//! Sync-rules document model.
//!
//! A document is `{version, buckets[]}`; each bucket names the tables it
//! covers and an ordered filter list. Filter right-hand sides are either
//! JSON literals or claim references written `jwt:<claimName>`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use lakesync_core::errors::{RulesError, SyncResult};

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    In,
    Gt,
    Lt,
    Gte,
    Lte,
}

/// Right-hand side of a filter: a literal, or a claim resolved at pull time.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Literal(serde_json::Value),
    /// `jwt:<name>`, resolved against the caller's claims context.
    Claim(String),
}

const CLAIM_PREFIX: &str = "jwt:";

impl Serialize for FilterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterValue::Literal(v) => v.serialize(serializer),
            FilterValue::Claim(name) => format!("{CLAIM_PREFIX}{name}").serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FilterValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if let serde_json::Value::String(s) = &value {
            if let Some(name) = s.strip_prefix(CLAIM_PREFIX) {
                if name.is_empty() {
                    return Err(D::Error::custom("empty claim name in filter value"));
                }
                return Ok(FilterValue::Claim(name.to_string()));
            }
        }
        Ok(FilterValue::Literal(value))
    }
}

/// One column predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

/// A named group of filters over a set of tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub tables: Vec<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl Bucket {
    pub fn covers_table(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t == table)
    }
}

/// A versioned rules document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRules {
    pub version: u32,
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

impl SyncRules {
    /// Parse a JSON rules document.
    pub fn from_json_str(input: &str) -> SyncResult<Self> {
        serde_json::from_str(input).map_err(|e| {
            RulesError::Parse {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Parse a TOML rules document.
    pub fn from_toml_str(input: &str) -> SyncResult<Self> {
        toml::from_str(input).map_err(|e| {
            RulesError::Parse {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Whether any bucket is configured. With none, every delta passes.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_references_parse_from_prefix() {
        let rules = SyncRules::from_json_str(
            r#"{
                "version": 1,
                "buckets": [{
                    "name": "user-todos",
                    "tables": ["todos"],
                    "filters": [
                        {"column": "user_id", "op": "eq", "value": "jwt:sub"},
                        {"column": "archived", "op": "eq", "value": false}
                    ]
                }]
            }"#,
        )
        .unwrap();

        let filters = &rules.buckets[0].filters;
        assert_eq!(filters[0].value, FilterValue::Claim("sub".into()));
        assert_eq!(
            filters[1].value,
            FilterValue::Literal(serde_json::Value::Bool(false))
        );
    }

    #[test]
    fn toml_documents_parse_too() {
        let rules = SyncRules::from_toml_str(
            r#"
            version = 1

            [[buckets]]
            name = "team"
            tables = ["docs", "notes"]

            [[buckets.filters]]
            column = "team_id"
            op = "in"
            value = "jwt:teams"
            "#,
        )
        .unwrap();
        assert_eq!(rules.buckets.len(), 1);
        assert!(rules.buckets[0].covers_table("notes"));
        assert_eq!(rules.buckets[0].filters[0].op, FilterOp::In);
    }

    #[test]
    fn empty_claim_name_is_rejected() {
        let err = SyncRules::from_json_str(
            r#"{"version":1,"buckets":[{"name":"b","tables":["t"],
                "filters":[{"column":"c","op":"eq","value":"jwt:"}]}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), lakesync_core::errors::ErrorCode::InvalidRule);
    }

    #[test]
    fn round_trips_through_serde() {
        let rules = SyncRules {
            version: 2,
            buckets: vec![Bucket {
                name: "b".into(),
                tables: vec!["t".into()],
                filters: vec![Filter {
                    column: "c".into(),
                    op: FilterOp::Gte,
                    value: FilterValue::Claim("level".into()),
                }],
            }],
        };
        let json = serde_json::to_string(&rules).unwrap();
        assert_eq!(SyncRules::from_json_str(&json).unwrap(), rules);
    }
}
