//! Workspace configuration.

mod client_config;
mod gateway_config;

pub use client_config::ClientConfig;
pub use gateway_config::GatewayConfig;

use serde::{Deserialize, Serialize};

use crate::errors::{RulesError, SyncResult};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub gateway: GatewayConfig,
    pub client: ClientConfig,
}

impl SyncConfig {
    /// Parse a TOML configuration document.
    pub fn from_toml_str(input: &str) -> SyncResult<Self> {
        toml::from_str(input).map_err(|e| {
            RulesError::Parse {
                reason: format!("config: {e}"),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_documented_limits() {
        let config = SyncConfig::default();
        assert_eq!(config.gateway.max_drift_ms, 5_000);
        assert_eq!(config.gateway.max_buffer_age_ms, 60_000);
        assert_eq!(config.gateway.max_flush_retries, 8);
        assert_eq!(config.client.page_size, 100);
        assert_eq!(config.client.max_retries, 5);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = SyncConfig::from_toml_str(
            r#"
            [gateway]
            max_drift_ms = 2500

            [client]
            page_size = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.max_drift_ms, 2_500);
        assert_eq!(config.gateway.max_flush_retries, 8);
        assert_eq!(config.client.page_size, 10);
        assert_eq!(config.client.max_retries, 5);
    }
}
