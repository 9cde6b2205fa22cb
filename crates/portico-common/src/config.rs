//! Configuration types for Portico
//!
//! This module defines configuration structures for the gateway.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration for the gateway
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Network configuration
    pub network: NetworkConfig,
    /// Backing store configuration
    pub store: StoreConfig,
    /// Request limits
    pub limits: LimitsConfig,
}

/// Network configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Address for the proxy HTTP API
    pub listen: SocketAddr,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8180".parse().unwrap(),
        }
    }
}

/// Backing object store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store endpoint URL; its host is also used in PUT locator responses
    pub endpoint: String,
    /// Region name used when signing outbound requests
    pub region: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://s3.amazonaws.com".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

/// Request limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum declared PUT size (default: 5 GB, the single-part ceiling)
    pub max_object_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_object_size: 5 * 1024 * 1024 * 1024, // 5 GB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.network.listen.port(), 8180);
        assert_eq!(config.store.endpoint, "https://s3.amazonaws.com");
        assert_eq!(config.store.region, "us-east-1");
        assert_eq!(config.limits.max_object_size, 5 * 1024 * 1024 * 1024);
    }
}
