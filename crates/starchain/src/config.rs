//! Configuration for the chain and the registry.

use serde_json::{json, Value};

pub use starchain_core::ChallengeConfig;

/// Configuration for a [`ChainStore`](crate::ChainStore).
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Payload of the block created when the archive is empty.
    pub genesis_payload: Value,
    /// Whether to validate archived blocks before accepting them on load.
    pub validate_on_load: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            genesis_payload: json!({ "data": "Genesis Block" }),
            validate_on_load: true,
        }
    }
}

/// Configuration for a [`StarRegistry`](crate::StarRegistry).
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Chain configuration.
    pub chain: ChainConfig,
    /// Challenge window and tag.
    pub challenge: ChallengeConfig,
}
