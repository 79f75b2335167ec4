//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use serde_json::Value;
use starchain::{RegistryConfig, RegistryError, StarRegistry};
use starchain_core::{Block, HexJsonCodec, ManualClock, SignatureVerifier};
use starchain_store::MemoryArchive;

/// Verifier that accepts exactly the signatures produced by [`StubVerifier::sign`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StubVerifier;

impl StubVerifier {
    /// Sign `message` on behalf of `address`.
    pub fn sign(message: &str, address: &str) -> String {
        format!("signed-by:{}:{}", address, message)
    }
}

impl SignatureVerifier for StubVerifier {
    fn verify(&self, message: &str, address: &str, signature: &str) -> bool {
        signature == Self::sign(message, address)
    }
}

/// A registry over an in-memory archive with a manual clock.
pub struct TestFixture {
    pub clock: Arc<ManualClock>,
    pub archive: Arc<MemoryArchive>,
    pub registry: StarRegistry<MemoryArchive, StubVerifier>,
}

impl TestFixture {
    /// Clock reading when the fixture is created.
    pub const START: i64 = 1_700_000_000;

    /// Create a fixture with default configuration.
    pub async fn new() -> Self {
        Self::with_config(RegistryConfig::default()).await
    }

    /// Create a fixture with the given configuration.
    pub async fn with_config(config: RegistryConfig) -> Self {
        let clock = Arc::new(ManualClock::new(Self::START));
        let archive = Arc::new(MemoryArchive::new());
        let registry = StarRegistry::open(
            Arc::clone(&archive),
            Arc::new(HexJsonCodec),
            StubVerifier,
            clock.clone(),
            config,
        )
        .await
        .expect("in-memory registry opens");

        Self {
            clock,
            archive,
            registry,
        }
    }

    /// Run the full handshake for `address` and submit `star`.
    pub async fn submit(&self, address: &str, star: Value) -> Result<Block, RegistryError> {
        let message = self.registry.request_ownership(address);
        let signature = StubVerifier::sign(&message, address);
        self.registry
            .submit_star(address, &message, &signature, star)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stub_verifier() {
        let sig = StubVerifier::sign("msg", "alice");
        assert!(StubVerifier.verify("msg", "alice", &sig));
        assert!(!StubVerifier.verify("msg", "bob", &sig));
        assert!(!StubVerifier.verify("other", "alice", &sig));
    }

    #[tokio::test]
    async fn test_fixture_submits() {
        let fixture = TestFixture::new().await;

        let b1 = fixture.submit("alice", json!({"story": "one"})).await.unwrap();
        let b2 = fixture.submit("bob", json!({"story": "two"})).await.unwrap();

        assert_eq!(b1.height, 1);
        assert_eq!(b2.previous_hash, b1.hash);
        assert_eq!(fixture.registry.stars_by_owner("alice").await.unwrap().len(), 1);
    }
}
