//! The star registry: ownership-gated admission onto the chain.
//!
//! A caller asks for a challenge, signs it out of band, and submits the
//! signature together with a star. The registry verifies the challenge, then
//! appends `{"user": address, "star": star}` as a new block.

use std::sync::Arc;

use serde_json::{json, Value};

use starchain_core::{Block, Clock, OwnershipChallenge, PayloadCodec, SignatureVerifier, Violation};
use starchain_store::BlockArchive;

use crate::chain::ChainStore;
use crate::config::{ChallengeConfig, RegistryConfig};
use crate::error::{RegistryError, Result};
use crate::validator::ChainValidator;

/// Composes the ownership challenge with the chain.
#[derive(Debug)]
pub struct StarRegistry<A: BlockArchive, V: SignatureVerifier> {
    chain: Arc<ChainStore<A>>,
    challenge: OwnershipChallenge<V>,
}

impl<A: BlockArchive, V: SignatureVerifier> StarRegistry<A, V> {
    /// Wrap an existing chain.
    pub fn new(
        chain: Arc<ChainStore<A>>,
        verifier: V,
        clock: Arc<dyn Clock>,
        config: ChallengeConfig,
    ) -> Self {
        Self {
            chain,
            challenge: OwnershipChallenge::new(verifier, clock, config),
        }
    }

    /// Open a chain over `archive` and build a registry on it.
    ///
    /// The chain and the challenge share `clock`.
    pub async fn open(
        archive: Arc<A>,
        codec: Arc<dyn PayloadCodec>,
        verifier: V,
        clock: Arc<dyn Clock>,
        config: RegistryConfig,
    ) -> Result<Self> {
        let chain = ChainStore::open(archive, codec, Arc::clone(&clock), config.chain).await?;
        Ok(Self::new(Arc::new(chain), verifier, clock, config.challenge))
    }

    /// The underlying chain.
    pub fn chain(&self) -> &Arc<ChainStore<A>> {
        &self.chain
    }

    /// Issue the challenge `address` must sign.
    pub fn request_ownership(&self, address: &str) -> String {
        self.challenge.issue(address)
    }

    /// Verify a signed challenge and append the star.
    ///
    /// Verification completes before the chain's write lock is taken.
    pub async fn submit_star(
        &self,
        address: &str,
        message: &str,
        signature: &str,
        star: Value,
    ) -> std::result::Result<Block, RegistryError> {
        let challenge = match self.challenge.verify(address, message, signature) {
            Ok(challenge) => challenge,
            Err(e) => {
                tracing::warn!(address, error = %e, "rejected star submission");
                return Err(e.into());
            }
        };

        let block = self
            .chain
            .append(&json!({ "user": address, "star": star }))
            .await?;

        tracing::debug!(
            address,
            height = block.height,
            issued_at = challenge.issued_at,
            "registered star"
        );
        Ok(block)
    }

    /// Every `{user, star}` payload submitted by `address`, in chain order.
    pub async fn stars_by_owner(&self, address: &str) -> Result<Vec<Value>> {
        self.chain.blocks_by_owner(address).await
    }

    /// Run the chain validator.
    pub async fn validate_chain(&self) -> Vec<Violation> {
        ChainValidator::new(Arc::clone(&self.chain)).run().await
    }
}
