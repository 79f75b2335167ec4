//! Read-only integrity check over a live chain.

use std::sync::Arc;

use starchain_core::{validate_chain, Violation};
use starchain_store::BlockArchive;

use crate::chain::ChainStore;

/// Walks a chain and reports every hash or linkage violation.
///
/// Validation runs on a snapshot taken under the read lock, so appends
/// proceed while a walk is in progress.
#[derive(Debug)]
pub struct ChainValidator<A: BlockArchive> {
    chain: Arc<ChainStore<A>>,
}

impl<A: BlockArchive> ChainValidator<A> {
    pub fn new(chain: Arc<ChainStore<A>>) -> Self {
        Self { chain }
    }

    /// Validate the chain. An empty result means it is intact.
    pub async fn run(&self) -> Vec<Violation> {
        let blocks = self.chain.snapshot().await;
        let violations = validate_chain(&blocks);

        for violation in &violations {
            tracing::warn!(height = violation.height(), "{}", violation);
        }
        if violations.is_empty() {
            tracing::debug!(blocks = blocks.len(), "chain validated");
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use serde_json::json;
    use starchain_core::{encode_block, BlockHash, HexJsonCodec, ManualClock, PayloadCodec};
    use starchain_store::MemoryArchive;

    async fn lenient(archive: Arc<MemoryArchive>) -> Arc<ChainStore<MemoryArchive>> {
        let config = ChainConfig {
            validate_on_load: false,
            ..ChainConfig::default()
        };
        let chain = ChainStore::open(
            archive,
            Arc::new(HexJsonCodec),
            Arc::new(ManualClock::new(1_700_000_000)),
            config,
        )
        .await
        .unwrap();
        Arc::new(chain)
    }

    #[tokio::test]
    async fn test_fresh_chain_is_valid() {
        let chain = Arc::new(ChainStore::in_memory().await.unwrap());
        chain.append(&json!({"user": "a"})).await.unwrap();
        chain.append(&json!({"user": "b"})).await.unwrap();

        assert!(ChainValidator::new(chain).run().await.is_empty());
    }

    #[tokio::test]
    async fn test_reports_tampered_and_relinked_blocks() {
        let archive = Arc::new(MemoryArchive::new());
        let chain = lenient(archive.clone()).await;
        let mut b1 = chain.append(&json!({"user": "a"})).await.unwrap();
        chain.append(&json!({"user": "b"})).await.unwrap();
        let b3 = chain.append(&json!({"user": "c"})).await.unwrap();
        drop(chain);

        // Block 1 keeps its old hash over a new payload
        b1.payload = HexJsonCodec.encode(&json!({"user": "mallory"})).unwrap();
        archive.overwrite_raw(1, encode_block(&b1));

        // Block 3 is resealed against a foreign predecessor
        let timestamp = b3.timestamp;
        let b3 = b3.link(3, timestamp, Some(BlockHash::ZERO));
        archive.overwrite_raw(3, encode_block(&b3));

        let violations = ChainValidator::new(lenient(archive).await).run().await;
        assert_eq!(
            violations,
            vec![
                Violation::InvalidHash { height: 1 },
                Violation::BrokenLink { height: 3 },
            ]
        );
    }
}
