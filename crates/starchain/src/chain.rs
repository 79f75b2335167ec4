//! The chain store: ordered, hash-linked blocks with a single mutation point.
//!
//! Every block lives in memory behind a tokio `RwLock` and is written through
//! to a [`BlockArchive`] as it is appended. Reads clone what they return;
//! [`ChainStore::append`] holds the write guard from reading the tip until the
//! new block is pushed, so concurrent appends are serialized.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use starchain_core::{
    validate_chain, Block, BlockHash, Clock, DecodedPayload, HexJsonCodec, PayloadCodec,
    SystemClock,
};
use starchain_store::{BlockArchive, InsertResult, MemoryArchive};

use crate::config::ChainConfig;
use crate::error::{ChainError, Result};

/// Append-only chain of blocks backed by an archive.
pub struct ChainStore<A: BlockArchive> {
    blocks: RwLock<Vec<Block>>,
    archive: Arc<A>,
    codec: Arc<dyn PayloadCodec>,
    clock: Arc<dyn Clock>,
    config: ChainConfig,
}

impl<A: BlockArchive> ChainStore<A> {
    /// Open a chain over `archive` and initialize it.
    ///
    /// Reloads whatever the archive holds, or creates genesis when it is
    /// empty. A store is never observable before initialization.
    pub async fn open(
        archive: Arc<A>,
        codec: Arc<dyn PayloadCodec>,
        clock: Arc<dyn Clock>,
        config: ChainConfig,
    ) -> Result<Self> {
        let store = Self {
            blocks: RwLock::new(Vec::new()),
            archive,
            codec,
            clock,
            config,
        };
        store.initialize().await?;
        Ok(store)
    }

    /// Load the chain from the archive, creating genesis if there is none.
    ///
    /// Idempotent: a no-op once the chain holds blocks.
    pub async fn initialize(&self) -> Result<()> {
        let mut blocks = self.blocks.write().await;
        if !blocks.is_empty() {
            return Ok(());
        }

        let archived = self.archive.load_chain().await?;
        if !archived.is_empty() {
            if self.config.validate_on_load {
                let violations = validate_chain(&archived);
                if !violations.is_empty() {
                    for violation in &violations {
                        tracing::warn!(height = violation.height(), "{}", violation);
                    }
                    return Err(ChainError::Corrupted { violations });
                }
            }
            tracing::info!(blocks = archived.len(), "reloaded chain from archive");
            *blocks = archived;
            return Ok(());
        }

        let genesis = Block::create(self.codec.as_ref(), &self.config.genesis_payload)?
            .link(0, self.clock.now_seconds(), None);
        self.persist(&genesis).await?;

        tracing::info!(hash = ?genesis.hash, "created genesis block");
        blocks.push(genesis);
        Ok(())
    }

    /// Append a payload as a new block and return the linked block.
    ///
    /// On any failure the in-memory chain is left untouched. If the archive
    /// already holds a block that extends the current tip (an append whose
    /// caller went away after the archive write), that block is adopted and
    /// the payload goes on top of it.
    pub async fn append(&self, payload: &Value) -> Result<Block> {
        let unlinked = Block::create(self.codec.as_ref(), payload)?;

        let mut blocks = self.blocks.write().await;
        let timestamp = self.clock.now_seconds();

        loop {
            let height = blocks.len() as u64;
            let previous_hash = blocks.last().and_then(|tip| tip.hash);
            let block = unlinked.clone().link(height, timestamp, previous_hash);

            match self.archive.put_block(&block).await? {
                InsertResult::Inserted | InsertResult::AlreadyExists => {
                    tracing::debug!(height, hash = ?block.hash, "appended block");
                    blocks.push(block.clone());
                    return Ok(block);
                }
                InsertResult::Conflict { existing } => {
                    match self.orphan_extending(height, previous_hash).await? {
                        Some(orphan) => {
                            tracing::warn!(height, hash = ?orphan.hash, "adopted archived block");
                            blocks.push(orphan);
                        }
                        None => return Err(ChainError::Conflict { height, existing }),
                    }
                }
            }
        }
    }

    /// The archived block at `height`, if it is intact and links to
    /// `previous_hash`.
    async fn orphan_extending(
        &self,
        height: u64,
        previous_hash: Option<BlockHash>,
    ) -> Result<Option<Block>> {
        let archived = self.archive.get_block(height).await?;
        Ok(archived.filter(|block| {
            block.height == height
                && block.previous_hash == previous_hash
                && block.verify_self_hash()
        }))
    }

    async fn persist(&self, block: &Block) -> Result<()> {
        match self.archive.put_block(block).await? {
            InsertResult::Inserted | InsertResult::AlreadyExists => Ok(()),
            InsertResult::Conflict { existing } => Err(ChainError::Conflict {
                height: block.height,
                existing,
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// The most recently appended block.
    pub async fn tip(&self) -> Option<Block> {
        self.blocks.read().await.last().cloned()
    }

    /// Find a block by its self-hash.
    pub async fn block_by_hash(&self, hash: &BlockHash) -> Option<Block> {
        self.blocks
            .read()
            .await
            .iter()
            .find(|block| block.hash.as_ref() == Some(hash))
            .cloned()
    }

    /// Get the block whose stored height is `height`.
    pub async fn block_by_height(&self, height: u64) -> Option<Block> {
        let blocks = self.blocks.read().await;

        // Position and height agree except on chains loaded without validation
        if let Some(block) = usize::try_from(height).ok().and_then(|i| blocks.get(i)) {
            if block.height == height {
                return Some(block.clone());
            }
        }
        blocks.iter().find(|block| block.height == height).cloned()
    }

    /// Decoded payloads whose `user` field equals `address`, in chain order.
    ///
    /// Genesis is never included.
    pub async fn blocks_by_owner(&self, address: &str) -> Result<Vec<Value>> {
        let blocks = self.blocks.read().await;
        let mut owned = Vec::new();

        for block in blocks.iter() {
            if let DecodedPayload::Record(value) = block.decode_payload(self.codec.as_ref())? {
                if value.get("user").and_then(Value::as_str) == Some(address) {
                    owned.push(value);
                }
            }
        }

        Ok(owned)
    }

    /// Height of the tip (0 when only genesis exists).
    pub async fn height(&self) -> u64 {
        (self.blocks.read().await.len() as u64).saturating_sub(1)
    }

    /// Number of blocks, genesis included.
    pub async fn block_count(&self) -> usize {
        self.blocks.read().await.len()
    }

    /// Copy of every block, in height order.
    pub async fn snapshot(&self) -> Vec<Block> {
        self.blocks.read().await.clone()
    }

    /// The payload codec.
    pub fn codec(&self) -> &dyn PayloadCodec {
        self.codec.as_ref()
    }

    /// The backing archive.
    pub fn archive(&self) -> &A {
        &self.archive
    }
}

impl ChainStore<MemoryArchive> {
    /// A fresh chain over an in-memory archive with default settings.
    pub async fn in_memory() -> Result<Self> {
        Self::open(
            Arc::new(MemoryArchive::new()),
            Arc::new(HexJsonCodec),
            Arc::new(SystemClock),
            ChainConfig::default(),
        )
        .await
    }
}

impl<A: BlockArchive> fmt::Debug for ChainStore<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use starchain_core::{encode_block, ManualClock, Violation};
    use tokio::time::timeout;

    const START: i64 = 1_700_000_000;

    async fn open_with(
        archive: Arc<MemoryArchive>,
        clock: Arc<ManualClock>,
    ) -> Result<ChainStore<MemoryArchive>> {
        ChainStore::open(archive, Arc::new(HexJsonCodec), clock, ChainConfig::default()).await
    }

    #[tokio::test]
    async fn test_genesis_on_open() {
        let clock = Arc::new(ManualClock::new(START));
        let chain = open_with(Arc::new(MemoryArchive::new()), clock).await.unwrap();

        assert_eq!(chain.block_count().await, 1);
        assert_eq!(chain.height().await, 0);

        let genesis = chain.tip().await.unwrap();
        assert_eq!(genesis.height, 0);
        assert_eq!(genesis.timestamp, START);
        assert!(genesis.previous_hash.is_none());
        assert!(genesis.verify_self_hash());
        assert_eq!(
            genesis.decode_payload(chain.codec()).unwrap(),
            DecodedPayload::Genesis
        );
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let chain = ChainStore::in_memory().await.unwrap();
        let genesis = chain.tip().await;

        chain.initialize().await.unwrap();
        chain.initialize().await.unwrap();

        assert_eq!(chain.block_count().await, 1);
        assert_eq!(chain.tip().await, genesis);
    }

    #[tokio::test]
    async fn test_append_links_to_tip() {
        let clock = Arc::new(ManualClock::new(START));
        let chain = open_with(Arc::new(MemoryArchive::new()), clock.clone()).await.unwrap();

        clock.advance(10);
        let b1 = chain.append(&json!({"user": "a"})).await.unwrap();
        clock.advance(10);
        let b2 = chain.append(&json!({"user": "b"})).await.unwrap();

        let genesis = chain.block_by_height(0).await.unwrap();
        assert_eq!(b1.height, 1);
        assert_eq!(b1.timestamp, START + 10);
        assert_eq!(b1.previous_hash, genesis.hash);
        assert_eq!(b2.height, 2);
        assert_eq!(b2.previous_hash, b1.hash);
        assert!(b2.verify_self_hash());
        assert_eq!(chain.height().await, 2);
        assert_eq!(chain.archive().block_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_lookups() {
        let chain = ChainStore::in_memory().await.unwrap();
        let b1 = chain.append(&json!({"user": "a"})).await.unwrap();
        let hash = b1.hash.unwrap();

        assert_eq!(chain.block_by_hash(&hash).await, Some(b1.clone()));
        assert_eq!(chain.block_by_height(1).await, Some(b1));
        assert_eq!(chain.block_by_hash(&BlockHash::ZERO).await, None);
        assert_eq!(chain.block_by_height(7).await, None);
    }

    #[tokio::test]
    async fn test_blocks_by_owner_skips_genesis() {
        let config = ChainConfig {
            genesis_payload: json!({"user": "alice"}),
            ..ChainConfig::default()
        };
        let chain = ChainStore::open(
            Arc::new(MemoryArchive::new()),
            Arc::new(HexJsonCodec),
            Arc::new(ManualClock::new(START)),
            config,
        )
        .await
        .unwrap();

        chain.append(&json!({"user": "alice", "star": 1})).await.unwrap();
        chain.append(&json!({"user": "bob", "star": 2})).await.unwrap();
        chain.append(&json!({"user": "alice", "star": 3})).await.unwrap();

        let owned = chain.blocks_by_owner("alice").await.unwrap();
        assert_eq!(
            owned,
            vec![
                json!({"user": "alice", "star": 1}),
                json!({"user": "alice", "star": 3}),
            ]
        );
        assert!(chain.blocks_by_owner("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_reloads_archive() {
        let archive = Arc::new(MemoryArchive::new());
        let clock = Arc::new(ManualClock::new(START));

        let first = open_with(archive.clone(), clock.clone()).await.unwrap();
        first.append(&json!({"user": "a"})).await.unwrap();
        let expected = first.snapshot().await;
        drop(first);

        clock.advance(1_000);
        let reopened = open_with(archive, clock).await.unwrap();
        assert_eq!(reopened.snapshot().await, expected);
    }

    #[tokio::test]
    async fn test_corrupted_archive_refused() {
        let archive = Arc::new(MemoryArchive::new());
        let clock = Arc::new(ManualClock::new(START));

        let chain = open_with(archive.clone(), clock.clone()).await.unwrap();
        let mut b1 = chain.append(&json!({"user": "a"})).await.unwrap();
        drop(chain);

        b1.timestamp += 1;
        archive.overwrite_raw(1, encode_block(&b1));

        match open_with(archive.clone(), clock.clone()).await {
            Err(ChainError::Corrupted { violations }) => {
                assert_eq!(violations, vec![Violation::InvalidHash { height: 1 }]);
            }
            other => panic!("expected Corrupted, got {:?}", other),
        }

        let lenient = ChainStore::open(
            archive,
            Arc::new(HexJsonCodec),
            clock,
            ChainConfig {
                validate_on_load: false,
                ..ChainConfig::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(lenient.block_count().await, 2);
    }

    #[tokio::test]
    async fn test_archive_conflict_leaves_chain_untouched() {
        let archive = Arc::new(MemoryArchive::new());
        let clock = Arc::new(ManualClock::new(START));
        let chain = open_with(archive.clone(), clock).await.unwrap();

        // Height 1 taken by a block that does not extend this chain's tip
        let foreign = Block::from_encoded(b"00".to_vec()).link(1, START, Some(BlockHash::ZERO));
        archive.put_block(&foreign).await.unwrap();

        let result = chain.append(&json!({"user": "b"})).await;

        assert!(matches!(result, Err(ChainError::Conflict { height: 1, .. })));
        assert_eq!(chain.block_count().await, 1);
    }

    #[tokio::test]
    async fn test_stores_sharing_an_archive_converge() {
        let archive = Arc::new(MemoryArchive::new());
        let clock = Arc::new(ManualClock::new(START));

        let first = open_with(archive.clone(), clock.clone()).await.unwrap();
        let second = open_with(archive.clone(), clock.clone()).await.unwrap();

        let b1 = first.append(&json!({"user": "a"})).await.unwrap();
        let b2 = second.append(&json!({"user": "b"})).await.unwrap();

        assert_eq!(b2.height, 2);
        assert_eq!(b2.previous_hash, b1.hash);
        assert_eq!(second.block_by_height(1).await, Some(b1));
        assert_eq!(archive.block_count().await.unwrap(), 3);
    }

    /// Archive that holds the caller for a while after each write.
    struct SlowArchive {
        inner: MemoryArchive,
        delay: Duration,
    }

    #[async_trait]
    impl BlockArchive for SlowArchive {
        async fn put_block(&self, block: &Block) -> starchain_store::Result<InsertResult> {
            let result = self.inner.put_block(block).await;
            tokio::time::sleep(self.delay).await;
            result
        }

        async fn get_block(&self, height: u64) -> starchain_store::Result<Option<Block>> {
            self.inner.get_block(height).await
        }

        async fn load_chain(&self) -> starchain_store::Result<Vec<Block>> {
            self.inner.load_chain().await
        }

        async fn block_count(&self) -> starchain_store::Result<u64> {
            self.inner.block_count().await
        }
    }

    #[tokio::test]
    async fn test_abandoned_append_does_not_wedge_chain() {
        let archive = Arc::new(SlowArchive {
            inner: MemoryArchive::new(),
            delay: Duration::from_millis(50),
        });
        let chain = ChainStore::open(
            archive.clone(),
            Arc::new(HexJsonCodec),
            Arc::new(ManualClock::new(START)),
            ChainConfig::default(),
        )
        .await
        .unwrap();

        let abandoned = timeout(
            Duration::from_millis(10),
            chain.append(&json!({"user": "a"})),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(chain.height().await, 0);
        assert_eq!(archive.block_count().await.unwrap(), 2);

        for expected in 2..5 {
            let block = chain.append(&json!({"user": "b"})).await.unwrap();
            assert_eq!(block.height, expected);
        }

        let adopted = chain.block_by_height(1).await.unwrap();
        assert_eq!(
            adopted.decode_payload(chain.codec()).unwrap(),
            DecodedPayload::Record(json!({"user": "a"}))
        );
        assert!(validate_chain(&chain.snapshot().await).is_empty());
    }

    #[tokio::test]
    async fn test_block_by_height_matches_stored_height() {
        let archive = Arc::new(MemoryArchive::new());
        let clock = Arc::new(ManualClock::new(START));

        let chain = open_with(archive.clone(), clock.clone()).await.unwrap();
        let genesis_hash = chain.tip().await.unwrap().hash;
        drop(chain);

        // Archive holds heights {0, 2}
        let gapped = Block::create(&HexJsonCodec, &json!({"user": "a"}))
            .unwrap()
            .link(2, START, genesis_hash);
        archive.put_block(&gapped).await.unwrap();

        let lenient = ChainStore::open(
            archive,
            Arc::new(HexJsonCodec),
            clock,
            ChainConfig {
                validate_on_load: false,
                ..ChainConfig::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(lenient.block_by_height(1).await, None);
        assert_eq!(lenient.block_by_height(2).await, Some(gapped));
    }
}
