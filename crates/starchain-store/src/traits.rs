//! BlockArchive trait: the abstract interface for block persistence.
//!
//! This trait keeps the chain storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use starchain_core::{Block, BlockHash};

use crate::error::Result;

/// Result of archiving a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// Block was archived.
    Inserted,
    /// The identical block is already archived (idempotent - not an error).
    AlreadyExists,
    /// A different block already occupies this height.
    Conflict {
        /// Self-hash of the archived block at this height.
        existing: Option<BlockHash>,
    },
}

/// Async interface for block persistence.
///
/// All methods are async to support both blocking (SQLite) and async
/// backends. For SQLite, `spawn_blocking` keeps the runtime free.
#[async_trait]
pub trait BlockArchive: Send + Sync {
    /// Archive a linked block.
    ///
    /// # Returns
    /// - `Inserted` if the height was free.
    /// - `AlreadyExists` if the exact same block is already there.
    /// - `Conflict` if a different block holds that height.
    async fn put_block(&self, block: &Block) -> Result<InsertResult>;

    /// Get the block at a height.
    async fn get_block(&self, height: u64) -> Result<Option<Block>>;

    /// Load every archived block in ascending height order.
    async fn load_chain(&self) -> Result<Vec<Block>>;

    /// Number of archived blocks.
    async fn block_count(&self) -> Result<u64>;
}
