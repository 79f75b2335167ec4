//! In-memory implementation of the BlockArchive trait.
//!
//! Same semantics as SQLite but nothing survives the process. Blocks are held
//! in their persisted encoding so reloads exercise the same decode path.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use starchain_core::{decode_block, encode_block, Block};

use crate::error::Result;
use crate::traits::{BlockArchive, InsertResult};

/// In-memory archive. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    blocks: RwLock<BTreeMap<u64, Vec<u8>>>,
}

impl MemoryArchive {
    /// Create a new empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored bytes at a height, bypassing all checks.
    ///
    /// Simulates on-disk corruption in tests.
    pub fn overwrite_raw(&self, height: u64, bytes: Vec<u8>) {
        let mut blocks = self.blocks.write().unwrap_or_else(|e| e.into_inner());
        blocks.insert(height, bytes);
    }
}

#[async_trait]
impl BlockArchive for MemoryArchive {
    async fn put_block(&self, block: &Block) -> Result<InsertResult> {
        let encoded = encode_block(block);
        let mut blocks = self.blocks.write().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = blocks.get(&block.height) {
            if *existing == encoded {
                return Ok(InsertResult::AlreadyExists);
            }
            let existing = decode_block(existing)?;
            return Ok(InsertResult::Conflict {
                existing: existing.hash,
            });
        }

        blocks.insert(block.height, encoded);
        Ok(InsertResult::Inserted)
    }

    async fn get_block(&self, height: u64) -> Result<Option<Block>> {
        let blocks = self.blocks.read().unwrap_or_else(|e| e.into_inner());
        match blocks.get(&height) {
            Some(bytes) => Ok(Some(decode_block(bytes)?)),
            None => Ok(None),
        }
    }

    async fn load_chain(&self) -> Result<Vec<Block>> {
        let blocks = self.blocks.read().unwrap_or_else(|e| e.into_inner());
        blocks
            .values()
            .map(|bytes| decode_block(bytes).map_err(Into::into))
            .collect()
    }

    async fn block_count(&self) -> Result<u64> {
        let blocks = self.blocks.read().unwrap_or_else(|e| e.into_inner());
        Ok(blocks.len() as u64)
    }
}
