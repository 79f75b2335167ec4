//! SQLite implementation of the BlockArchive trait.
//!
//! The primary durable backend. Uses rusqlite with bundled SQLite, wrapped in
//! async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use starchain_core::{Block, BlockHash};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{BlockArchive, InsertResult};

/// SQLite-based archive.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteArchive {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteArchive {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Task(format!("connection mutex poisoned: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

impl std::fmt::Debug for SqliteArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteArchive").finish_non_exhaustive()
    }
}

const SELECT_BLOCK: &str = "SELECT height, payload, timestamp, previous_hash, hash FROM blocks";

// Helper to convert a row to Block
fn row_to_block(row: &rusqlite::Row<'_>) -> rusqlite::Result<Block> {
    let height: i64 = row.get("height")?;
    let payload: Vec<u8> = row.get("payload")?;
    let previous_hash: Option<Vec<u8>> = row.get("previous_hash")?;
    let hash: Vec<u8> = row.get("hash")?;

    Ok(Block {
        height: height as u64,
        payload: Bytes::from(payload),
        timestamp: row.get("timestamp")?,
        previous_hash: previous_hash
            .map(|b| blob_to_hash(&b, 3, "previous_hash"))
            .transpose()?,
        hash: Some(blob_to_hash(&hash, 4, "hash")?),
    })
}

fn blob_to_hash(bytes: &[u8], column: usize, name: &str) -> rusqlite::Result<BlockHash> {
    BlockHash::try_from(bytes).map_err(|_| {
        rusqlite::Error::InvalidColumnType(column, name.into(), rusqlite::types::Type::Blob)
    })
}

#[async_trait]
impl BlockArchive for SqliteArchive {
    async fn put_block(&self, block: &Block) -> Result<InsertResult> {
        let block = block.clone();

        self.with_conn(move |conn| {
            let hash = block
                .hash
                .ok_or_else(|| StoreError::InvalidData("cannot archive an unlinked block".into()))?;

            let existing = conn
                .query_row(
                    &format!("{} WHERE height = ?1", SELECT_BLOCK),
                    params![block.height as i64],
                    row_to_block,
                )
                .optional()?;

            if let Some(existing) = existing {
                if existing == block {
                    return Ok(InsertResult::AlreadyExists);
                }
                return Ok(InsertResult::Conflict {
                    existing: existing.hash,
                });
            }

            conn.execute(
                "INSERT INTO blocks (height, payload, timestamp, previous_hash, hash)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    block.height as i64,
                    block.payload.as_ref(),
                    block.timestamp,
                    block.previous_hash.as_ref().map(|h| h.0.as_slice()),
                    hash.0.as_slice(),
                ],
            )?;

            tracing::debug!(height = block.height, hash = %hash, "archived block");
            Ok(InsertResult::Inserted)
        })
        .await
    }

    async fn get_block(&self, height: u64) -> Result<Option<Block>> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("{} WHERE height = ?1", SELECT_BLOCK),
                params![height as i64],
                row_to_block,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn load_chain(&self) -> Result<Vec<Block>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{} ORDER BY height", SELECT_BLOCK))?;
            let blocks = stmt
                .query_map([], row_to_block)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(blocks)
        })
        .await
    }

    async fn block_count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use starchain_core::{HexJsonCodec, PayloadCodec};

    fn make_block(height: u64, prev: Option<BlockHash>, user: &str) -> Block {
        let payload = HexJsonCodec.encode(&json!({"user": user})).unwrap();
        Block::from_encoded(payload).link(height, 1_700_000_000 + height as i64, prev)
    }

    #[tokio::test]
    async fn test_put_and_get_block() {
        let archive = SqliteArchive::open_memory().unwrap();
        let genesis = make_block(0, None, "genesis");

        let result = archive.put_block(&genesis).await.unwrap();
        assert_eq!(result, InsertResult::Inserted);

        let retrieved = archive.get_block(0).await.unwrap().unwrap();
        assert_eq!(retrieved, genesis);
        assert!(retrieved.previous_hash.is_none());
        assert!(retrieved.verify_self_hash());
    }

    #[tokio::test]
    async fn test_idempotent_insert() {
        let archive = SqliteArchive::open_memory().unwrap();
        let block = make_block(0, None, "a");

        assert_eq!(archive.put_block(&block).await.unwrap(), InsertResult::Inserted);
        assert_eq!(
            archive.put_block(&block).await.unwrap(),
            InsertResult::AlreadyExists
        );
    }

    #[tokio::test]
    async fn test_conflict_detection() {
        let archive = SqliteArchive::open_memory().unwrap();
        let first = make_block(0, None, "a");
        let rival = make_block(0, None, "b");

        archive.put_block(&first).await.unwrap();
        let result = archive.put_block(&rival).await.unwrap();
        assert!(matches!(result, InsertResult::Conflict { existing } if existing == first.hash));
    }

    #[tokio::test]
    async fn test_unlinked_block_refused() {
        let archive = SqliteArchive::open_memory().unwrap();
        let unlinked = Block::from_encoded(b"00".to_vec());
        assert!(matches!(
            archive.put_block(&unlinked).await,
            Err(StoreError::InvalidData(_))
        ));
    }

    #[tokio::test]
    async fn test_reopen_preserves_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.db");

        let b0 = make_block(0, None, "a");
        let b1 = make_block(1, b0.hash, "b");

        {
            let archive = SqliteArchive::open(&path).unwrap();
            archive.put_block(&b0).await.unwrap();
            archive.put_block(&b1).await.unwrap();
        }

        let archive = SqliteArchive::open(&path).unwrap();
        let loaded = archive.load_chain().await.unwrap();
        assert_eq!(loaded, vec![b0, b1]);
        assert!(loaded.iter().all(Block::verify_self_hash));
        assert_eq!(archive.block_count().await.unwrap(), 2);
    }
}
