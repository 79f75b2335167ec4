//! # Starchain Store
//!
//! Durable archive for Starchain blocks. The chain keeps its working copy in
//! memory and writes every appended block through a [`BlockArchive`]; on
//! startup it reloads whatever the archive holds.
//!
//! ## Key Types
//!
//! - [`BlockArchive`] - The async trait for block persistence
//! - [`SqliteArchive`] - SQLite-based persistent storage
//! - [`MemoryArchive`] - In-memory storage for tests and ephemeral chains
//! - [`InsertResult`] - Result of archiving a block
//!
//! ## Usage
//!
//! ```rust,no_run
//! use starchain_store::{BlockArchive, SqliteArchive};
//!
//! async fn example() {
//!     let archive = SqliteArchive::open("chain.db").unwrap();
//!     let blocks = archive.load_chain().await.unwrap();
//!     println!("{} blocks on disk", blocks.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Field identity**: every backend stores the five block fields
//!   {height, payload, timestamp, previous_hash, hash} as-is, so a reloaded
//!   block recomputes the same hash.
//! - **Idempotent inserts**: archiving the same block twice returns `AlreadyExists`.
//! - **Conflict detection**: a different block at an occupied height returns `Conflict`.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryArchive;
pub use sqlite::SqliteArchive;
pub use traits::{BlockArchive, InsertResult};
