//! # Starchain
//!
//! A tamper-evident star registry: an append-only chain of hash-linked
//! blocks, where new records are admitted only after a time-limited
//! proof-of-ownership challenge.
//!
//! ## Overview
//!
//! - **ChainStore**: ordered blocks with a single mutation point, `append`
//! - **StarRegistry**: verifies a signed challenge, then appends `{user, star}`
//! - **ChainValidator**: read-only walk reporting every hash or link violation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use starchain::core::{Ed25519Verifier, HexJsonCodec, Keypair, SystemClock};
//! use starchain::store::SqliteArchive;
//! use starchain::{RegistryConfig, StarRegistry};
//!
//! async fn example() {
//!     starchain::logging::init_logging("info");
//!
//!     let archive = Arc::new(SqliteArchive::open("chain.db").unwrap());
//!     let registry = StarRegistry::open(
//!         archive,
//!         Arc::new(HexJsonCodec),
//!         Ed25519Verifier,
//!         Arc::new(SystemClock),
//!         RegistryConfig::default(),
//!     )
//!     .await
//!     .unwrap();
//!
//!     // The owner signs the issued challenge with their key
//!     let keypair = Keypair::generate();
//!     let address = keypair.address();
//!     let message = registry.request_ownership(&address);
//!     let signature = keypair.sign_message(&message);
//!
//!     let star = serde_json::json!({ "ra": "16h 29m 1.0s", "dec": "68° 52' 56.9", "story": "found" });
//!     let block = registry
//!         .submit_star(&address, &message, &signature, star)
//!         .await
//!         .unwrap();
//!     assert_eq!(block.height, 1);
//!
//!     assert!(registry.validate_chain().await.is_empty());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `starchain::core` - Core primitives (Block, BlockHash, OwnershipChallenge, etc.)
//! - `starchain::store` - Archive abstraction and SQLite

pub mod chain;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod validator;

// Re-export component crates
pub use starchain_core as core;
pub use starchain_store as store;

// Re-export main types for convenience
pub use chain::ChainStore;
pub use config::{ChainConfig, ChallengeConfig, RegistryConfig};
pub use error::{ChainError, RegistryError, Result};
pub use registry::StarRegistry;
pub use validator::ChainValidator;

// Re-export commonly used core types
pub use starchain_core::{Block, BlockHash, ChallengeError, Violation};
