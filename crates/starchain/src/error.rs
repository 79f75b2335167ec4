//! Error types for the chain and the registry.

use starchain_core::{BlockHash, ChallengeError, CoreError, Violation};
use starchain_store::StoreError;
use thiserror::Error;

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Payload encoding or decoding error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Archive error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The archive already holds a different block at this height.
    #[error("conflict at height {height}: archive holds {existing:?}")]
    Conflict {
        height: u64,
        existing: Option<BlockHash>,
    },

    /// Persisted blocks failed validation on load.
    #[error("archived chain is corrupted ({} violations)", violations.len())]
    Corrupted { violations: Vec<Violation> },
}

/// Errors from submitting a star.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The ownership challenge was rejected.
    #[error("ownership challenge rejected: {0}")]
    Challenge(#[from] ChallengeError),

    /// The chain refused the append.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Result type for chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;
