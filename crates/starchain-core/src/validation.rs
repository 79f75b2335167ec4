//! Whole-chain validation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::block::Block;

/// One integrity problem found in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    /// The stored self-hash does not match the block's fields.
    InvalidHash { height: u64 },

    /// `previous_hash` does not equal the preceding block's self-hash.
    BrokenLink { height: u64 },

    /// The block's stored height is not its position in the sequence.
    HeightMismatch { index: u64, height: u64 },
}

impl Violation {
    /// Height of the offending block, as stored on it.
    pub fn height(&self) -> u64 {
        match self {
            Violation::InvalidHash { height }
            | Violation::BrokenLink { height }
            | Violation::HeightMismatch { height, .. } => *height,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::InvalidHash { height } => {
                write!(f, "block {} has an invalid hash", height)
            }
            Violation::BrokenLink { height } => {
                write!(f, "block {} has an invalid previous hash", height)
            }
            Violation::HeightMismatch { index, height } => {
                write!(f, "block at index {} claims height {}", index, height)
            }
        }
    }
}

/// Validate a chain given in index order.
///
/// Every block is checked against its own hash. Each block after the first is
/// checked against `blocks[i - 1]` directly, never against a running "latest"
/// pointer. Problems accumulate; an empty result means the chain is valid.
pub fn validate_chain(blocks: &[Block]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (i, block) in blocks.iter().enumerate() {
        let index = i as u64;

        if block.height != index {
            violations.push(Violation::HeightMismatch {
                index,
                height: block.height,
            });
        }

        if !block.verify_self_hash() {
            violations.push(Violation::InvalidHash {
                height: block.height,
            });
        }

        // Genesis has no linkage constraint
        if i > 0 && block.previous_hash != blocks[i - 1].hash {
            violations.push(Violation::BrokenLink {
                height: block.height,
            });
        }
    }

    violations
}
