//! Block: one record in the chain.
//!
//! A block is created unlinked (height 0, timestamp 0, no previous hash, no
//! self-hash). The chain's append step links it exactly once via
//! [`Block::link`]; after that it is never mutated.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::canonical_header_bytes;
use crate::codec::PayloadCodec;
use crate::error::CoreError;
use crate::types::BlockHash;

/// The hashable view of a block.
///
/// Holds exactly the fields that feed the self-hash. The block's own hash is
/// not a member, so it cannot leak into its hash input when `Block` grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader<'a> {
    /// Position in the chain (0 = genesis).
    pub height: u64,

    /// Encoded payload bytes.
    pub payload: &'a [u8],

    /// Seconds since the Unix epoch, assigned at append.
    pub timestamp: i64,

    /// Self-hash of the block at `height - 1` (None for genesis).
    pub previous_hash: Option<BlockHash>,
}

impl BlockHeader<'_> {
    /// Blake3 over the canonical encoding of this header.
    pub fn compute_hash(&self) -> BlockHash {
        BlockHash::digest(&canonical_header_bytes(self))
    }
}

/// Decoded form of a block's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedPayload {
    /// The genesis block, whatever its stored bytes say.
    Genesis,
    /// An application payload.
    Record(Value),
}

impl DecodedPayload {
    /// The application payload, if this is not genesis.
    pub fn into_record(self) -> Option<Value> {
        match self {
            DecodedPayload::Genesis => None,
            DecodedPayload::Record(value) => Some(value),
        }
    }
}

/// A block: encoded payload plus chain linkage and self-hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain (0 = genesis).
    pub height: u64,

    /// Opaque encoded payload.
    pub payload: Bytes,

    /// Seconds since the Unix epoch, assigned at append.
    pub timestamp: i64,

    /// Self-hash of the preceding block (None only for genesis).
    pub previous_hash: Option<BlockHash>,

    /// Hash over the header. None until the block is linked.
    pub hash: Option<BlockHash>,
}

impl Block {
    /// Encode `payload` and wrap it in an unlinked block.
    pub fn create(codec: &dyn PayloadCodec, payload: &Value) -> Result<Self, CoreError> {
        Ok(Self::from_encoded(codec.encode(payload)?))
    }

    /// Wrap already-encoded payload bytes in an unlinked block.
    pub fn from_encoded(payload: impl Into<Bytes>) -> Self {
        Self {
            height: 0,
            payload: payload.into(),
            timestamp: 0,
            previous_hash: None,
            hash: None,
        }
    }

    /// Fill in linkage and seal the self-hash.
    ///
    /// Only the chain's append step calls this.
    pub fn link(mut self, height: u64, timestamp: i64, previous_hash: Option<BlockHash>) -> Self {
        self.height = height;
        self.timestamp = timestamp;
        self.previous_hash = previous_hash;
        self.hash = Some(self.compute_hash());
        self
    }

    /// The hashable view of this block.
    pub fn header(&self) -> BlockHeader<'_> {
        BlockHeader {
            height: self.height,
            payload: &self.payload,
            timestamp: self.timestamp,
            previous_hash: self.previous_hash,
        }
    }

    /// Hash the block's current field values (excluding `hash`).
    pub fn compute_hash(&self) -> BlockHash {
        self.header().compute_hash()
    }

    /// Whether the stored hash matches a fresh computation.
    ///
    /// An unlinked block (no stored hash) never verifies.
    pub fn verify_self_hash(&self) -> bool {
        self.hash == Some(self.compute_hash())
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// Decode the payload.
    ///
    /// Height 0 always yields [`DecodedPayload::Genesis`] without touching
    /// the stored bytes.
    pub fn decode_payload(&self, codec: &dyn PayloadCodec) -> Result<DecodedPayload, CoreError> {
        if self.is_genesis() {
            return Ok(DecodedPayload::Genesis);
        }
        codec.decode(&self.payload).map(DecodedPayload::Record)
    }
}
