//! # Starchain Core
//!
//! Pure primitives for Starchain: blocks, block hashes, canonical encoding,
//! payload codecs, and the ownership challenge that gates admission.
//!
//! This crate contains no I/O, no storage, no locking. The chain itself lives
//! in the `starchain` crate; everything here is computation over values.
//!
//! ## Key Types
//!
//! - [`Block`] - One record in the chain, linked to its predecessor by hash
//! - [`BlockHeader`] - The hashable view of a block (never includes the block's own hash)
//! - [`BlockHash`] - 32-byte Blake3 digest identifying a block
//! - [`OwnershipChallenge`] - Issues and verifies `<address>:<time>:<tag>` challenges
//! - [`Violation`] - One integrity problem found by [`validate_chain`]
//!
//! ## Canonicalization
//!
//! Block hashes are computed over deterministic CBOR. See [`canonical`] module.

pub mod block;
pub mod canonical;
pub mod challenge;
pub mod clock;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod types;
pub mod validation;

pub use block::{Block, BlockHeader, DecodedPayload};
pub use canonical::{canonical_header_bytes, decode_block, encode_block};
pub use challenge::{Challenge, ChallengeConfig, OwnershipChallenge, DEFAULT_CHALLENGE_TAG};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{CborCodec, HexJsonCodec, PayloadCodec};
pub use crypto::{Ed25519Verifier, Keypair, SignatureVerifier};
pub use error::{ChallengeError, CoreError};
pub use types::BlockHash;
pub use validation::{validate_chain, Violation};
