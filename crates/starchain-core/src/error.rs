//! Error types for Starchain Core.

use thiserror::Error;

/// Errors from block construction, encoding and decoding.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("malformed block: {0}")]
    MalformedBlock(String),
}

/// Terminal outcomes of a failed ownership verification.
///
/// Each variant tells the client something different: `Expired` means request
/// a fresh challenge, `SignatureInvalid` means fix the signature, `Malformed`
/// means fix the request shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChallengeError {
    #[error("malformed challenge: {0}")]
    Malformed(String),

    #[error("challenge expired: {elapsed}s elapsed, window is {window}s")]
    Expired { elapsed: i64, window: i64 },

    #[error("signature verification failed")]
    SignatureInvalid,
}
