//! Ownership challenge: the handshake that gates admission of new blocks.
//!
//! A challenge is the text `"<address>:<issued_at>:<tag>"`. It is
//! self-describing: nothing is stored between issue and verify, so the age is
//! re-derived from the embedded timestamp.
//!
//! A verification attempt ends in exactly one of:
//!
//! ```text
//! Issued ─┬─> Malformed        (shape, tag or address mismatch)
//!         ├─> Expired          (older than the window)
//!         ├─> SignatureInvalid (verifier said no)
//!         └─> Ok               (caller may append)
//! ```
//!
//! There are no retries; an expired challenge needs a fresh `issue`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::clock::Clock;
use crate::crypto::SignatureVerifier;
use crate::error::ChallengeError;

/// Purpose tag for star registration challenges.
pub const DEFAULT_CHALLENGE_TAG: &str = "starRegistry";

/// Maximum challenge age in seconds (5 minutes).
pub const DEFAULT_WINDOW_SECS: i64 = 5 * 60;

/// Configuration for challenge issue and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeConfig {
    /// Maximum age in seconds. A challenge exactly this old is still valid.
    pub window_secs: i64,
    /// Literal third field; challenges minted with another tag are refused.
    pub tag: String,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            tag: DEFAULT_CHALLENGE_TAG.to_string(),
        }
    }
}

/// A parsed challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub address: String,
    pub issued_at: i64,
    pub tag: String,
}

impl Challenge {
    /// Seconds between issue and `now`. Negative under clock skew.
    pub fn elapsed(&self, now: i64) -> i64 {
        now.saturating_sub(self.issued_at)
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.address, self.issued_at, self.tag)
    }
}

impl FromStr for Challenge {
    type Err = ChallengeError;

    fn from_str(message: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = message.split(':').collect();
        let [address, issued_at, tag] = fields.as_slice() else {
            return Err(ChallengeError::Malformed(format!(
                "expected 3 colon-separated fields, got {}",
                fields.len()
            )));
        };

        let issued_at = issued_at.parse::<i64>().map_err(|_| {
            ChallengeError::Malformed(format!("timestamp {:?} is not an integer", issued_at))
        })?;

        Ok(Self {
            address: address.to_string(),
            issued_at,
            tag: tag.to_string(),
        })
    }
}

/// Issues challenges and verifies signed responses.
pub struct OwnershipChallenge<V: SignatureVerifier> {
    verifier: V,
    clock: Arc<dyn Clock>,
    config: ChallengeConfig,
}

impl<V: SignatureVerifier> OwnershipChallenge<V> {
    pub fn new(verifier: V, clock: Arc<dyn Clock>, config: ChallengeConfig) -> Self {
        Self {
            verifier,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ChallengeConfig {
        &self.config
    }

    /// Mint a challenge for `address`, stamped with the current time.
    pub fn issue(&self, address: &str) -> String {
        Challenge {
            address: address.to_string(),
            issued_at: self.clock.now_seconds(),
            tag: self.config.tag.clone(),
        }
        .to_string()
    }

    /// Check a signed challenge.
    ///
    /// Checks run cheapest first: shape, binding, age, then the signature.
    pub fn verify(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<Challenge, ChallengeError> {
        let challenge: Challenge = message.parse()?;

        if challenge.tag != self.config.tag {
            return Err(ChallengeError::Malformed(format!(
                "unexpected tag {:?}",
                challenge.tag
            )));
        }
        if challenge.address != address {
            return Err(ChallengeError::Malformed(
                "challenge was issued for a different address".into(),
            ));
        }

        // Only excessive age is rejected; a challenge from the "future" passes.
        let elapsed = challenge.elapsed(self.clock.now_seconds());
        if elapsed > self.config.window_secs {
            return Err(ChallengeError::Expired {
                elapsed,
                window: self.config.window_secs,
            });
        }

        if !self.verifier.verify(message, address, signature) {
            return Err(ChallengeError::SignatureInvalid);
        }

        Ok(challenge)
    }
}

impl<V: SignatureVerifier + fmt::Debug> fmt::Debug for OwnershipChallenge<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnershipChallenge")
            .field("verifier", &self.verifier)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
