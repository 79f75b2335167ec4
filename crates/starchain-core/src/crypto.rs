//! Signature verification seam and a default Ed25519 scheme.
//!
//! The chain consumes signatures through [`SignatureVerifier`] only; which
//! scheme backs it is a deployment choice. [`Ed25519Verifier`] is the bundled
//! implementation: an address is the hex-encoded 32-byte public key and a
//! signature is the hex-encoded 64-byte Ed25519 signature over the UTF-8
//! challenge text.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::fmt;

/// External signature check: did `address` sign `message`?
///
/// Implementations must not panic on malformed input; an undecodable address
/// or signature is simply `false`.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, message: &str, address: &str, signature: &str) -> bool;
}

impl<V: SignatureVerifier + ?Sized> SignatureVerifier for std::sync::Arc<V> {
    fn verify(&self, message: &str, address: &str, signature: &str) -> bool {
        (**self).verify(message, address, signature)
    }
}

/// Ed25519 over hex-encoded keys and signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, message: &str, address: &str, signature: &str) -> bool {
        let Some(key) = decode_fixed::<32>(address) else {
            return false;
        };
        let Some(sig) = decode_fixed::<64>(signature) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&key) else {
            return false;
        };

        verifying_key
            .verify(message.as_bytes(), &Signature::from_bytes(&sig))
            .is_ok()
    }
}

fn decode_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    let bytes = hex::decode(s).ok()?;
    bytes.try_into().ok()
}

/// A keypair whose address is understood by [`Ed25519Verifier`].
///
/// This wraps ed25519-dalek's SigningKey.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The hex-encoded public key.
    pub fn address(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a challenge message, returning the hex-encoded signature.
    pub fn sign_message(&self, message: &str) -> String {
        hex::encode(self.signing_key.sign(message.as_bytes()).to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", &self.address()[..16])
    }
}
