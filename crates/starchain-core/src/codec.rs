//! Payload codecs: the reversible encoding between application objects and
//! the opaque bytes stored in a block.
//!
//! Any JSON-representable value must round-trip exactly. Decoding bytes that
//! were not produced by the same codec fails with [`CoreError::Decoding`].

use bytes::Bytes;
use serde_json::Value;

use crate::error::CoreError;

/// Reversible encoding of application payloads.
pub trait PayloadCodec: Send + Sync {
    /// Encode a payload into block bytes.
    fn encode(&self, value: &Value) -> Result<Bytes, CoreError>;

    /// Decode block bytes back into a payload.
    fn decode(&self, bytes: &[u8]) -> Result<Value, CoreError>;
}

/// Hex-encoded JSON text.
///
/// The stored bytes are the ASCII hex digits of the compact JSON document,
/// so a block body stays printable when dumped.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexJsonCodec;

impl PayloadCodec for HexJsonCodec {
    fn encode(&self, value: &Value) -> Result<Bytes, CoreError> {
        let json = serde_json::to_vec(value).map_err(|e| CoreError::Encoding(e.to_string()))?;
        Ok(Bytes::from(hex::encode(json).into_bytes()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CoreError> {
        let json = hex::decode(bytes).map_err(|e| CoreError::Decoding(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| CoreError::Decoding(e.to_string()))
    }
}

/// CBOR via ciborium. Compact, not human-readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl PayloadCodec for CborCodec {
    fn encode(&self, value: &Value) -> Result<Bytes, CoreError> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf).map_err(|e| CoreError::Encoding(e.to_string()))?;
        Ok(Bytes::from(buf))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CoreError> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::Decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn star() -> Value {
        json!({
            "user": "1A2B",
            "star": { "dec": "68° 52' 56.9", "ra": "16h 29m 1.0s", "story": "Testing" }
        })
    }

    #[test]
    fn test_hex_json_roundtrip() {
        let codec = HexJsonCodec;
        let bytes = codec.encode(&star()).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), star());
    }

    #[test]
    fn test_hex_json_is_printable_hex() {
        let bytes = HexJsonCodec.encode(&json!({"data": "Genesis Block"})).unwrap();
        assert!(bytes.iter().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hex_json_rejects_garbage() {
        let result = HexJsonCodec.decode(b"not hex at all");
        assert!(matches!(result, Err(CoreError::Decoding(_))));

        // Valid hex, invalid JSON
        let result = HexJsonCodec.decode(hex::encode(b"{oops").as_bytes());
        assert!(matches!(result, Err(CoreError::Decoding(_))));
    }

    #[test]
    fn test_cbor_roundtrip() {
        let codec = CborCodec;
        let bytes = codec.encode(&star()).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), star());
    }

    #[test]
    fn test_cbor_rejects_truncated() {
        let bytes = CborCodec.encode(&star()).unwrap();
        let result = CborCodec.decode(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(CoreError::Decoding(_))));
    }
}
