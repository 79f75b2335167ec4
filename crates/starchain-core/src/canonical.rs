//! Canonical CBOR encoding for block hashing and persistence.
//!
//! This module follows RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 seconds)
//!
//! Two encodings share one key space:
//!
//! | key | field           | header | block |
//! |-----|-----------------|--------|-------|
//! | 0   | height          | yes    | yes   |
//! | 1   | payload         | yes    | yes   |
//! | 2   | timestamp       | yes    | yes   |
//! | 3   | previous_hash   | yes    | yes   |
//! | 4   | hash            | no     | yes   |
//!
//! The header encoding is the hash input. The block encoding is the persisted
//! layout; dropping key 4 from it yields exactly the header encoding, so a
//! reloaded block recomputes the same hash.

use bytes::Bytes;
use ciborium::value::{Integer, Value};

use crate::block::{Block, BlockHeader};
use crate::error::CoreError;
use crate::types::BlockHash;

/// Field keys (integer keys for compact encoding).
mod keys {
    pub const HEIGHT: u64 = 0;
    pub const PAYLOAD: u64 = 1;
    pub const TIMESTAMP: u64 = 2;
    pub const PREVIOUS_HASH: u64 = 3;
    pub const HASH: u64 = 4;
}

/// Encode a block header to canonical CBOR bytes.
pub fn canonical_header_bytes(header: &BlockHeader<'_>) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_map_canonical(&mut buf, &header_entries(header));
    buf
}

/// Encode a full block (header fields plus self-hash) for persistence.
pub fn encode_block(block: &Block) -> Vec<u8> {
    let mut entries = header_entries(&block.header());
    entries.push((key(keys::HASH), optional_hash(block.hash.as_ref())));

    let mut buf = Vec::new();
    encode_map_canonical(&mut buf, &entries);
    buf
}

/// Decode a block from its persisted encoding.
///
/// The stored hash is taken as-is; callers decide whether to verify it.
pub fn decode_block(bytes: &[u8]) -> Result<Block, CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::Decoding(e.to_string()))?;

    let map = match value {
        Value::Map(m) => m,
        _ => return Err(CoreError::MalformedBlock("expected map".into())),
    };

    let get = |k: u64| -> Option<&Value> {
        map.iter()
            .find(|(mk, _)| matches!(mk, Value::Integer(i) if i128::from(*i) == k as i128))
            .map(|(_, v)| v)
    };

    let height = match get(keys::HEIGHT) {
        Some(Value::Integer(i)) => u64::try_from(*i)
            .map_err(|_| CoreError::MalformedBlock("height out of range".into()))?,
        _ => return Err(CoreError::MalformedBlock("missing height".into())),
    };

    let payload = match get(keys::PAYLOAD) {
        Some(Value::Bytes(b)) => Bytes::from(b.clone()),
        _ => return Err(CoreError::MalformedBlock("missing payload".into())),
    };

    let timestamp = match get(keys::TIMESTAMP) {
        Some(Value::Integer(i)) => i64::try_from(*i)
            .map_err(|_| CoreError::MalformedBlock("timestamp out of range".into()))?,
        _ => return Err(CoreError::MalformedBlock("missing timestamp".into())),
    };

    let previous_hash = parse_optional_hash(get(keys::PREVIOUS_HASH), "previous_hash")?;
    let hash = parse_optional_hash(get(keys::HASH), "hash")?;

    Ok(Block {
        height,
        payload,
        timestamp,
        previous_hash,
        hash,
    })
}

fn header_entries(header: &BlockHeader<'_>) -> Vec<(Value, Value)> {
    vec![
        (key(keys::HEIGHT), Value::Integer(header.height.into())),
        (key(keys::PAYLOAD), Value::Bytes(header.payload.to_vec())),
        (key(keys::TIMESTAMP), Value::Integer(header.timestamp.into())),
        (
            key(keys::PREVIOUS_HASH),
            optional_hash(header.previous_hash.as_ref()),
        ),
    ]
}

fn key(k: u64) -> Value {
    Value::Integer(k.into())
}

fn optional_hash(hash: Option<&BlockHash>) -> Value {
    match hash {
        Some(h) => Value::Bytes(h.0.to_vec()),
        None => Value::Null,
    }
}

fn parse_optional_hash(value: Option<&Value>, field: &str) -> Result<Option<BlockHash>, CoreError> {
    match value {
        Some(Value::Bytes(b)) => BlockHash::try_from(b.as_slice())
            .map(Some)
            .map_err(|_| CoreError::MalformedBlock(format!("invalid {} length", field))),
        Some(Value::Null) | None => Ok(None),
        _ => Err(CoreError::MalformedBlock(format!("invalid {}", field))),
    }
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Null => buf.push(0xf6),
        _ => unreachable!("block fields encode as integers, bytes, maps or null"),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n = i128::from(i);

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
