//! Binary snapshots of a [`RuleStore`](crate::RuleStore).
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"RTRE"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! The format version must match exactly. Each stored AST is kept as its JSON
//! text and must decode through [`Node::from_json`] before a snapshot is
//! accepted.

use serde::{Deserialize, Serialize};

use super::{DeserializeError, SerializeError};
use crate::Node;

const MAGIC: &[u8; 4] = b"RTRE";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SnapshotRule {
    pub(crate) id: u64,
    pub(crate) source: String,
    pub(crate) ast: String,
    pub(crate) created_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    pub(crate) next_id: u64,
    pub(crate) rules: Vec<SnapshotRule>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(snapshot: &Snapshot) -> Result<(), DeserializeError> {
    let mut previous = 0;
    for rule in &snapshot.rules {
        if rule.id <= previous {
            return Err(DeserializeError::Validation(format!(
                "rule id {} is out of order (previous id {previous})",
                rule.id
            )));
        }
        if rule.id >= snapshot.next_id {
            return Err(DeserializeError::Validation(format!(
                "rule id {} is not below the next id {}",
                rule.id, snapshot.next_id
            )));
        }
        if chrono::DateTime::<chrono::Utc>::from_timestamp_millis(rule.created_at_ms).is_none() {
            return Err(DeserializeError::Validation(format!(
                "rule {} has an out-of-range creation time",
                rule.id
            )));
        }
        Node::from_json(&rule.ast)?;
        previous = rule.id;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    #[allow(clippy::cast_possible_truncation)] // snapshots stay far below 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash.as_bytes()[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }
    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

// ---------------------------------------------------------------------------
// Encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, SerializeError> {
    let payload = bincode::serde::encode_to_vec(snapshot, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Snapshot, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != payload_len as usize {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: payload.len(),
        });
    }

    if blake3::hash(payload).as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (snapshot, _): (Snapshot, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;

    validate(&snapshot)?;
    Ok(snapshot)
}
