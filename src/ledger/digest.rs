//! Block digests and the proof-of-work predicate

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::config::HashAlgorithm;
use crate::types::HerbEntry;

/// Canonical JSON of the hashed form of an entry.
///
/// Keys are emitted in sorted order (`serde_json::Map` is BTreeMap-backed),
/// absent optional fields are omitted and `blockHash` is always blank, since
/// a block's own hash cannot be part of its preimage. The object is built
/// field by field from owned strings, so there is no serialization step
/// that could fail.
pub fn canonical_payload(data: &HerbEntry) -> String {
    let mut fields = Map::new();
    let mut put = |key: &str, value: &str| {
        fields.insert(key.to_string(), Value::String(value.to_string()));
    };

    put("id", &data.id);
    put("herbName", &data.herb_name);
    put("location", &data.location);
    put("farmerId", &data.farmer_id);
    put("description", &data.description);
    put("timestamp", &data.timestamp);
    put("batchId", &data.batch_id);
    put("status", data.status.as_str());
    if let Some(lab_notes) = &data.lab_notes {
        put("labNotes", lab_notes);
    }
    if let Some(verification_date) = &data.verification_date {
        put("verificationDate", verification_date);
    }
    if let Some(lab_id) = &data.lab_id {
        put("labId", lab_id);
    }
    put("blockHash", "");
    if let Some(previous_hash) = &data.previous_hash {
        put("previousHash", previous_hash);
    }

    Value::Object(fields).to_string()
}

/// Digest over `index ‖ timestamp ‖ payload ‖ previous_hash ‖ nonce`
pub fn block_digest(
    algorithm: HashAlgorithm,
    index: u64,
    timestamp: &str,
    data: &HerbEntry,
    previous_hash: &str,
    nonce: u64,
) -> String {
    let input = format!(
        "{}{}{}{}{}",
        index,
        timestamp,
        canonical_payload(data),
        previous_hash,
        nonce
    );

    match algorithm {
        HashAlgorithm::Rolling32 => rolling_hash32(&input),
        HashAlgorithm::Sha256 => sha256_hex(&input),
    }
}

/// `h = h * 31 + c` over UTF-16 code units with 32-bit signed wraparound,
/// then the absolute value as 8 zero-padded lowercase hex digits.
///
/// Not collision resistant. It only makes naive tampering visible and gives
/// the mining loop something to search.
pub fn rolling_hash32(input: &str) -> String {
    let mut hash: i32 = 0;
    for unit in input.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }

    // i32::MIN has no i32 absolute value; widen first
    format!("{:08x}", i64::from(hash).unsigned_abs())
}

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// True when `hash` starts with `difficulty` '0' characters
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}
