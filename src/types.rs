//! Core types and data structures for the herb ledger

use serde::{Deserialize, Serialize};

/// Batch id reserved for the genesis block
pub const GENESIS_BATCH_ID: &str = "GENESIS-BLOCK";

/// `previousHash` of the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Lab verification state of a herb batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HerbStatus {
    /// Registered by the farmer, awaiting lab verification (also the superseded marker)
    #[default]
    Pending,
    /// Quality approved by a lab
    Verified,
    /// Failed lab verification
    Rejected,
}

impl HerbStatus {
    /// Whether a lab has reached an outcome for this batch
    pub fn is_final(&self) -> bool {
        matches!(self, HerbStatus::Verified | HerbStatus::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HerbStatus::Pending => "pending",
            HerbStatus::Verified => "verified",
            HerbStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for HerbStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HerbStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(HerbStatus::Pending),
            "verified" => Ok(HerbStatus::Verified),
            "rejected" => Ok(HerbStatus::Rejected),
            other => Err(LedgerError::Validation(format!(
                "Invalid status '{}'. Must be 'pending', 'verified', or 'rejected'",
                other
            ))),
        }
    }
}

/// The herb registration/verification record embedded in every block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HerbEntry {
    /// Record identifier
    pub id: String,
    /// Common or botanical name of the herb
    pub herb_name: String,
    /// Free-text harvest location
    pub location: String,
    /// Identifier of the registering farmer
    pub farmer_id: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Creation timestamp (ISO-8601), kept verbatim
    pub timestamp: String,
    /// External business key of the physical batch
    pub batch_id: String,
    /// Verification state
    #[serde(default)]
    pub status: HerbStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_id: Option<String>,
    /// Denormalized hash of the block holding this entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    /// Denormalized hash of the block preceding the one holding this entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
}

impl HerbEntry {
    /// Create a pending entry stamped with the current time
    pub fn new(
        id: String,
        herb_name: String,
        location: String,
        farmer_id: String,
        description: String,
        batch_id: String,
    ) -> Self {
        Self {
            id,
            herb_name,
            location,
            farmer_id,
            description,
            timestamp: iso_timestamp_now(),
            batch_id,
            status: HerbStatus::Pending,
            lab_notes: None,
            verification_date: None,
            lab_id: None,
            block_hash: None,
            previous_hash: None,
        }
    }

    /// Shallow merge: every field present in `update` overrides, the rest is retained
    pub fn merged_with(&self, update: &EntryUpdate) -> HerbEntry {
        let mut merged = self.clone();
        if let Some(ref id) = update.id {
            merged.id = id.clone();
        }
        if let Some(ref herb_name) = update.herb_name {
            merged.herb_name = herb_name.clone();
        }
        if let Some(ref location) = update.location {
            merged.location = location.clone();
        }
        if let Some(ref farmer_id) = update.farmer_id {
            merged.farmer_id = farmer_id.clone();
        }
        if let Some(ref description) = update.description {
            merged.description = description.clone();
        }
        if let Some(ref timestamp) = update.timestamp {
            merged.timestamp = timestamp.clone();
        }
        if let Some(ref batch_id) = update.batch_id {
            merged.batch_id = batch_id.clone();
        }
        if let Some(status) = update.status {
            merged.status = status;
        }
        if update.lab_notes.is_some() {
            merged.lab_notes = update.lab_notes.clone();
        }
        if update.verification_date.is_some() {
            merged.verification_date = update.verification_date.clone();
        }
        if update.lab_id.is_some() {
            merged.lab_id = update.lab_id.clone();
        }
        merged
    }

    pub fn is_genesis(&self) -> bool {
        self.batch_id == GENESIS_BATCH_ID
    }
}

/// Partial update applied over an existing entry
///
/// The denormalized hash fields are absent on purpose: the ledger always
/// rewrites them when the merged entry is sealed into a new block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub herb_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farmer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ignored by `update_entry`, which always keeps the original creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HerbStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_id: Option<String>,
}

impl EntryUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: HerbStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn lab_id(mut self, lab_id: impl Into<String>) -> Self {
        self.lab_id = Some(lab_id.into());
        self
    }

    pub fn lab_notes(mut self, lab_notes: impl Into<String>) -> Self {
        self.lab_notes = Some(lab_notes.into());
        self
    }

    pub fn verification_date(mut self, verification_date: impl Into<String>) -> Self {
        self.verification_date = Some(verification_date.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Move the new version to a different batch id
    pub fn batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == EntryUpdate::default()
    }
}

/// An indexed, hash-linked container for one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Position in the chain, 0 for genesis
    pub index: u64,
    /// Sealing time (ISO-8601)
    pub timestamp: String,
    pub data: HerbEntry,
    pub previous_hash: String,
    pub hash: String,
    /// Proof-of-work nonce
    pub nonce: u64,
    /// Index of the block that replaced this one through an update.
    /// Lives outside the hashed payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<u64>,
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    pub fn is_superseded(&self) -> bool {
        self.superseded_by.is_some()
    }

    pub fn receipt(&self) -> BlockReceipt {
        BlockReceipt::from(self)
    }
}

/// The subset of block fields surfaced to callers after a write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockReceipt {
    pub index: u64,
    pub hash: String,
    pub previous_hash: String,
    pub timestamp: String,
}

impl From<&Block> for BlockReceipt {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            hash: block.hash.clone(),
            previous_hash: block.previous_hash.clone(),
            timestamp: block.timestamp.clone(),
        }
    }
}

/// Snapshot of the chain state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    /// Number of blocks including genesis
    pub length: usize,
    pub latest_block: Block,
    pub is_valid: bool,
    /// Required count of leading '0' hex digits
    pub difficulty: usize,
}

/// First problem found while walking the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IntegrityIssue {
    /// Stored hash differs from the digest recomputed over the block's fields
    HashMismatch {
        index: u64,
        stored: String,
        computed: String,
    },
    /// `previousHash` does not match the preceding block's hash
    BrokenLink { index: u64 },
    /// Hash lacks the required leading zeros
    ProofOfWorkUnmet { index: u64, difficulty: usize },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::HashMismatch {
                index,
                stored,
                computed,
            } => write!(
                f,
                "block {} hash mismatch: stored {}, computed {}",
                index, stored, computed
            ),
            IntegrityIssue::BrokenLink { index } => {
                write!(f, "block {} does not link to its predecessor", index)
            }
            IntegrityIssue::ProofOfWorkUnmet { index, difficulty } => write!(
                f,
                "block {} hash lacks {} leading zeros",
                index, difficulty
            ),
        }
    }
}

/// Current UTC time in the `YYYY-MM-DDTHH:MM:SS.sssZ` shape
pub fn iso_timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
