//! Configuration management for the herb ledger

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::types::{LedgerError, LedgerResult};

/// Digest used to seal blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// Rolling 32-bit `h * 31 + c` hash rendered as 8 hex digits.
    ///
    /// Kept bit-exact for reading legacy chains. The hash is linear in its
    /// input and the nonce is its last component, so a short nonce only moves
    /// the digest within a narrow band and a leading-zero target can take
    /// tens of millions of attempts. Only difficulty 0 is accepted.
    Rolling32,
    /// SHA-256 rendered as 64 hex digits
    #[default]
    Sha256,
}

impl HashAlgorithm {
    /// Largest leading-zero target accepted for this digest.
    ///
    /// Each SHA-256 hex digit costs 16x more attempts on average; 5 digits is
    /// about a million hashes.
    pub fn max_difficulty(&self) -> usize {
        match self {
            HashAlgorithm::Rolling32 => 0,
            HashAlgorithm::Sha256 => 5,
        }
    }
}

/// How an update marks the block it replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupersedePolicy {
    /// Record `supersededBy` beside the hashed payload; the chain stays valid
    #[default]
    Flag,
    /// Rewrite the old entry's status to pending in place. The old block's
    /// hash no longer matches its content, so `validate` reports the chain
    /// as tampered from then on.
    DemoteStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Leading '0' hex digits required of every mined hash
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    #[serde(default)]
    pub supersede_policy: SupersedePolicy,
    /// Reject appends whose batch id already exists on the chain
    #[serde(default)]
    pub enforce_unique_batch_ids: bool,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Key the entry list is persisted under
    #[serde(default = "default_storage_key")]
    pub key: String,
    /// Directory used by `FileStore`
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_network_name")]
    pub name: String,
    #[serde(default = "default_consensus")]
    pub consensus: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            hash_algorithm: HashAlgorithm::default(),
            supersede_policy: SupersedePolicy::default(),
            enforce_unique_batch_ids: false,
            storage: StorageConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: default_storage_key(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: default_network_name(),
            consensus: default_consensus(),
        }
    }
}

fn default_difficulty() -> usize {
    2
}

fn default_storage_key() -> String {
    "herbEntries".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_network_name() -> String {
    "AyurTrace Testnet".to_string()
}

fn default_consensus() -> String {
    "Proof of Work (Simulated)".to_string()
}

impl LedgerConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(contents: &str) -> LedgerResult<Self> {
        let config: LedgerConfig = toml::from_str(contents)
            .map_err(|e| LedgerError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn with_difficulty(mut self, difficulty: usize) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_hash_algorithm(mut self, hash_algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = hash_algorithm;
        self
    }

    pub fn with_supersede_policy(mut self, supersede_policy: SupersedePolicy) -> Self {
        self.supersede_policy = supersede_policy;
        self
    }

    pub fn with_unique_batch_ids(mut self, enforce: bool) -> Self {
        self.enforce_unique_batch_ids = enforce;
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage.key = key.into();
        self
    }

    /// Reject settings under which mining could spin forever
    pub fn validate(&self) -> LedgerResult<()> {
        let max = self.hash_algorithm.max_difficulty();
        if self.difficulty > max {
            return Err(LedgerError::Config(format!(
                "difficulty {} exceeds the maximum of {} for {:?}",
                self.difficulty, max, self.hash_algorithm
            )));
        }

        if self.storage.key.trim().is_empty() {
            return Err(LedgerError::Config(
                "storage key cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
