//! The append-only, hash-chained herb ledger

use crate::config::{HashAlgorithm, LedgerConfig, SupersedePolicy};
use crate::ledger::digest::{block_digest, meets_difficulty};
use crate::types::*;

/// Ordered blocks sealed by proof-of-work, genesis first
///
/// Every write takes `&mut self`, so an owner is always the single writer.
/// Hosts sharing one ledger between threads put it behind a mutex.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    difficulty: usize,
    hash_algorithm: HashAlgorithm,
    supersede_policy: SupersedePolicy,
    enforce_unique_batch_ids: bool,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create a ledger holding only the genesis block, with default settings
    pub fn new() -> Self {
        Self::build(&LedgerConfig::default())
    }

    /// Create a ledger holding only the genesis block
    pub fn with_config(config: &LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &LedgerConfig) -> Self {
        let genesis = Self::genesis_block(config.hash_algorithm);
        log::debug!("Created genesis block {}", genesis.hash);

        Self {
            chain: vec![genesis],
            difficulty: config.difficulty,
            hash_algorithm: config.hash_algorithm,
            supersede_policy: config.supersede_policy,
            enforce_unique_batch_ids: config.enforce_unique_batch_ids,
        }
    }

    /// The genesis block is hashed with nonce 0 and never mined
    fn genesis_block(algorithm: HashAlgorithm) -> Block {
        let timestamp = iso_timestamp_now();
        let mut data = HerbEntry {
            id: "genesis".to_string(),
            herb_name: "Genesis Block".to_string(),
            location: "Blockchain Network".to_string(),
            farmer_id: "SYSTEM".to_string(),
            description: "Initial block of the herb traceability ledger".to_string(),
            timestamp: timestamp.clone(),
            batch_id: GENESIS_BATCH_ID.to_string(),
            status: HerbStatus::Verified,
            lab_notes: None,
            verification_date: None,
            lab_id: None,
            block_hash: None,
            previous_hash: Some(GENESIS_PREVIOUS_HASH.to_string()),
        };

        let hash = block_digest(algorithm, 0, &timestamp, &data, GENESIS_PREVIOUS_HASH, 0);
        data.block_hash = Some(hash.clone());

        Block {
            index: 0,
            timestamp,
            data,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            hash,
            nonce: 0,
            superseded_by: None,
        }
    }

    /// Digest of a block computed from its stored fields
    pub fn digest_of(&self, block: &Block) -> String {
        block_digest(
            self.hash_algorithm,
            block.index,
            &block.timestamp,
            &block.data,
            &block.previous_hash,
            block.nonce,
        )
    }

    /// Search nonces sequentially from the block's current nonce until the
    /// digest meets the difficulty target
    pub fn mine(&self, mut block: Block) -> Block {
        loop {
            block.hash = self.digest_of(&block);
            if meets_difficulty(&block.hash, self.difficulty) {
                log::debug!(
                    "Mined block {} with nonce {}: {}",
                    block.index,
                    block.nonce,
                    block.hash
                );
                return block;
            }
            block.nonce += 1;
        }
    }

    /// Seal an entry into a new block at the tip of the chain.
    /// The entry is recorded as given; field checks belong to the caller.
    pub fn append(&mut self, entry: HerbEntry) -> Block {
        let (index, previous_hash) = {
            let latest = self.latest_block();
            (latest.index + 1, latest.hash.clone())
        };

        let mut data = entry;
        data.block_hash = Some(String::new());
        data.previous_hash = Some(previous_hash.clone());

        let candidate = Block {
            index,
            timestamp: iso_timestamp_now(),
            data,
            previous_hash,
            hash: String::new(),
            nonce: 0,
            superseded_by: None,
        };

        let mut block = self.mine(candidate);
        block.data.block_hash = Some(block.hash.clone());
        self.chain.push(block.clone());

        block
    }

    /// Append behind the batch id guards.
    ///
    /// The genesis sentinel is always refused. Existing batch ids are refused
    /// when `enforce_unique_batch_ids` is set.
    pub fn try_append(&mut self, entry: HerbEntry) -> LedgerResult<Block> {
        if entry.is_genesis() {
            return Err(LedgerError::Conflict(format!(
                "Batch ID '{}' is reserved",
                entry.batch_id
            )));
        }

        if self.enforce_unique_batch_ids && self.find_by_batch_id(&entry.batch_id).is_some() {
            log::warn!("Refusing duplicate batch id {}", entry.batch_id);
            return Err(LedgerError::Conflict(format!(
                "Batch ID '{}' already exists",
                entry.batch_id
            )));
        }

        Ok(self.append(entry))
    }

    /// Append a previously persisted entry during rehydration.
    ///
    /// A persisted list holds every version of an updated batch, so an
    /// earlier block carrying the same batch id is tagged as superseded by
    /// the replayed one.
    pub fn replay(&mut self, entry: HerbEntry) -> Block {
        let earlier = self.position_of(&entry.batch_id).filter(|&position| position > 0);
        let block = self.append(entry);

        if let Some(position) = earlier {
            self.chain[position].superseded_by = Some(block.index);
        }

        block
    }

    /// Undo writes made after the chain held `len` blocks.
    ///
    /// `restored` is the pre-write copy of a block an update marked as
    /// superseded; it is put back in its slot. Genesis is never removed.
    pub(crate) fn revert(&mut self, len: usize, restored: Option<Block>) {
        self.chain.truncate(len.max(1));

        if let Some(block) = restored {
            let slot = usize::try_from(block.index)
                .ok()
                .and_then(|position| self.chain.get_mut(position));
            if let Some(slot) = slot {
                *slot = block;
            }
        }
    }

    pub fn latest_block(&self) -> &Block {
        // The chain always holds at least the genesis block
        &self.chain[self.chain.len() - 1]
    }

    /// Most recently appended block carrying `batch_id` (exact, case-sensitive)
    pub fn find_by_batch_id(&self, batch_id: &str) -> Option<&Block> {
        self.position_of(batch_id).map(|position| &self.chain[position])
    }

    fn position_of(&self, batch_id: &str) -> Option<usize> {
        self.chain
            .iter()
            .rposition(|block| block.data.batch_id == batch_id)
    }

    /// Every block carrying `batch_id`, oldest first
    pub fn history(&self, batch_id: &str) -> Vec<&Block> {
        self.chain
            .iter()
            .filter(|block| block.data.batch_id == batch_id)
            .collect()
    }

    /// Record a new version of a batch.
    ///
    /// `update` is shallow-merged over the latest version, keeping the
    /// original creation timestamp, and sealed as a new block. The replaced
    /// block is marked per the supersede policy. Returns `None` for unknown
    /// batch ids and for the genesis block.
    pub fn update_entry(&mut self, batch_id: &str, update: &EntryUpdate) -> Option<Block> {
        if batch_id == GENESIS_BATCH_ID {
            return None;
        }

        let position = self.position_of(batch_id)?;
        if position == 0 {
            return None;
        }

        let original = &self.chain[position].data;
        let mut merged = original.merged_with(update);
        merged.timestamp = original.timestamp.clone();

        let block = self.append(merged);

        let superseded = &mut self.chain[position];
        superseded.superseded_by = Some(block.index);
        if self.supersede_policy == SupersedePolicy::DemoteStatus {
            superseded.data.status = HerbStatus::Pending;
        }

        log::debug!(
            "Batch {} superseded: block {} replaced by block {}",
            batch_id,
            position,
            block.index
        );

        Some(block)
    }

    /// Every entry except genesis, oldest first
    pub fn list_entries(&self) -> Vec<HerbEntry> {
        self.chain
            .iter()
            .skip(1)
            .map(|block| block.data.clone())
            .collect()
    }

    /// Recompute each block's digest and check each link back to its
    /// predecessor, starting after genesis
    pub fn validate(&self) -> bool {
        for pair in self.chain.windows(2) {
            if let Err(issue) = self.check_block(&pair[0], &pair[1], false) {
                log::warn!("Chain validation failed: {}", issue);
                return false;
            }
        }
        true
    }

    /// Like `validate`, additionally checking proof-of-work, and reporting
    /// the first problem found
    pub fn verify(&self) -> Result<(), IntegrityIssue> {
        for pair in self.chain.windows(2) {
            self.check_block(&pair[0], &pair[1], true)?;
        }
        Ok(())
    }

    fn check_block(
        &self,
        previous: &Block,
        current: &Block,
        check_work: bool,
    ) -> Result<(), IntegrityIssue> {
        let computed = self.digest_of(current);
        if current.hash != computed {
            return Err(IntegrityIssue::HashMismatch {
                index: current.index,
                stored: current.hash.clone(),
                computed,
            });
        }

        if current.previous_hash != previous.hash {
            return Err(IntegrityIssue::BrokenLink {
                index: current.index,
            });
        }

        if check_work && !meets_difficulty(&current.hash, self.difficulty) {
            return Err(IntegrityIssue::ProofOfWorkUnmet {
                index: current.index,
                difficulty: self.difficulty,
            });
        }

        Ok(())
    }

    pub fn chain_info(&self) -> ChainInfo {
        ChainInfo {
            length: self.chain.len(),
            latest_block: self.latest_block().clone(),
            is_valid: self.validate(),
            difficulty: self.difficulty,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn block(&self, index: u64) -> Option<&Block> {
        usize::try_from(index)
            .ok()
            .and_then(|position| self.chain.get(position))
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Never true: genesis is always present
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn supersede_policy(&self) -> SupersedePolicy {
        self.supersede_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn entry(batch_id: &str) -> HerbEntry {
        HerbEntry {
            id: format!("id-{}", batch_id),
            herb_name: "Ashwagandha".to_string(),
            location: "Nagaur, Rajasthan".to_string(),
            farmer_id: "FARMER-7".to_string(),
            description: "Root harvest".to_string(),
            timestamp: "2024-03-01T10:00:00.000Z".to_string(),
            batch_id: batch_id.to_string(),
            status: HerbStatus::Pending,
            lab_notes: None,
            verification_date: None,
            lab_id: None,
            block_hash: None,
            previous_hash: None,
        }
    }

    fn verified_by_lab() -> EntryUpdate {
        EntryUpdate::new()
            .status(HerbStatus::Verified)
            .lab_id("LAB1")
    }

    #[test]
    fn test_new_ledger_holds_only_genesis() {
        let ledger = Ledger::new();
        assert_eq!(ledger.len(), 1);

        let genesis = ledger.latest_block();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, "0");
        assert_eq!(genesis.nonce, 0);
        assert_eq!(genesis.data.batch_id, GENESIS_BATCH_ID);
        assert_eq!(genesis.data.status, HerbStatus::Verified);
        assert_eq!(genesis.hash, ledger.digest_of(genesis));
        assert_eq!(genesis.data.previous_hash.as_deref(), Some("0"));
        assert_eq!(genesis.data.block_hash.as_deref(), Some(genesis.hash.as_str()));
        assert!(ledger.list_entries().is_empty());
        assert!(ledger.validate());
    }

    #[test]
    fn test_append_links_and_mines() {
        let mut ledger = Ledger::new();
        let genesis_hash = ledger.latest_block().hash.clone();

        let block = ledger.append(entry("AYU-1-A"));

        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, genesis_hash);
        assert!(block.hash.starts_with("00"));
        assert_eq!(block.data.block_hash.as_deref(), Some(block.hash.as_str()));
        assert_eq!(block.data.previous_hash.as_deref(), Some(genesis_hash.as_str()));
        assert_eq!(ledger.latest_block(), &block);
    }

    #[test]
    fn test_chain_stays_valid_across_appends() {
        let mut ledger = Ledger::new();
        for i in 0..10 {
            ledger.append(entry(&format!("AYU-{}", i)));
            assert!(ledger.validate());
            assert!(ledger.verify().is_ok());
        }

        for block in ledger.blocks().iter().skip(1) {
            assert!(block.hash.starts_with("00"));
        }
    }

    #[test]
    fn test_mining_is_deterministic() {
        let ledger = Ledger::new();
        let candidate = Block {
            index: 1,
            timestamp: "2024-03-01T10:00:00.000Z".to_string(),
            data: entry("AYU-1-A"),
            previous_hash: "00abcdef".to_string(),
            hash: String::new(),
            nonce: 0,
            superseded_by: None,
        };

        let first = ledger.mine(candidate.clone());
        let second = ledger.mine(candidate);
        assert_eq!(first.nonce, second.nonce);
        assert_eq!(first.hash, second.hash);
        assert!(first.hash.starts_with("00"));

        // No smaller nonce satisfies the target
        for nonce in 0..first.nonce {
            let mut attempt = first.clone();
            attempt.nonce = nonce;
            assert!(!ledger.digest_of(&attempt).starts_with("00"));
        }
    }

    #[test]
    fn test_zero_difficulty_accepts_first_nonce() {
        let config = LedgerConfig::default().with_difficulty(0);
        let mut ledger = Ledger::with_config(&config).unwrap();
        let block = ledger.append(entry("AYU-1-A"));
        assert_eq!(block.nonce, 0);
        assert!(ledger.validate());
    }

    #[test]
    fn test_default_digest_is_sha256() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.hash_algorithm(), HashAlgorithm::Sha256);
        let block = ledger.append(entry("AYU-1-A"));

        assert_eq!(block.hash.len(), 64);
        assert!(block.hash.starts_with("00"));
        assert!(ledger.verify().is_ok());
    }

    #[test]
    fn test_default_config_mines_quickly() {
        let mut ledger = Ledger::new();
        let started = Instant::now();
        for i in 0..20 {
            ledger.append(entry(&format!("AYU-{}", i)));
        }

        assert_eq!(ledger.len(), 21);
        assert!(ledger.verify().is_ok());
        assert!(
            started.elapsed() < Duration::from_secs(10),
            "mining 20 blocks took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn test_rolling_hash_ledger() {
        let config = LedgerConfig::default()
            .with_hash_algorithm(HashAlgorithm::Rolling32)
            .with_difficulty(0);
        let mut ledger = Ledger::with_config(&config).unwrap();
        let genesis = ledger.latest_block().clone();
        assert_eq!(genesis.hash, ledger.digest_of(&genesis));

        let block = ledger.append(entry("AYU-1-A"));
        assert_eq!(block.hash.len(), 8);
        assert_eq!(block.nonce, 0);
        assert!(ledger.verify().is_ok());
    }

    #[test]
    fn test_find_returns_latest_version() {
        let mut ledger = Ledger::new();
        ledger.append(entry("AYU-1-A"));
        ledger.append(entry("AYU-2-B"));
        ledger.append(entry("AYU-1-A"));

        assert_eq!(ledger.find_by_batch_id("AYU-1-A").unwrap().index, 3);
        assert_eq!(ledger.find_by_batch_id("AYU-2-B").unwrap().index, 2);
        assert!(ledger.find_by_batch_id("ayu-1-a").is_none());
        assert!(ledger.find_by_batch_id("AYU-9-Z").is_none());
        assert_eq!(ledger.history("AYU-1-A").len(), 2);
    }

    #[test]
    fn test_update_appends_new_version() {
        let mut ledger = Ledger::new();
        let original = ledger.append(entry("AYU-1-A"));

        let mut update = verified_by_lab();
        update.timestamp = Some("2030-01-01T00:00:00.000Z".to_string());
        update.verification_date = Some("2024-03-05T09:00:00.000Z".to_string());
        let updated = ledger.update_entry("AYU-1-A", &update).unwrap();

        assert_eq!(updated.index, 2);
        assert_eq!(updated.previous_hash, original.hash);
        assert_eq!(updated.data.status, HerbStatus::Verified);
        assert_eq!(updated.data.lab_id.as_deref(), Some("LAB1"));
        assert_eq!(updated.data.timestamp, original.data.timestamp);
        assert_eq!(
            updated.data.verification_date.as_deref(),
            Some("2024-03-05T09:00:00.000Z")
        );
        assert_eq!(updated.data.herb_name, original.data.herb_name);
        assert_eq!(ledger.find_by_batch_id("AYU-1-A").unwrap().index, 2);
    }

    #[test]
    fn test_update_flags_superseded_block_and_keeps_chain_valid() {
        let mut ledger = Ledger::new();
        ledger.append(entry("AYU-1-A"));
        ledger.update_entry("AYU-1-A", &verified_by_lab()).unwrap();

        let old = ledger.block(1).unwrap();
        assert_eq!(old.superseded_by, Some(2));
        assert_eq!(old.data.status, HerbStatus::Pending);
        assert!(!ledger.block(2).unwrap().is_superseded());
        assert!(ledger.validate());
    }

    #[test]
    fn test_demote_status_policy_invalidates_chain() {
        let config = LedgerConfig::default().with_supersede_policy(SupersedePolicy::DemoteStatus);
        let mut ledger = Ledger::with_config(&config).unwrap();
        ledger.append(entry("AYU-1-A"));
        ledger.update_entry("AYU-1-A", &verified_by_lab()).unwrap();
        ledger.update_entry("AYU-1-A", &EntryUpdate::new().lab_notes("recheck"));

        // Block 2 carried "verified" when it was sealed and is now demoted
        assert_eq!(ledger.block(2).unwrap().data.status, HerbStatus::Pending);
        assert!(!ledger.validate());
        assert!(matches!(
            ledger.verify(),
            Err(IntegrityIssue::HashMismatch { index: 2, .. })
        ));

        let latest = ledger.find_by_batch_id("AYU-1-A").unwrap();
        assert_eq!(latest.index, 3);
        assert_eq!(latest.data.status, HerbStatus::Verified);
    }

    #[test]
    fn test_update_unknown_batch_leaves_chain_unchanged() {
        let mut ledger = Ledger::new();
        ledger.append(entry("AYU-1-A"));

        assert!(ledger.update_entry("AYU-404", &verified_by_lab()).is_none());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_update_genesis_is_refused() {
        let mut ledger = Ledger::new();
        assert!(ledger
            .update_entry(GENESIS_BATCH_ID, &verified_by_lab())
            .is_none());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_tampering_is_detected() {
        let mut ledger = Ledger::new();
        ledger.append(entry("AYU-1-A"));
        ledger.append(entry("AYU-2-B"));

        let mut tampered = ledger.clone();
        tampered.chain[1].data.herb_name = "Brahmi".to_string();
        assert!(!tampered.validate());

        let mut relinked = ledger.clone();
        relinked.chain[2].previous_hash = "00000000".to_string();
        relinked.chain[2] = relinked.mine(relinked.chain[2].clone());
        assert!(!relinked.validate());
        assert_eq!(
            relinked.verify(),
            Err(IntegrityIssue::BrokenLink { index: 2 })
        );
    }

    #[test]
    fn test_verify_reports_unmined_block() {
        let mut ledger = Ledger::new();
        ledger.append(entry("AYU-1-A"));

        // Reseal block 1 at a nonce whose digest misses the target
        let mut lazy = ledger.chain[1].clone();
        loop {
            lazy.nonce += 1;
            lazy.hash = ledger.digest_of(&lazy);
            if !lazy.hash.starts_with("00") {
                break;
            }
        }
        ledger.chain[1] = lazy;

        assert!(ledger.validate());
        assert_eq!(
            ledger.verify(),
            Err(IntegrityIssue::ProofOfWorkUnmet {
                index: 1,
                difficulty: 2
            })
        );
    }

    #[test]
    fn test_try_append_guards() {
        let config = LedgerConfig::default().with_unique_batch_ids(true);
        let mut ledger = Ledger::with_config(&config).unwrap();

        assert!(ledger.try_append(entry("AYU-1-A")).is_ok());
        assert!(matches!(
            ledger.try_append(entry("AYU-1-A")),
            Err(LedgerError::Conflict(_))
        ));
        assert!(matches!(
            ledger.try_append(entry(GENESIS_BATCH_ID)),
            Err(LedgerError::Conflict(_))
        ));
        assert_eq!(ledger.len(), 2);

        let mut permissive = Ledger::new();
        permissive.try_append(entry("AYU-1-A")).unwrap();
        permissive.try_append(entry("AYU-1-A")).unwrap();
        assert_eq!(permissive.len(), 3);
    }

    #[test]
    fn test_replay_restores_supersede_tags() {
        let mut ledger = Ledger::new();
        ledger.append(entry("AYU-1-A"));
        ledger.update_entry("AYU-1-A", &verified_by_lab()).unwrap();

        let mut restored = Ledger::new();
        for persisted in ledger.list_entries() {
            restored.replay(persisted);
        }

        assert_eq!(restored.len(), ledger.len());
        assert_eq!(restored.block(1).unwrap().superseded_by, Some(2));
        assert_eq!(
            restored.find_by_batch_id("AYU-1-A").unwrap().data.status,
            HerbStatus::Verified
        );
        assert!(restored.validate());
    }

    #[test]
    fn test_revert_drops_block_and_restores_superseded() {
        let config = LedgerConfig::default().with_supersede_policy(SupersedePolicy::DemoteStatus);
        let mut ledger = Ledger::with_config(&config).unwrap();
        let mut sealed = entry("AYU-1-A");
        sealed.status = HerbStatus::Verified;
        ledger.append(sealed);
        assert!(ledger.validate());

        let len = ledger.len();
        let before = ledger.find_by_batch_id("AYU-1-A").cloned();
        ledger
            .update_entry("AYU-1-A", &EntryUpdate::new().lab_notes("recheck"))
            .unwrap();
        assert!(!ledger.validate());

        ledger.revert(len, before);
        assert_eq!(ledger.len(), 2);
        let restored = ledger.block(1).unwrap();
        assert!(!restored.is_superseded());
        assert_eq!(restored.data.status, HerbStatus::Verified);
        assert!(ledger.validate());

        ledger.revert(0, None);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_chain_info() {
        let mut ledger = Ledger::new();
        let block = ledger.append(entry("AYU-1-A"));

        let info = ledger.chain_info();
        assert_eq!(info.length, 2);
        assert_eq!(info.latest_block, block);
        assert!(info.is_valid);
        assert_eq!(info.difficulty, 2);
    }

    #[test]
    fn test_with_config_rejects_impossible_difficulty() {
        let config = LedgerConfig::default().with_difficulty(12);
        assert!(matches!(
            Ledger::with_config(&config),
            Err(LedgerError::Config(_))
        ));

        let config = LedgerConfig::default()
            .with_hash_algorithm(HashAlgorithm::Rolling32)
            .with_difficulty(2);
        assert!(matches!(
            Ledger::with_config(&config),
            Err(LedgerError::Config(_))
        ));
    }
}
