//! The herb registry: the ledger's external interface and persistence

use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::ledger::{Ledger, NewHerb, TraceReport};
use crate::traits::*;
use crate::types::*;

/// A lab's verdict on a batch
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabVerification {
    pub status: HerbStatus,
    pub lab_id: String,
    #[serde(default)]
    pub lab_notes: Option<String>,
}

/// Chain snapshot together with the network it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    #[serde(flatten)]
    pub info: ChainInfo,
    pub network: String,
    pub consensus: String,
}

/// Owns one ledger and the store it is persisted to
///
/// Build one per process with [`HerbRegistry::open`], which rehydrates the
/// chain before the registry can serve anything. After every successful
/// write the full entry list is saved under the configured key.
pub struct HerbRegistry<S: EntryStore> {
    ledger: Ledger,
    store: S,
    validator: Box<dyn HerbEntryValidator>,
    config: LedgerConfig,
}

impl<S: EntryStore> HerbRegistry<S> {
    /// Open a registry, replaying any persisted entries
    pub async fn open(store: S, config: LedgerConfig) -> LedgerResult<Self> {
        Self::open_with_validator(store, config, Box::new(DefaultHerbEntryValidator)).await
    }

    /// Open a registry with a custom validator
    pub async fn open_with_validator(
        store: S,
        config: LedgerConfig,
        validator: Box<dyn HerbEntryValidator>,
    ) -> LedgerResult<Self> {
        let mut ledger = Ledger::with_config(&config)?;

        match store.load(&config.storage.key).await? {
            Some(blob) => {
                let entries: Vec<HerbEntry> = serde_json::from_str(&blob)?;
                let count = entries.len();
                for entry in entries {
                    ledger.replay(entry);
                }
                log::info!(
                    "Rehydrated {} entries from '{}' (chain length {})",
                    count,
                    config.storage.key,
                    ledger.len()
                );
            }
            None => {
                log::info!(
                    "No entries stored under '{}', starting from genesis",
                    config.storage.key
                );
            }
        }

        Ok(Self {
            ledger,
            store,
            validator,
            config,
        })
    }

    async fn persist(&mut self) -> LedgerResult<()> {
        let blob = serde_json::to_string(&self.ledger.list_entries())?;
        self.store.save(&self.config.storage.key, &blob).await
    }

    async fn seal(&mut self, entry: HerbEntry) -> LedgerResult<Block> {
        self.validator.validate_entry(&entry)?;

        if self.ledger.find_by_batch_id(&entry.batch_id).is_some() {
            log::warn!("Rejected submission for existing batch {}", entry.batch_id);
            return Err(LedgerError::Conflict(format!(
                "Batch ID '{}' already exists",
                entry.batch_id
            )));
        }

        let len = self.ledger.len();
        let block = self.ledger.try_append(entry)?;
        log::info!(
            "Recorded batch {} in block {} ({})",
            block.data.batch_id,
            block.index,
            block.hash
        );

        self.persist_or_revert(len, None).await?;
        Ok(block)
    }

    /// Save the entry list; on failure undo the write that preceded it so
    /// memory never holds a block the store does not
    async fn persist_or_revert(&mut self, len: usize, restored: Option<Block>) -> LedgerResult<()> {
        if let Err(e) = self.persist().await {
            log::error!(
                "Failed to persist entries, rolling back to chain length {}: {}",
                len,
                e
            );
            self.ledger.revert(len, restored);
            return Err(e);
        }
        Ok(())
    }

    /// Record a new herb entry
    pub async fn add_herb_entry(&mut self, entry: HerbEntry) -> LedgerResult<BlockReceipt> {
        let block = self.seal(entry).await?;
        Ok(block.receipt())
    }

    /// Record a farmer's submission, assigning id, timestamp and (if absent) batch id
    pub async fn submit_herb(&mut self, herb: NewHerb) -> LedgerResult<(HerbEntry, BlockReceipt)> {
        let entry = herb.into_entry()?;
        let block = self.seal(entry).await?;
        let receipt = block.receipt();
        Ok((block.data, receipt))
    }

    /// Record a new version of a batch; `Ok(None)` when the batch is unknown
    pub async fn update_herb_entry(
        &mut self,
        batch_id: &str,
        update: EntryUpdate,
    ) -> LedgerResult<Option<BlockReceipt>> {
        self.validator.validate_update(&update)?;

        if let Some(renamed) = update.batch_id.as_deref() {
            if renamed != batch_id && self.ledger.find_by_batch_id(renamed).is_some() {
                log::warn!("Rejected rename of {} onto existing batch {}", batch_id, renamed);
                return Err(LedgerError::Conflict(format!(
                    "Batch ID '{}' already exists",
                    renamed
                )));
            }
        }

        let len = self.ledger.len();
        let superseded = self.ledger.find_by_batch_id(batch_id).cloned();
        let block = match self.ledger.update_entry(batch_id, &update) {
            Some(block) => block,
            None => return Ok(None),
        };
        log::info!(
            "Updated batch {} in block {} (status {})",
            batch_id,
            block.index,
            block.data.status
        );

        self.persist_or_revert(len, superseded).await?;
        Ok(Some(block.receipt()))
    }

    /// Record a lab outcome, stamping the verification date with the current time
    pub async fn record_verification(
        &mut self,
        batch_id: &str,
        verification: LabVerification,
    ) -> LedgerResult<Option<BlockReceipt>> {
        let update = EntryUpdate {
            status: Some(verification.status),
            lab_id: Some(verification.lab_id),
            lab_notes: verification.lab_notes,
            verification_date: Some(iso_timestamp_now()),
            ..EntryUpdate::default()
        };

        self.update_herb_entry(batch_id, update).await
    }

    /// Latest version of a batch (exact batch id)
    pub fn get_herb_by_batch_id(&self, batch_id: &str) -> Option<HerbEntry> {
        self.ledger
            .find_by_batch_id(batch_id)
            .map(|block| block.data.clone())
    }

    /// Every recorded entry, oldest first, superseded versions included
    pub fn get_all_herbs(&self) -> Vec<HerbEntry> {
        self.ledger.list_entries()
    }

    pub fn get_blockchain_info(&self) -> ChainInfo {
        self.ledger.chain_info()
    }

    pub fn validate_blockchain(&self) -> bool {
        self.ledger.validate()
    }

    pub fn network_status(&self) -> NetworkStatus {
        NetworkStatus {
            info: self.ledger.chain_info(),
            network: self.config.network.name.clone(),
            consensus: self.config.network.consensus.clone(),
        }
    }

    /// Consumer lookup: batch id trimmed and matched case-insensitively
    pub fn trace(&self, batch_id: &str) -> Option<TraceReport> {
        let query = batch_id.trim();
        if query.is_empty() {
            return None;
        }

        let block = self
            .ledger
            .blocks()
            .iter()
            .skip(1)
            .rev()
            .find(|block| block.data.batch_id.eq_ignore_ascii_case(query))?;
        let versions = self.ledger.history(&block.data.batch_id).len();

        Some(TraceReport::new(block, versions))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}
