//! Herb entry construction

use serde::Deserialize;
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// Prefix of generated batch ids
pub const BATCH_ID_PREFIX: &str = "AYU";

/// Generate a batch id of the form `AYU-<unix millis>-<6 uppercase base36 chars>`
pub fn generate_batch_id() -> String {
    const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    let mut bits = Uuid::new_v4().as_u128();
    let suffix: String = (0..6)
        .map(|_| {
            let digit = (bits % 36) as usize;
            bits /= 36;
            char::from(ALPHABET[digit])
        })
        .collect();

    format!(
        "{}-{}-{}",
        BATCH_ID_PREFIX,
        chrono::Utc::now().timestamp_millis(),
        suffix
    )
}

/// Builder for creating herb entries
pub struct HerbEntryBuilder {
    entry: HerbEntry,
}

impl HerbEntryBuilder {
    /// Start a pending entry with a fresh id and the current time
    pub fn new(herb_name: String, location: String, farmer_id: String) -> Self {
        Self {
            entry: HerbEntry::new(
                Uuid::new_v4().to_string(),
                herb_name,
                location,
                farmer_id,
                String::new(),
                generate_batch_id(),
            ),
        }
    }

    /// Use a caller-chosen batch id instead of a generated one
    pub fn batch_id(mut self, batch_id: String) -> Self {
        self.entry.batch_id = batch_id;
        self
    }

    pub fn description(mut self, description: String) -> Self {
        self.entry.description = description;
        self
    }

    pub fn id(mut self, id: String) -> Self {
        self.entry.id = id;
        self
    }

    pub fn timestamp(mut self, timestamp: String) -> Self {
        self.entry.timestamp = timestamp;
        self
    }

    pub fn status(mut self, status: HerbStatus) -> Self {
        self.entry.status = status;
        self
    }

    /// Build the entry, checking the required fields
    pub fn build(self) -> LedgerResult<HerbEntry> {
        DefaultHerbEntryValidator.validate_entry(&self.entry)?;
        Ok(self.entry)
    }
}

/// A farmer's submission, before the ledger assigns ids and timestamps
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHerb {
    pub herb_name: String,
    pub location: String,
    pub farmer_id: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Generated when absent
    #[serde(default)]
    pub batch_id: Option<String>,
}

impl NewHerb {
    pub fn new(herb_name: &str, location: &str, farmer_id: &str) -> Self {
        Self {
            herb_name: herb_name.to_string(),
            location: location.to_string(),
            farmer_id: farmer_id.to_string(),
            description: None,
            batch_id: None,
        }
    }

    pub fn with_batch_id(mut self, batch_id: &str) -> Self {
        self.batch_id = Some(batch_id.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Turn the submission into a pending entry
    pub fn into_entry(self) -> LedgerResult<HerbEntry> {
        let mut builder = HerbEntryBuilder::new(self.herb_name, self.location, self.farmer_id)
            .description(self.description.unwrap_or_default());

        if let Some(batch_id) = self.batch_id {
            builder = builder.batch_id(batch_id);
        }

        builder.build()
    }
}
