//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::types::*;

/// Key-value blob store the registry persists the entry list to
///
/// This trait allows the ledger to survive restarts on any backend (browser
/// storage bridge, Redis, a file, in-memory, etc.) by implementing these
/// two methods.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Load the blob stored under `key`, if any
    async fn load(&self, key: &str) -> LedgerResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous blob
    async fn save(&mut self, key: &str, value: &str) -> LedgerResult<()>;
}

/// Trait for implementing custom herb entry validation rules
pub trait HerbEntryValidator: Send + Sync {
    /// Validate a new entry before it is sealed
    fn validate_entry(&self, entry: &HerbEntry) -> LedgerResult<()>;

    /// Validate a partial update before it is merged
    fn validate_update(&self, update: &EntryUpdate) -> LedgerResult<()>;
}

/// Default validator with the checks a submission form enforces
pub struct DefaultHerbEntryValidator;

impl HerbEntryValidator for DefaultHerbEntryValidator {
    fn validate_entry(&self, entry: &HerbEntry) -> LedgerResult<()> {
        let required = [
            ("herbName", &entry.herb_name),
            ("location", &entry.location),
            ("farmerId", &entry.farmer_id),
            ("batchId", &entry.batch_id),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(LedgerError::Validation(format!(
                    "Missing required field: {}",
                    field
                )));
            }
        }

        Ok(())
    }

    fn validate_update(&self, update: &EntryUpdate) -> LedgerResult<()> {
        if update.is_empty() {
            return Err(LedgerError::Validation(
                "Update must change at least one field".to_string(),
            ));
        }

        if let Some(ref batch_id) = update.batch_id {
            if batch_id.trim().is_empty() {
                return Err(LedgerError::Validation(
                    "Batch ID cannot be empty".to_string(),
                ));
            }
            if batch_id == GENESIS_BATCH_ID {
                return Err(LedgerError::Validation(format!(
                    "Batch ID '{}' is reserved",
                    GENESIS_BATCH_ID
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validator_requires_identifying_fields() {
        let mut entry = HerbEntry::new(
            "1".to_string(),
            "Neem".to_string(),
            "Coimbatore".to_string(),
            "F-2".to_string(),
            String::new(),
            "AYU-2".to_string(),
        );
        assert!(DefaultHerbEntryValidator.validate_entry(&entry).is_ok());

        entry.farmer_id = "  ".to_string();
        let err = DefaultHerbEntryValidator
            .validate_entry(&entry)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Missing required field: farmerId"
        );
    }

    #[test]
    fn test_default_validator_checks_updates() {
        let validator = DefaultHerbEntryValidator;
        assert!(validator.validate_update(&EntryUpdate::new()).is_err());
        assert!(validator
            .validate_update(&EntryUpdate::new().lab_id("LAB1"))
            .is_ok());

        let rename = EntryUpdate {
            batch_id: Some(GENESIS_BATCH_ID.to_string()),
            ..EntryUpdate::default()
        };
        assert!(validator.validate_update(&rename).is_err());
    }
}
