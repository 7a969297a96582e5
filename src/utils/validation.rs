//! Validation utilities

use crate::traits::*;
use crate::types::*;

/// Validate that a batch id is well formed
pub fn validate_batch_id(batch_id: &str) -> LedgerResult<()> {
    if batch_id.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Batch ID cannot be empty".to_string(),
        ));
    }

    if batch_id.len() > 64 {
        return Err(LedgerError::Validation(
            "Batch ID cannot exceed 64 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores)
    if !batch_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LedgerError::Validation(
            "Batch ID can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    if batch_id == GENESIS_BATCH_ID {
        return Err(LedgerError::Validation(format!(
            "Batch ID '{}' is reserved",
            GENESIS_BATCH_ID
        )));
    }

    Ok(())
}

/// Validate that a herb name is valid
pub fn validate_herb_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Herb name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "Herb name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a free-text description is valid
pub fn validate_description(description: &str) -> LedgerResult<()> {
    if description.len() > 500 {
        return Err(LedgerError::Validation(
            "Description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a timestamp is RFC 3339 / ISO-8601
pub fn validate_timestamp(field: &str, timestamp: &str) -> LedgerResult<()> {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|_| ())
        .map_err(|e| {
            LedgerError::Validation(format!(
                "{} '{}' is not an ISO-8601 timestamp: {}",
                field, timestamp, e
            ))
        })
}

/// Enhanced validator with format checks on top of the required fields
pub struct EnhancedHerbEntryValidator;

impl HerbEntryValidator for EnhancedHerbEntryValidator {
    fn validate_entry(&self, entry: &HerbEntry) -> LedgerResult<()> {
        // Basic validation
        DefaultHerbEntryValidator.validate_entry(entry)?;

        // Enhanced validations
        validate_batch_id(&entry.batch_id)?;
        validate_herb_name(&entry.herb_name)?;
        validate_description(&entry.description)?;
        validate_timestamp("timestamp", &entry.timestamp)?;

        if let Some(ref verification_date) = entry.verification_date {
            validate_timestamp("verificationDate", verification_date)?;
        }

        Ok(())
    }

    fn validate_update(&self, update: &EntryUpdate) -> LedgerResult<()> {
        DefaultHerbEntryValidator.validate_update(update)?;

        if let Some(ref batch_id) = update.batch_id {
            validate_batch_id(batch_id)?;
        }
        if let Some(ref herb_name) = update.herb_name {
            validate_herb_name(herb_name)?;
        }
        if let Some(ref description) = update.description {
            validate_description(description)?;
        }
        if let Some(ref verification_date) = update.verification_date {
            validate_timestamp("verificationDate", verification_date)?;
        }

        // A lab outcome must name the lab that reached it
        if update.status.is_some_and(|status| status.is_final()) && update.lab_id.is_none() {
            return Err(LedgerError::Validation(
                "A verified or rejected status requires a labId".to_string(),
            ));
        }

        Ok(())
    }
}
