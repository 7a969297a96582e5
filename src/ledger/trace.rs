//! Consumer-facing journey of a herb batch

use serde::Serialize;

use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Completed,
    Current,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyStep {
    pub step: u8,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub state: StepState,
}

/// What a consumer sees after looking up a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceReport {
    /// Latest version of the entry
    pub entry: HerbEntry,
    /// Block holding the latest version
    pub block_index: u64,
    pub block_hash: String,
    /// Number of blocks recorded for this batch, including the latest
    pub versions: usize,
    pub journey: Vec<JourneyStep>,
}

impl TraceReport {
    pub(crate) fn new(block: &Block, versions: usize) -> Self {
        Self {
            entry: block.data.clone(),
            block_index: block.index,
            block_hash: block.hash.clone(),
            versions,
            journey: journey_for(&block.data),
        }
    }

    pub fn is_consumer_ready(&self) -> bool {
        self.entry.status == HerbStatus::Verified
    }
}

/// Farm registration, then lab verification, then consumer readiness
pub fn journey_for(entry: &HerbEntry) -> Vec<JourneyStep> {
    let lab = entry.lab_id.as_deref().unwrap_or("Unknown");

    let registration = JourneyStep {
        step: 1,
        title: "Farm Registration".to_string(),
        description: format!(
            "Registered by farmer {} at {}",
            entry.farmer_id, entry.location
        ),
        date: Some(entry.timestamp.clone()),
        state: StepState::Completed,
    };

    let verification = JourneyStep {
        step: 2,
        title: "Lab Verification".to_string(),
        description: match entry.status {
            HerbStatus::Pending => "Awaiting lab verification and quality testing".to_string(),
            HerbStatus::Verified => format!("Verified by lab {} - Quality approved", lab),
            HerbStatus::Rejected => format!("Rejected by lab {} - Quality issues found", lab),
        },
        date: entry.verification_date.clone(),
        state: if entry.status == HerbStatus::Pending {
            StepState::Current
        } else {
            StepState::Completed
        },
    };

    let readiness = JourneyStep {
        step: 3,
        title: "Consumer Ready".to_string(),
        description: match entry.status {
            HerbStatus::Verified => "Herb is verified and ready for consumption",
            HerbStatus::Rejected => "Herb failed verification - not recommended for consumption",
            HerbStatus::Pending => "Pending lab verification completion",
        }
        .to_string(),
        date: match entry.status {
            HerbStatus::Verified => entry.verification_date.clone(),
            _ => None,
        },
        state: if entry.status == HerbStatus::Verified {
            StepState::Completed
        } else {
            StepState::Pending
        },
    };

    vec![registration, verification, readiness]
}
