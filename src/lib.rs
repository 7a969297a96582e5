//! # Herb Ledger
//!
//! An append-only, hash-chained traceability ledger for herb batches.
//!
//! ## Features
//!
//! - **Hash chaining**: every block commits to its predecessor's hash
//! - **Proof-of-work sealing**: blocks are mined until their digest starts with
//!   a configurable number of zero hex digits
//! - **Updates by appending**: an edit seals a new version of the batch and marks
//!   the old block as superseded, history is never rewritten
//! - **Integrity checks**: recompute every digest and link on demand
//! - **Storage abstraction**: the entry list is persisted to any key-value blob
//!   store after each write and replayed on startup
//!
//! ## Quick Start
//!
//! ```rust
//! use herb_ledger::{EntryUpdate, HerbEntryBuilder, HerbStatus, Ledger};
//!
//! let mut ledger = Ledger::new();
//! let entry = HerbEntryBuilder::new(
//!     "Ashwagandha".to_string(),
//!     "Nagaur, Rajasthan".to_string(),
//!     "FARMER-7".to_string(),
//! )
//! .batch_id("AYU-1-A".to_string())
//! .build()
//! .unwrap();
//!
//! let block = ledger.append(entry);
//! assert!(block.hash.starts_with("00"));
//!
//! let update = EntryUpdate::new().status(HerbStatus::Verified).lab_id("LAB1");
//! let latest = ledger.update_entry("AYU-1-A", &update).unwrap();
//! assert_eq!(latest.index, 2);
//! assert!(ledger.validate());
//! ```

pub mod config;
pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use ledger::*;
pub use traits::*;
pub use types::*;
