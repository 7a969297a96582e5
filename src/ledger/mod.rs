//! Ledger module containing the hash chain, entry construction and the registry

pub mod chain;
pub mod digest;
pub mod entry;
pub mod registry;
pub mod trace;

pub use chain::*;
pub use entry::*;
pub use registry::*;
pub use trace::*;
