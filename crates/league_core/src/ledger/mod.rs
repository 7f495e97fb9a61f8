//! Append-only activity ledger with compensating reversal.

pub mod entry;
pub mod log;
pub mod reversal;

pub use entry::{ActionDetails, ActionKind, Actor, LedgerEntry};
pub use log::ActivityLog;
pub use reversal::{reverse_entry, ReversalOutcome};
