use super::entry::{ActionDetails, ActionKind, Actor, LedgerEntry};
use serde::{Deserialize, Serialize};

/// Append-only record of mutating actions.
///
/// Entries are appended in action order and removed only when a reversal
/// consumes them; the reversal then appends its own non-undoable
/// `log_deleted` entry, so the record of record-keeping is itself kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    entries: Vec<LedgerEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds and appends an entry for an action, returning a reference to
    /// the stored entry.
    pub fn record(
        &mut self,
        action: ActionKind,
        details: ActionDetails,
        actor: &Actor,
    ) -> &LedgerEntry {
        self.entries.push(LedgerEntry::new(action, details, actor));
        self.entries.last().expect("entry was just pushed")
    }

    pub fn get(&self, id: &str) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Removes and returns the entry with the given id. Used by the
    /// reversal dispatcher to consume an entry on success.
    pub fn take(&mut self, id: &str) -> Option<LedgerEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(idx))
    }

    /// Entries in append (chronological) order.
    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    /// Entries newest first, the order the activity screen shows them.
    pub fn iter_recent_first(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().rev()
    }

    pub fn last(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
