use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical lookup key for a player name.
///
/// All equality and map lookups in the core go through this type: the raw
/// display name is trimmed and lowercased once at the boundary, never ad hoc
/// at call sites. Display names are stored separately on the records and are
/// only changed by the explicit rename operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameKey(String);

impl NameKey {
    pub fn new(name: &str) -> Self {
        NameKey(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A blank or whitespace-only name produces an empty key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NameKey {
    fn from(name: &str) -> Self {
        NameKey::new(name)
    }
}

/// Case- and whitespace-insensitive name comparison.
pub fn same_player(a: &str, b: &str) -> bool {
    NameKey::new(a) == NameKey::new(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_trims_and_lowercases() {
        assert_eq!(NameKey::new("  Jordan  ").as_str(), "jordan");
        assert_eq!(NameKey::new("JORDAN"), NameKey::new("jordan"));
    }

    #[test]
    fn same_player_ignores_case_and_whitespace() {
        assert!(same_player("Alex ", " alex"));
        assert!(!same_player("Alex", "Alexa"));
    }

    #[test]
    fn blank_name_is_empty_key() {
        assert!(NameKey::new("   ").is_empty());
        assert!(!NameKey::new("a").is_empty());
    }
}
