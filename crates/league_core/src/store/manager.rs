use super::error::StoreError;
use super::format::{decompress_and_deserialize, serialize_and_compress, LeagueDoc};
use super::migration::migrate_doc;

use std::fs::{remove_file, rename, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// File-backed document store, one document per league.
///
/// Single logical writer, last-write-wins at document granularity: a save
/// replaces the whole document, and two overlapping read-modify-write
/// sequences race with the later write winning in full. Accepted for a
/// low-concurrency, small-group tool; no locking or retry policy lives
/// here.
pub struct StoreManager {
    root: PathBuf,
}

impl StoreManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted in `leagues/` under the working directory.
    pub fn default_root() -> Self {
        let root =
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("leagues");
        Self::new(root)
    }

    /// Persist a league document. The timestamp is refreshed as part of the
    /// write.
    pub fn save_league(&self, league_id: &str, doc: &mut LeagueDoc) -> Result<(), StoreError> {
        let path = self.league_path(league_id)?;
        doc.update_timestamp();
        Self::save_to_path(&path, doc)?;

        log::info!("League '{}' saved", league_id);
        Ok(())
    }

    /// Load a league document, applying migrations as needed.
    pub fn load_league(&self, league_id: &str) -> Result<LeagueDoc, StoreError> {
        let path = self.league_path(league_id)?;
        let doc = Self::load_from_path(&path)?;

        log::info!("League '{}' loaded", league_id);
        Ok(doc)
    }

    pub fn league_exists(&self, league_id: &str) -> bool {
        self.league_path(league_id).map(|p| p.exists()).unwrap_or(false)
    }

    pub fn delete_league(&self, league_id: &str) -> Result<(), StoreError> {
        let path = self.league_path(league_id)?;
        if path.exists() {
            remove_file(&path)?;
            log::info!("Deleted league '{}'", league_id);
        }
        Ok(())
    }

    /// Summary metadata for a stored league, for listings.
    pub fn league_info(&self, league_id: &str) -> Result<Option<LeagueDocInfo>, StoreError> {
        let path = self.league_path(league_id)?;
        if !path.exists() {
            return Ok(None);
        }

        let doc = Self::load_from_path(&path)?;
        Ok(Some(LeagueDocInfo {
            league_id: league_id.to_string(),
            timestamp: doc.timestamp,
            version: doc.version,
            player_count: doc.league.set.players.len(),
            match_count: doc.league.set.match_history.len(),
        }))
    }

    // Private helper methods

    fn league_path(&self, league_id: &str) -> Result<PathBuf, StoreError> {
        Self::validate_league_id(league_id)?;
        Ok(self.root.join(format!("league_{}.dat", league_id)))
    }

    fn validate_league_id(league_id: &str) -> Result<(), StoreError> {
        let valid = !league_id.is_empty()
            && league_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidLeagueId { id: league_id.to_string() });
        }
        Ok(())
    }

    fn save_to_path(path: &Path, doc: &LeagueDoc) -> Result<(), StoreError> {
        // Ensure store directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Serialize and compress
        let data = serialize_and_compress(doc)?;

        // Atomic save: write to temp file, then rename
        let temp_path = path.with_extension("tmp");

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.flush()?;

            // sync_all ensures data is written to disk (portable fsync)
            file.sync_all()?;
        }

        // Atomic rename
        rename(&temp_path, path)?;

        log::debug!("Saved {} bytes to {:?}", data.len(), path);
        Ok(())
    }

    fn load_from_path(path: &Path) -> Result<LeagueDoc, StoreError> {
        if !path.exists() {
            return Err(StoreError::DocumentNotFound { path: path.display().to_string() });
        }

        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let mut doc = decompress_and_deserialize(&data)?;

        // Apply migrations if needed
        doc = migrate_doc(doc)?;

        log::debug!("Loaded {} bytes from {:?}", data.len(), path);
        Ok(doc)
    }
}

#[derive(Debug, Clone)]
pub struct LeagueDocInfo {
    pub league_id: String,
    pub timestamp: u64,
    pub version: u32,
    pub player_count: usize,
    pub match_count: usize,
}

impl LeagueDocInfo {
    pub fn format_timestamp(&self) -> String {
        use time::{format_description::well_known::Rfc3339, OffsetDateTime};

        let timestamp =
            OffsetDateTime::from_unix_timestamp_nanos((self.timestamp * 1_000_000) as i128)
                .unwrap_or_else(|_| OffsetDateTime::now_utc());

        timestamp.format(&Rfc3339).unwrap_or_else(|_| "Unknown".to_string())
    }

    pub fn get_display_text(&self) -> String {
        format!(
            "{}: {} players, {} matches",
            self.league_id, self.player_count, self.match_count
        )
    }
}
