use super::error::StoreError;
use super::STORE_VERSION;
use crate::league::League;
use serde::{Deserialize, Serialize};

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use time::OffsetDateTime;

/// Upper bounds applied before serialization; a document past these is a
/// sign of corruption, not of a big league.
const MAX_PLAYERS: usize = 1000;
const MAX_LOG_ENTRIES: usize = 10_000;

/// One persisted league: the mutable set document and its activity log in
/// a single document, so a rename or reversal never spans documents.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LeagueDoc {
    /// Document format version for migration.
    pub version: u32,

    /// Write timestamp (unix milliseconds).
    pub timestamp: u64,

    pub league: League,
}

impl Default for LeagueDoc {
    fn default() -> Self {
        Self::new()
    }
}

impl LeagueDoc {
    pub fn new() -> Self {
        Self { version: STORE_VERSION, timestamp: current_timestamp(), league: League::new() }
    }

    pub fn from_league(league: League) -> Self {
        Self { version: STORE_VERSION, timestamp: current_timestamp(), league }
    }

    pub fn update_timestamp(&mut self) {
        self.timestamp = current_timestamp();
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.league.set.players.len() > MAX_PLAYERS {
            return Err(StoreError::DocumentTooLarge { size: self.league.set.players.len() });
        }
        if self.league.log.len() > MAX_LOG_ENTRIES {
            return Err(StoreError::DocumentTooLarge { size: self.league.log.len() });
        }

        // Two players sharing a canonical key can never be addressed.
        let mut keys = HashSet::new();
        for player in &self.league.set.players {
            if !keys.insert(player.key()) {
                return Err(StoreError::Corrupted);
            }
        }

        Ok(())
    }
}

/// Serialize and compress a league document.
pub fn serialize_and_compress(doc: &LeagueDoc) -> Result<Vec<u8>, StoreError> {
    // Validate before serialization
    doc.validate()?;

    // 1. Serialize to MessagePack with field names
    let msgpack = to_vec_named(doc)?;

    // 2. Compress with LZ4 (size prepended for easy decompression)
    let compressed = compress_prepend_size(&msgpack);

    // 3. Add SHA256 checksum at the end
    let mut hasher = Sha256::new();
    hasher.update(&compressed);
    let checksum = hasher.finalize();

    let mut result = compressed;
    result.extend_from_slice(&checksum);

    Ok(result)
}

/// Decompress and deserialize a league document.
pub fn decompress_and_deserialize(bytes: &[u8]) -> Result<LeagueDoc, StoreError> {
    // Check minimum size (header + checksum)
    if bytes.len() < 4 + 32 {
        return Err(StoreError::Corrupted);
    }

    // Split payload and checksum
    let (payload, checksum_bytes) = bytes.split_at(bytes.len() - 32);

    // Verify checksum
    let mut hasher = Sha256::new();
    hasher.update(payload);
    let calculated_checksum = hasher.finalize();

    if &calculated_checksum[..] != checksum_bytes {
        return Err(StoreError::ChecksumMismatch);
    }

    // Decompress
    let msgpack =
        decompress_size_prepended(payload).map_err(|_| StoreError::Decompression)?;

    // Deserialize
    let doc: LeagueDoc = from_slice(&msgpack)?;

    // Validate version
    if doc.version > STORE_VERSION {
        return Err(StoreError::VersionMismatch { found: doc.version, expected: STORE_VERSION });
    }

    Ok(doc)
}

pub fn current_timestamp() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}
