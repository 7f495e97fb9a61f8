//! Persistence: one compressed, checksummed document per league.

pub mod error;
pub mod format;
pub mod manager;
pub mod migration;

pub use error::StoreError;
pub use format::{decompress_and_deserialize, serialize_and_compress, LeagueDoc};
pub use manager::{LeagueDocInfo, StoreManager};
pub use migration::migrate_doc;

/// Current document format version.
pub const STORE_VERSION: u32 = 1;
