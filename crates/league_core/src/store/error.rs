use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    #[error("Decompression error")]
    Decompression,

    #[error("Corrupted data")]
    Corrupted,

    #[error("Checksum mismatch")]
    ChecksumMismatch,

    #[error("Version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Document not found: {path}")]
    DocumentNotFound { path: String },

    #[error("Invalid league id: {id}")]
    InvalidLeagueId { id: String },

    #[error("Document too large: {size} bytes")]
    DocumentTooLarge { size: usize },
}

impl StoreError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::Io(_) => true,
            StoreError::DocumentNotFound { .. } => true,
            StoreError::VersionMismatch { .. } => true, // Can try migration
            StoreError::InvalidLeagueId { .. } => false,
            StoreError::Corrupted => false,
            StoreError::ChecksumMismatch => false,
            _ => false,
        }
    }
}
