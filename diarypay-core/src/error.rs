//! Error types for diarypay-core

use crate::types::RecordId;
use thiserror::Error;

/// Main error type for the diarypay-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Amount text that is not a canonical decimal
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    /// Record store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Attachment error
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

/// Errors from the record store and repository.
///
/// Failures while *opening* the store never surface as this type past
/// [`StoreHandle::load`](crate::db::StoreHandle::load); they are absorbed by the
/// recovery cascade.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A mutation or commit could not be written
    #[error("write failed: {0}")]
    WriteFailed(#[source] rusqlite::Error),

    /// Update target does not exist
    #[error("record not found: {0}")]
    NotFound(RecordId),

    /// The handle was used before `load()` established a connection
    #[error("store has not been loaded")]
    NotLoaded,

    /// Read-path database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The file's schema cannot be reconciled with this version
    #[error("incompatible store: {0}")]
    Incompatible(String),

    /// Integrity check failed
    #[error("corrupt store: {0}")]
    Corrupt(String),

    /// Tag list could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error while preparing the backing file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from [`AttachmentStore::save`](crate::attachments::AttachmentStore::save).
#[derive(Error, Debug)]
pub enum AttachmentError {
    /// Input could not be decoded or encoded in the target format
    #[error("could not encode attachment: {0}")]
    EncodeFailed(#[from] image::ImageError),

    /// Blob could not be written to disk
    #[error("could not write attachment: {0}")]
    WriteFailed(#[from] std::io::Error),
}

/// Result type alias for diarypay-core
pub type Result<T> = std::result::Result<T, Error>;
