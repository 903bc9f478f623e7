use thiserror::Error;

use super::id::{IdError, ObjectId};
use super::OpenMode;

/// Store collaborator errors
///
/// The adapter passes these through to callers unmodified; nothing in this
/// crate wraps or reinterprets a store failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(ObjectId),

    #[error("Invalid object id: {0}")]
    InvalidId(String),

    #[error("Descriptor opened '{mode}' does not allow '{required}' access")]
    InvalidMode { mode: OpenMode, required: OpenMode },

    #[error("Descriptor already closed: {0}")]
    Closed(ObjectId),

    #[error("Invalid position: {position} (object length: {length})")]
    InvalidPosition { position: u64, length: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Id generation failed: {0}")]
    IdGeneration(#[from] IdError),
}

pub type StoreResult<T> = Result<T, StoreError>;
