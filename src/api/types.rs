use std::time::SystemTime;

use crate::store::{ObjectHandle, ObjectId, StoreError};

use super::unsupported::UnsupportedOp;

/// Adapter errors
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// `open` was called with a flag outside `{"r", "w", "w+"}`.
    #[error("Unsupported flag {0}")]
    UnsupportedMode(String),

    /// The operation has no mapping onto a flat object store.
    #[error("Operation not supported: {0}")]
    OperationNotSupported(UnsupportedOp),

    /// Error surfaced unmodified from the backing store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A seek issued to honor a `position` argument failed; the read or
    /// write it was guarding was never attempted.
    #[error("Seek failed: {0}")]
    Seek(#[source] StoreError),
}

pub type FsResult<T> = Result<T, FsError>;

/// Normalization of path arguments into the store's native identifier.
///
/// Everywhere a "path" is documented, both an [`ObjectId`] and its string
/// form are accepted; a string and the id it parses to resolve to the same
/// object. Malformed strings surface as [`StoreError::InvalidId`].
pub trait ToObjectId {
    fn to_object_id(&self) -> FsResult<ObjectId>;
}

impl ToObjectId for ObjectId {
    fn to_object_id(&self) -> FsResult<ObjectId> {
        Ok(*self)
    }
}

impl ToObjectId for &ObjectId {
    fn to_object_id(&self) -> FsResult<ObjectId> {
        Ok(**self)
    }
}

impl ToObjectId for &str {
    fn to_object_id(&self) -> FsResult<ObjectId> {
        Ok(self.parse()?)
    }
}

impl ToObjectId for String {
    fn to_object_id(&self) -> FsResult<ObjectId> {
        Ok(self.parse()?)
    }
}

/// Caller-supplied open options.
///
/// Honored on write-mode opens only; open-for-read forwards nothing but the
/// configured root, so a reader can never inject metadata.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// MIME type to record on the object.
    pub content_type: Option<String>,

    /// Free-form metadata document to record on the object.
    pub metadata: Option<serde_json::Value>,

    /// Chunk size override for the object.
    pub chunk_size: Option<usize>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }
}

/// Synthesized file metadata snapshot.
///
/// Derived from descriptor fields at the moment `stat`/`fstat` is called;
/// never cached. The store records a single upload timestamp, so all three
/// POSIX timestamps report it. OS-specific numeric fields have no meaning
/// in an object store and are fixed at zero.
#[derive(Debug, Clone)]
pub struct FileStat {
    pub size: u64,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    pub content_type: Option<String>,

    pub dev: u64,
    pub ino: u64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u64,
    pub blksize: u64,
    pub blocks: u64,
}

impl FileStat {
    pub(crate) fn from_handle<H: ObjectHandle>(fd: &H) -> Self {
        let uploaded = fd.upload_date();
        Self {
            size: fd.total_length(),
            atime: uploaded,
            mtime: uploaded,
            ctime: uploaded,
            content_type: fd.content_type().map(str::to_string),
            dev: 0,
            ino: 0,
            mode: 0,
            uid: 0,
            gid: 0,
            rdev: 0,
            blksize: 0,
            blocks: 0,
        }
    }

    /// Always `true`: every object is a regular file in this model.
    pub fn is_file(&self) -> bool {
        true
    }

    pub fn is_directory(&self) -> bool {
        false
    }

    pub fn is_symbolic_link(&self) -> bool {
        false
    }

    pub fn is_block_device(&self) -> bool {
        false
    }

    pub fn is_character_device(&self) -> bool {
        false
    }

    pub fn is_socket(&self) -> bool {
        false
    }

    pub fn is_fifo(&self) -> bool {
        false
    }
}
