pub mod error;
pub mod id;
pub mod memory;

pub use error::{StoreError, StoreResult};
pub use id::{IdError, IdGenerator, IdResult, ObjectId};
pub use memory::InMemoryObjectStore;

use async_trait::async_trait;
use std::fmt;
use std::time::SystemTime;
use tokio::io::{AsyncRead, AsyncWrite};

/// Default bucket for identifier resolution when none is configured.
pub const DEFAULT_ROOT: &str = "fs";

/// Mode a descriptor is opened with.
///
/// The mode is fixed at open time; the store tags each handle with it and
/// rejects mismatched operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// `"r"`: read an existing object.
    Read,
    /// `"w"`: create or truncate, then write.
    Write,
    /// `"w+"`: create or open preserving existing content; writable and
    /// seekable.
    Append,
}

impl OpenMode {
    /// Parse the filesystem-facing flag string. Only `"r"`, `"w"` and
    /// `"w+"` exist in this model.
    pub fn parse(flags: &str) -> Option<Self> {
        match flags {
            "r" => Some(Self::Read),
            "w" => Some(Self::Write),
            "w+" => Some(Self::Append),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "r",
            Self::Write => "w",
            Self::Append => "w+",
        }
    }

    pub fn allows_read(&self) -> bool {
        matches!(self, Self::Read)
    }

    pub fn allows_write(&self) -> bool {
        matches!(self, Self::Write | Self::Append)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store-facing open options.
///
/// Assembled by the adapter: the root always comes from the adapter's own
/// configuration, the remaining fields from caller-supplied
/// [`OpenOptions`](crate::api::OpenOptions) on write-mode opens only.
#[derive(Debug, Clone, Default)]
pub struct ObjectOptions {
    /// Bucket within the namespace that scopes identifier resolution.
    pub root: String,

    /// MIME type recorded on the object.
    pub content_type: Option<String>,

    /// Free-form metadata document recorded on the object.
    pub metadata: Option<serde_json::Value>,

    /// Chunk size override for newly created objects.
    pub chunk_size: Option<usize>,
}

/// Backing object store collaborator.
///
/// One implementation ships with the crate ([`InMemoryObjectStore`]); remote
/// stores plug in through the same trait. Contract every implementation must
/// uphold:
/// - handles are tagged with their open mode; mode-mismatched reads and
///   writes fail with [`StoreError::InvalidMode`] (the adapter performs no
///   client-side mode tracking),
/// - operations on a closed handle fail with [`StoreError::Closed`],
/// - [`ObjectStore::delete`] of a missing id succeeds.
#[async_trait(?Send)]
pub trait ObjectStore {
    /// Descriptor type returned by [`ObjectStore::open`].
    type Handle: ObjectHandle + 'static;

    /// Open a handle to object `id` within `namespace`, creating it
    /// according to `mode`. `name` is the human-readable label stored with
    /// the object.
    async fn open(
        &self,
        namespace: &str,
        id: &ObjectId,
        name: &str,
        mode: OpenMode,
        options: ObjectOptions,
    ) -> StoreResult<Self::Handle>;

    /// Whether `id` exists within `(namespace, root)`. Absence is a `false`
    /// result, not a failure.
    async fn exists(&self, namespace: &str, id: &ObjectId, root: &str) -> StoreResult<bool>;

    /// Enumerate the identifiers of every object within `(namespace, root)`.
    async fn list(&self, namespace: &str, root: &str) -> StoreResult<Vec<String>>;

    /// Delete `id` from `(namespace, root)`. Idempotent: deleting a missing
    /// id succeeds.
    async fn delete(&self, namespace: &str, id: &ObjectId, root: &str) -> StoreResult<()>;
}

/// Open descriptor for one object in the store.
///
/// Reads and writes are sequential from the current position; `seek` moves
/// it. The handle knows its open mode, total length, position and upload
/// timestamp, which the adapter uses to synthesize stat records and clamp
/// reads without extra store round trips.
#[async_trait(?Send)]
pub trait ObjectHandle {
    /// Native readable stream over the object's content.
    type ReadStream: AsyncRead + Unpin;
    /// Native writable stream committing the object on shutdown.
    type WriteStream: AsyncWrite + Unpin;

    fn id(&self) -> &ObjectId;
    fn mode(&self) -> OpenMode;
    fn total_length(&self) -> u64;
    fn position(&self) -> u64;
    fn upload_date(&self) -> SystemTime;
    fn content_type(&self) -> Option<&str>;

    /// Read exactly `buf.len()` bytes from the current position, or fewer
    /// only at end of object. Advances the position by the count returned.
    async fn read(&mut self, buf: &mut [u8]) -> StoreResult<usize>;

    /// Read everything from the current position to the end of the object.
    async fn read_to_end(&mut self) -> StoreResult<Vec<u8>>;

    /// Write `data` at the current position, advancing it.
    async fn write(&mut self, data: &[u8]) -> StoreResult<()>;

    /// Move the current position. Returns the new position.
    async fn seek(&mut self, position: u64) -> StoreResult<u64>;

    /// Close the descriptor. Write-mode handles commit their content here.
    async fn close(&mut self) -> StoreResult<()>;

    /// Consume the handle into the store's native readable stream.
    fn into_read_stream(self) -> Self::ReadStream
    where
        Self: Sized;

    /// Consume the handle into the store's native writable stream.
    fn into_write_stream(self) -> Self::WriteStream
    where
        Self: Sized;
}
