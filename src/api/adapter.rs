//! The path/descriptor adapter over the chunked object store.
//!
//! `ObjectFs` translates filesystem-shaped calls (open/read/write/close/
//! stat/readdir/unlink/streams) into calls against the backing
//! [`ObjectStore`] collaborator, enforces the positional I/O contract and
//! normalizes results back into the filesystem vocabulary. It holds no
//! mutable state and no locks; every operation is a delegation keyed by its
//! own arguments. A descriptor belongs to one logical operation at a time
//! from the caller's perspective; interleaved use of a single descriptor is
//! whatever the backing store makes of it.

use std::rc::Rc;

use tracing::instrument;

use crate::api::types::{FileStat, FsError, FsResult, OpenOptions, ToObjectId};
use crate::config::FsConfig;
use crate::store::{ObjectHandle, ObjectId, ObjectOptions, ObjectStore, OpenMode, DEFAULT_ROOT};

/// Filesystem-shaped view of a chunked object store.
///
/// Constructed once from a store handle, a namespace and a root; immutable
/// for its lifetime. Identifiers play the role of paths: there is no
/// directory tree, no permissions, no links and no rename, and the
/// operations that would need them fail uniformly (see the unsupported
/// matrix in [`super::unsupported`]).
pub struct ObjectFs<S: ObjectStore> {
    store: Rc<S>,
    namespace: String,
    root: String,
}

impl<S: ObjectStore> ObjectFs<S> {
    /// Create an adapter over `store`, scoping identifier resolution to
    /// `namespace` and `root`. A missing root falls back to the store
    /// default bucket.
    pub fn new(store: Rc<S>, namespace: impl Into<String>, root: Option<&str>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            root: root.unwrap_or(DEFAULT_ROOT).to_string(),
        }
    }

    /// Create an adapter from a loaded [`FsConfig`].
    pub fn from_config(store: Rc<S>, config: &FsConfig) -> Self {
        Self::new(store, config.namespace.clone(), Some(&config.root))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Merge caller options with the adapter's own scope into the
    /// store-facing options. Read-mode opens forward only the root: a
    /// reader can never inject metadata.
    fn store_options(&self, mode: OpenMode, options: Option<&OpenOptions>) -> ObjectOptions {
        let mut merged = ObjectOptions {
            root: self.root.clone(),
            ..Default::default()
        };
        if mode.allows_write() {
            if let Some(options) = options {
                merged.content_type = options.content_type.clone();
                merged.metadata = options.metadata.clone();
                merged.chunk_size = options.chunk_size;
            }
        }
        merged
    }

    async fn open_id(
        &self,
        id: &ObjectId,
        mode: OpenMode,
        options: Option<&OpenOptions>,
    ) -> FsResult<S::Handle> {
        let merged = self.store_options(mode, options);
        // The identifier's string form doubles as the object's label.
        let name = id.to_string();
        let fd = self
            .store
            .open(&self.namespace, id, &name, mode, merged)
            .await?;
        Ok(fd)
    }

    /// Open a descriptor to `path` with the given flag string.
    ///
    /// Only `"r"`, `"w"` and `"w+"` exist in this model; any other flag
    /// fails with [`FsError::UnsupportedMode`] before the store is touched.
    /// The returned descriptor is the store's own handle, unchanged; the
    /// adapter adds no buffering or wrapping state.
    pub async fn open(
        &self,
        path: impl ToObjectId,
        flags: &str,
        options: Option<OpenOptions>,
    ) -> FsResult<S::Handle> {
        let mode = OpenMode::parse(flags)
            .ok_or_else(|| FsError::UnsupportedMode(flags.to_string()))?;
        let id = path.to_object_id()?;
        tracing::debug!(id = %id, mode = %mode, "open");
        self.open_id(&id, mode, options.as_ref()).await
    }

    /// Close a descriptor. Consumes it: a closed descriptor cannot be used
    /// again.
    pub async fn close(&self, mut fd: S::Handle) -> FsResult<()> {
        fd.close().await?;
        Ok(())
    }

    /// Write `buf[offset..offset + length]` through `fd`.
    ///
    /// When `position` is given the descriptor seeks there first; a seek
    /// failure aborts the whole operation with [`FsError::Seek`] without
    /// attempting the write. Returns the requested length: the store does
    /// not report partial writes, and the adapter does not pretend
    /// otherwise. Writing through a read-mode descriptor fails inside the
    /// store and the error propagates unmodified.
    #[instrument(level = "trace", name = "objectfs_write", skip(self, fd, buf))]
    pub async fn write(
        &self,
        fd: &mut S::Handle,
        buf: &[u8],
        offset: usize,
        length: usize,
        position: Option<u64>,
    ) -> FsResult<usize> {
        if let Some(position) = position {
            fd.seek(position).await.map_err(FsError::Seek)?;
        }

        let start = offset.min(buf.len());
        let end = offset.saturating_add(length).min(buf.len());
        let data = &buf[start..end];
        fd.write(data).await?;
        Ok(data.len())
    }

    /// Read up to `length` bytes into `buf[offset..]` from `fd`.
    ///
    /// Same seek-first rule as [`ObjectFs::write`]. The requested length is
    /// clamped to the bytes remaining in the object: reading at or past the
    /// end is not an error, it returns `Ok(0)` without calling the store.
    /// Successive reads therefore tile the object's contents in order,
    /// terminating with a zero-length read.
    #[instrument(level = "trace", name = "objectfs_read", skip(self, fd, buf))]
    pub async fn read(
        &self,
        fd: &mut S::Handle,
        buf: &mut [u8],
        offset: usize,
        length: usize,
        position: Option<u64>,
    ) -> FsResult<usize> {
        if let Some(position) = position {
            fd.seek(position).await.map_err(FsError::Seek)?;
        }

        let remaining = fd.total_length().saturating_sub(fd.position()) as usize;
        let start = offset.min(buf.len());
        let end = offset.saturating_add(length).min(buf.len());
        let length = (end - start).min(remaining);
        if length == 0 {
            return Ok(0);
        }

        let n = fd.read(&mut buf[start..start + length]).await?;
        Ok(n)
    }

    /// Read everything from the descriptor's current position to the end of
    /// the object. This is the whole-contents read form `read_file` builds
    /// on.
    pub async fn read_remaining(&self, fd: &mut S::Handle) -> FsResult<Vec<u8>> {
        let data = fd.read_to_end().await?;
        Ok(data)
    }

    /// Synthesize a stat record from descriptor fields alone; no store
    /// round trip, nothing cached.
    pub fn fstat(&self, fd: &S::Handle) -> FsResult<FileStat> {
        Ok(FileStat::from_handle(fd))
    }

    /// Stat by identifier: open for read, fstat, close. Never a direct
    /// store query; any failing step's error propagates.
    pub async fn stat(&self, path: impl ToObjectId) -> FsResult<FileStat> {
        let id = path.to_object_id()?;
        let mut fd = self.open_id(&id, OpenMode::Read, None).await?;
        let stat = FileStat::from_handle(&fd);
        fd.close().await?;
        Ok(stat)
    }

    /// Read the entire contents of the object at `path`.
    ///
    /// The descriptor is closed even when the read fails; on that path the
    /// close is best-effort and the read error wins.
    pub async fn read_file(
        &self,
        path: impl ToObjectId,
        options: Option<OpenOptions>,
    ) -> FsResult<Vec<u8>> {
        let id = path.to_object_id()?;
        tracing::debug!(id = %id, "read_file");

        let mut fd = self.open_id(&id, OpenMode::Read, options.as_ref()).await?;
        let read = self.read_remaining(&mut fd).await;
        let closed = fd.close().await;

        let data = match read {
            Ok(data) => data,
            Err(err) => {
                if let Err(close_err) = closed {
                    tracing::warn!(id = %id, error = %close_err, "close failed after failed read");
                }
                return Err(err);
            }
        };
        closed?;
        Ok(data)
    }

    /// Write `data` as the complete contents of the object at `path`,
    /// replacing any existing content.
    pub async fn write_file(
        &self,
        path: impl ToObjectId,
        data: &[u8],
        options: Option<OpenOptions>,
    ) -> FsResult<()> {
        let id = path.to_object_id()?;
        tracing::debug!(id = %id, length = data.len(), "write_file");

        let mut fd = self.open_id(&id, OpenMode::Write, options.as_ref()).await?;
        let written = self.write(&mut fd, data, 0, data.len(), None).await;
        let closed = fd.close().await;

        if let Err(err) = written {
            if let Err(close_err) = closed {
                tracing::warn!(id = %id, error = %close_err, "close failed after failed write");
            }
            return Err(err);
        }
        closed?;
        Ok(())
    }

    /// Append `data` to the object at `path`, creating it if absent.
    ///
    /// Opens in `"w+"` mode and seeks to the current end before writing, so
    /// existing content is preserved. The seek rides the positional-write
    /// path: if it fails, nothing is written.
    pub async fn append_file(
        &self,
        path: impl ToObjectId,
        data: &[u8],
        options: Option<OpenOptions>,
    ) -> FsResult<()> {
        let id = path.to_object_id()?;
        tracing::debug!(id = %id, length = data.len(), "append_file");

        let mut fd = self.open_id(&id, OpenMode::Append, options.as_ref()).await?;
        let end = fd.total_length();
        let written = self.write(&mut fd, data, 0, data.len(), Some(end)).await;
        let closed = fd.close().await;

        if let Err(err) = written {
            if let Err(close_err) = closed {
                tracing::warn!(id = %id, error = %close_err, "close failed after failed append");
            }
            return Err(err);
        }
        closed?;
        Ok(())
    }

    /// Open the object at `path` for reading and return the store's native
    /// readable stream. Flow control, end-of-stream and error behavior are
    /// the store's own; the adapter performs no transformation.
    pub async fn create_read_stream(
        &self,
        path: impl ToObjectId,
        options: Option<OpenOptions>,
    ) -> FsResult<<S::Handle as ObjectHandle>::ReadStream> {
        let id = path.to_object_id()?;
        let fd = self.open_id(&id, OpenMode::Read, options.as_ref()).await?;
        Ok(fd.into_read_stream())
    }

    /// Open the object at `path` for writing and return the store's native
    /// writable stream. The object is committed by the stream's shutdown.
    pub async fn create_write_stream(
        &self,
        path: impl ToObjectId,
        options: Option<OpenOptions>,
    ) -> FsResult<<S::Handle as ObjectHandle>::WriteStream> {
        let id = path.to_object_id()?;
        let fd = self.open_id(&id, OpenMode::Write, options.as_ref()).await?;
        Ok(fd.into_write_stream())
    }

    /// Enumerate the identifiers of every object within the configured
    /// namespace and root. `path` is accepted for signature compatibility
    /// and ignored: there is no directory tree to descend.
    pub async fn read_dir(&self, path: Option<&str>) -> FsResult<Vec<String>> {
        let _ = path;
        let names = self.store.list(&self.namespace, &self.root).await?;
        Ok(names)
    }

    /// Delete the object at `path`. Deleting a missing object succeeds;
    /// delete is idempotent.
    pub async fn unlink(&self, path: impl ToObjectId) -> FsResult<()> {
        let id = path.to_object_id()?;
        tracing::debug!(id = %id, "unlink");
        self.store.delete(&self.namespace, &id, &self.root).await?;
        Ok(())
    }

    /// Whether an object exists at `path`. Absence is `Ok(false)`, never an
    /// error.
    pub async fn exists(&self, path: impl ToObjectId) -> FsResult<bool> {
        let id = path.to_object_id()?;
        let found = self.store.exists(&self.namespace, &id, &self.root).await?;
        Ok(found)
    }
}
