use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::SystemTime;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::{ObjectHandle, ObjectId, ObjectOptions, ObjectStore, OpenMode};
use super::{StoreError, StoreResult};

/// Key of one bucket: `(namespace, root)`.
type BucketKey = (String, String);

/// One object at rest: fixed-size chunks plus descriptive fields.
///
/// Every chunk except the last is exactly `chunk_size` bytes; the last holds
/// the tail. `length` is the object's logical size in bytes.
#[derive(Debug, Clone)]
struct StoredObject {
    name: String,
    chunks: Vec<Vec<u8>>,
    length: u64,
    chunk_size: usize,
    upload_date: SystemTime,
    content_type: Option<String>,
    metadata: Option<serde_json::Value>,
}

impl StoredObject {
    fn empty(name: &str, chunk_size: usize, options: &ObjectOptions) -> Self {
        Self {
            name: name.to_string(),
            chunks: Vec::new(),
            length: 0,
            chunk_size,
            upload_date: SystemTime::now(),
            content_type: options.content_type.clone(),
            metadata: options.metadata.clone(),
        }
    }
}

/// Grow `chunks` so that byte `end - 1` is addressable, zero-filling any
/// newly covered range. Chunks before the last needed one become full-size.
fn grow_chunks(chunks: &mut Vec<Vec<u8>>, chunk_size: usize, end: usize) {
    if end == 0 {
        return;
    }
    let needed = (end + chunk_size - 1) / chunk_size;
    while chunks.len() < needed {
        chunks.push(Vec::new());
    }
    for chunk in chunks.iter_mut().take(needed - 1) {
        if chunk.len() < chunk_size {
            chunk.resize(chunk_size, 0);
        }
    }
    let tail = end - (needed - 1) * chunk_size;
    let last = &mut chunks[needed - 1];
    if last.len() < tail {
        last.resize(tail, 0);
    }
}

/// Copy `data` into the chunk list at absolute offset `at`, growing and
/// zero-filling as needed. Returns the end offset of the write.
fn copy_into_chunks(chunks: &mut Vec<Vec<u8>>, chunk_size: usize, at: u64, data: &[u8]) -> u64 {
    if data.is_empty() {
        return at;
    }
    let end = at as usize + data.len();
    grow_chunks(chunks, chunk_size, end);

    let mut copied = 0;
    while copied < data.len() {
        let abs = at as usize + copied;
        let index = abs / chunk_size;
        let offset = abs % chunk_size;
        let take = (chunk_size - offset).min(data.len() - copied);
        chunks[index][offset..offset + take].copy_from_slice(&data[copied..copied + take]);
        copied += take;
    }
    end as u64
}

/// Copy `out.len()` bytes out of the chunk list starting at absolute offset
/// `at`. The caller guarantees the range lies within the object.
fn copy_from_chunks(chunks: &[Vec<u8>], chunk_size: usize, at: u64, out: &mut [u8]) {
    let mut copied = 0;
    while copied < out.len() {
        let abs = at as usize + copied;
        let index = abs / chunk_size;
        let offset = abs % chunk_size;
        let chunk = &chunks[index];
        let take = (chunk.len() - offset).min(out.len() - copied);
        out[copied..copied + take].copy_from_slice(&chunk[offset..offset + take]);
        copied += take;
    }
}

#[derive(Debug)]
struct StoreInner {
    default_chunk_size: usize,
    buckets: RefCell<HashMap<BucketKey, HashMap<ObjectId, StoredObject>>>,
}

/// In-memory chunked object store.
///
/// Reference implementation of the [`ObjectStore`] collaborator contract,
/// used by the test suites and by callers who want an in-process store.
/// Objects are held as fixed-size chunks per `(namespace, root)` bucket.
/// Write-mode handles work on a private copy and commit on close, so a
/// failed or abandoned write never leaves a half-written object behind.
#[derive(Debug, Clone)]
pub struct InMemoryObjectStore {
    inner: Rc<StoreInner>,
}

impl InMemoryObjectStore {
    /// Create a store with the default chunk size.
    pub fn new() -> Self {
        Self::with_chunk_size(crate::config::defaults::CHUNK_SIZE)
    }

    /// Create a store with a custom default chunk size for new objects.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                default_chunk_size: chunk_size,
                buckets: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Create a store configured from [`FsConfig`](crate::config::FsConfig).
    pub fn from_config(config: &crate::config::FsConfig) -> Self {
        Self::with_chunk_size(config.chunk_size)
    }

    /// Number of objects within `(namespace, root)`.
    pub fn object_count(&self, namespace: &str, root: &str) -> usize {
        self.inner
            .buckets
            .borrow()
            .get(&(namespace.to_string(), root.to_string()))
            .map(|bucket| bucket.len())
            .unwrap_or(0)
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait(?Send)]
impl ObjectStore for InMemoryObjectStore {
    type Handle = MemoryHandle;

    async fn open(
        &self,
        namespace: &str,
        id: &ObjectId,
        name: &str,
        mode: OpenMode,
        options: ObjectOptions,
    ) -> StoreResult<MemoryHandle> {
        let chunk_size = options.chunk_size.unwrap_or(self.inner.default_chunk_size);
        let bucket = (namespace.to_string(), options.root.clone());

        let existing = self
            .inner
            .buckets
            .borrow()
            .get(&bucket)
            .and_then(|objects| objects.get(id))
            .cloned();

        let object = match mode {
            OpenMode::Read => existing.ok_or(StoreError::NotFound(*id))?,
            OpenMode::Write => StoredObject::empty(name, chunk_size, &options),
            OpenMode::Append => match existing {
                Some(mut object) => {
                    if options.content_type.is_some() {
                        object.content_type = options.content_type.clone();
                    }
                    if options.metadata.is_some() {
                        object.metadata = options.metadata.clone();
                    }
                    object
                }
                None => StoredObject::empty(name, chunk_size, &options),
            },
        };

        tracing::trace!(id = %id, mode = %mode, length = object.length, "opened memory object");

        Ok(MemoryHandle {
            inner: self.inner.clone(),
            bucket,
            id: *id,
            mode,
            object,
            position: 0,
            closed: false,
        })
    }

    async fn exists(&self, namespace: &str, id: &ObjectId, root: &str) -> StoreResult<bool> {
        let bucket = (namespace.to_string(), root.to_string());
        Ok(self
            .inner
            .buckets
            .borrow()
            .get(&bucket)
            .is_some_and(|objects| objects.contains_key(id)))
    }

    async fn list(&self, namespace: &str, root: &str) -> StoreResult<Vec<String>> {
        let bucket = (namespace.to_string(), root.to_string());
        let mut names: Vec<String> = self
            .inner
            .buckets
            .borrow()
            .get(&bucket)
            .map(|objects| objects.keys().map(ObjectId::to_string).collect())
            .unwrap_or_default();
        names.sort_unstable();
        Ok(names)
    }

    async fn delete(&self, namespace: &str, id: &ObjectId, root: &str) -> StoreResult<()> {
        let bucket = (namespace.to_string(), root.to_string());
        let removed = self
            .inner
            .buckets
            .borrow_mut()
            .get_mut(&bucket)
            .and_then(|objects| objects.remove(id));

        tracing::debug!(id = %id, existed = removed.is_some(), "deleted memory object");
        Ok(())
    }
}

/// Open descriptor over one in-memory object.
///
/// Read handles work on a snapshot taken at open time; write handles work on
/// a private copy committed back into the bucket on close.
#[derive(Debug)]
pub struct MemoryHandle {
    inner: Rc<StoreInner>,
    bucket: BucketKey,
    id: ObjectId,
    mode: OpenMode,
    object: StoredObject,
    position: u64,
    closed: bool,
}

impl MemoryHandle {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed {
            Err(StoreError::Closed(self.id))
        } else {
            Ok(())
        }
    }

    /// Human-readable label recorded at open time. The adapter always
    /// passes the identifier's string form, so label and id coincide.
    pub fn name(&self) -> &str {
        &self.object.name
    }

    /// Free-form metadata recorded on the object, if any.
    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.object.metadata.as_ref()
    }

    pub async fn read(&mut self, buf: &mut [u8]) -> StoreResult<usize> {
        self.ensure_open()?;
        if !self.mode.allows_read() {
            return Err(StoreError::InvalidMode {
                mode: self.mode,
                required: OpenMode::Read,
            });
        }

        let remaining = self.object.length.saturating_sub(self.position) as usize;
        let n = buf.len().min(remaining);
        if n > 0 {
            copy_from_chunks(
                &self.object.chunks,
                self.object.chunk_size,
                self.position,
                &mut buf[..n],
            );
            self.position += n as u64;
        }
        Ok(n)
    }

    pub async fn read_to_end(&mut self) -> StoreResult<Vec<u8>> {
        self.ensure_open()?;
        if !self.mode.allows_read() {
            return Err(StoreError::InvalidMode {
                mode: self.mode,
                required: OpenMode::Read,
            });
        }

        let remaining = self.object.length.saturating_sub(self.position) as usize;
        let mut out = vec![0u8; remaining];
        if remaining > 0 {
            copy_from_chunks(
                &self.object.chunks,
                self.object.chunk_size,
                self.position,
                &mut out,
            );
            self.position = self.object.length;
        }
        Ok(out)
    }

    pub async fn write(&mut self, data: &[u8]) -> StoreResult<()> {
        self.ensure_open()?;
        if !self.mode.allows_write() {
            return Err(StoreError::InvalidMode {
                mode: self.mode,
                required: OpenMode::Write,
            });
        }

        if !data.is_empty() {
            let end = copy_into_chunks(
                &mut self.object.chunks,
                self.object.chunk_size,
                self.position,
                data,
            );
            self.position = end;
            if end > self.object.length {
                self.object.length = end;
            }
        }
        Ok(())
    }

    pub async fn seek(&mut self, position: u64) -> StoreResult<u64> {
        self.ensure_open()?;
        // Read handles cannot leave the object; write handles may seek past
        // the end, with writes zero-filling the gap.
        if self.mode == OpenMode::Read && position > self.object.length {
            return Err(StoreError::InvalidPosition {
                position,
                length: self.object.length,
            });
        }
        self.position = position;
        Ok(position)
    }

    pub async fn close(&mut self) -> StoreResult<()> {
        self.ensure_open()?;
        self.closed = true;

        if self.mode.allows_write() {
            self.object.upload_date = SystemTime::now();
            let mut buckets = self.inner.buckets.borrow_mut();
            let bucket = buckets.entry(self.bucket.clone()).or_default();
            bucket.insert(self.id, self.object.clone());
            tracing::debug!(id = %self.id, length = self.object.length, "committed memory object");
        }
        Ok(())
    }
}

#[async_trait::async_trait(?Send)]
impl ObjectHandle for MemoryHandle {
    type ReadStream = MemoryReadStream;
    type WriteStream = MemoryWriteStream;

    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn total_length(&self) -> u64 {
        self.object.length
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn upload_date(&self) -> SystemTime {
        self.object.upload_date
    }

    fn content_type(&self) -> Option<&str> {
        self.object.content_type.as_deref()
    }

    async fn read(&mut self, buf: &mut [u8]) -> StoreResult<usize> {
        self.read(buf).await
    }

    async fn read_to_end(&mut self) -> StoreResult<Vec<u8>> {
        self.read_to_end().await
    }

    async fn write(&mut self, data: &[u8]) -> StoreResult<()> {
        self.write(data).await
    }

    async fn seek(&mut self, position: u64) -> StoreResult<u64> {
        self.seek(position).await
    }

    async fn close(&mut self) -> StoreResult<()> {
        self.close().await
    }

    fn into_read_stream(self) -> MemoryReadStream {
        MemoryReadStream {
            object: self.object,
            position: self.position,
        }
    }

    fn into_write_stream(self) -> MemoryWriteStream {
        MemoryWriteStream {
            inner: self.inner,
            bucket: self.bucket,
            id: self.id,
            object: self.object,
            committed: false,
        }
    }
}

/// Native readable stream over one object snapshot.
#[derive(Debug)]
pub struct MemoryReadStream {
    object: StoredObject,
    position: u64,
}

impl AsyncRead for MemoryReadStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let remaining = this.object.length.saturating_sub(this.position) as usize;
        if remaining == 0 {
            return Poll::Ready(Ok(()));
        }

        let n = buf.remaining().min(remaining);
        let chunk_size = this.object.chunk_size;
        let mut copied = 0;
        while copied < n {
            let abs = this.position as usize + copied;
            let index = abs / chunk_size;
            let offset = abs % chunk_size;
            let chunk = &this.object.chunks[index];
            let take = (chunk.len() - offset).min(n - copied);
            buf.put_slice(&chunk[offset..offset + take]);
            copied += take;
        }
        this.position += n as u64;
        Poll::Ready(Ok(()))
    }
}

/// Native writable stream appending to one object and committing it on
/// shutdown. Dropping the stream without a shutdown commits nothing.
#[derive(Debug)]
pub struct MemoryWriteStream {
    inner: Rc<StoreInner>,
    bucket: BucketKey,
    id: ObjectId,
    object: StoredObject,
    committed: bool,
}

impl AsyncWrite for MemoryWriteStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.committed {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write stream already shut down",
            )));
        }
        if !data.is_empty() {
            let at = this.object.length;
            let end = copy_into_chunks(&mut this.object.chunks, this.object.chunk_size, at, data);
            this.object.length = end;
        }
        Poll::Ready(Ok(data.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.committed {
            this.committed = true;
            this.object.upload_date = SystemTime::now();
            let mut buckets = this.inner.buckets.borrow_mut();
            let bucket = buckets.entry(this.bucket.clone()).or_default();
            bucket.insert(this.id, this.object.clone());
            tracing::debug!(id = %this.id, length = this.object.length, "committed memory object via stream");
        }
        Poll::Ready(Ok(()))
    }
}
