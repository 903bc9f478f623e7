//! The unsupported-operation matrix.
//!
//! A flat object store has no directory tree, no hard or symbolic links, no
//! permissions, no atomic rename and no change notification, so the
//! filesystem operations that need them cannot be mapped. They are rejected
//! deterministically through one dispatch point: every stub resolves
//! immediately to [`FsError::OperationNotSupported`] without looking at its
//! arguments, and never panics.
//!
//! `chmod`/`fchmod` are the one deliberate exception: they succeed as
//! silent no-ops, since acknowledging a permission call costs nothing in a
//! model without permissions. `lchmod` stays in the matrix with the rest of
//! the link-shaped calls.

use std::fmt;
use std::time::SystemTime;

use crate::api::types::{FileStat, FsError, FsResult, ToObjectId};
use crate::store::ObjectStore;

use super::adapter::ObjectFs;

/// Operations with no mapping onto a flat object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedOp {
    Rename,
    Truncate,
    Ftruncate,
    Chown,
    Fchown,
    Lchown,
    Lchmod,
    Lstat,
    Link,
    Symlink,
    Readlink,
    Realpath,
    Rmdir,
    Mkdir,
    Utimes,
    Futimes,
    Fsync,
    WatchFile,
    UnwatchFile,
    Watch,
    Access,
}

impl UnsupportedOp {
    /// Every operation in the matrix, for exhaustive rejection tests.
    pub const ALL: [UnsupportedOp; 21] = [
        UnsupportedOp::Rename,
        UnsupportedOp::Truncate,
        UnsupportedOp::Ftruncate,
        UnsupportedOp::Chown,
        UnsupportedOp::Fchown,
        UnsupportedOp::Lchown,
        UnsupportedOp::Lchmod,
        UnsupportedOp::Lstat,
        UnsupportedOp::Link,
        UnsupportedOp::Symlink,
        UnsupportedOp::Readlink,
        UnsupportedOp::Realpath,
        UnsupportedOp::Rmdir,
        UnsupportedOp::Mkdir,
        UnsupportedOp::Utimes,
        UnsupportedOp::Futimes,
        UnsupportedOp::Fsync,
        UnsupportedOp::WatchFile,
        UnsupportedOp::UnwatchFile,
        UnsupportedOp::Watch,
        UnsupportedOp::Access,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rename => "rename",
            Self::Truncate => "truncate",
            Self::Ftruncate => "ftruncate",
            Self::Chown => "chown",
            Self::Fchown => "fchown",
            Self::Lchown => "lchown",
            Self::Lchmod => "lchmod",
            Self::Lstat => "lstat",
            Self::Link => "link",
            Self::Symlink => "symlink",
            Self::Readlink => "readlink",
            Self::Realpath => "realpath",
            Self::Rmdir => "rmdir",
            Self::Mkdir => "mkdir",
            Self::Utimes => "utimes",
            Self::Futimes => "futimes",
            Self::Fsync => "fsync",
            Self::WatchFile => "watch_file",
            Self::UnwatchFile => "unwatch_file",
            Self::Watch => "watch",
            Self::Access => "access",
        }
    }
}

impl fmt::Display for UnsupportedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The single rejection point every stub dispatches through.
fn not_supported<T>(op: UnsupportedOp) -> FsResult<T> {
    Err(FsError::OperationNotSupported(op))
}

impl<S: ObjectStore> ObjectFs<S> {
    pub async fn rename(&self, _old: impl ToObjectId, _new: impl ToObjectId) -> FsResult<()> {
        not_supported(UnsupportedOp::Rename)
    }

    pub async fn truncate(&self, _path: impl ToObjectId, _length: u64) -> FsResult<()> {
        not_supported(UnsupportedOp::Truncate)
    }

    pub async fn ftruncate(&self, _fd: &S::Handle, _length: u64) -> FsResult<()> {
        not_supported(UnsupportedOp::Ftruncate)
    }

    pub async fn chown(&self, _path: impl ToObjectId, _uid: u32, _gid: u32) -> FsResult<()> {
        not_supported(UnsupportedOp::Chown)
    }

    pub async fn fchown(&self, _fd: &S::Handle, _uid: u32, _gid: u32) -> FsResult<()> {
        not_supported(UnsupportedOp::Fchown)
    }

    pub async fn lchown(&self, _path: impl ToObjectId, _uid: u32, _gid: u32) -> FsResult<()> {
        not_supported(UnsupportedOp::Lchown)
    }

    /// Silent no-op: there are no permissions to change.
    pub async fn chmod(&self, _path: impl ToObjectId, _mode: u32) -> FsResult<()> {
        Ok(())
    }

    /// Silent no-op, matching [`ObjectFs::chmod`].
    pub async fn fchmod(&self, _fd: &S::Handle, _mode: u32) -> FsResult<()> {
        Ok(())
    }

    pub async fn lchmod(&self, _path: impl ToObjectId, _mode: u32) -> FsResult<()> {
        not_supported(UnsupportedOp::Lchmod)
    }

    /// Symbolic links do not exist in this model.
    pub async fn lstat(&self, _path: impl ToObjectId) -> FsResult<FileStat> {
        not_supported(UnsupportedOp::Lstat)
    }

    pub async fn link(&self, _src: impl ToObjectId, _dst: impl ToObjectId) -> FsResult<()> {
        not_supported(UnsupportedOp::Link)
    }

    pub async fn symlink(&self, _src: impl ToObjectId, _dst: impl ToObjectId) -> FsResult<()> {
        not_supported(UnsupportedOp::Symlink)
    }

    pub async fn readlink(&self, _path: impl ToObjectId) -> FsResult<String> {
        not_supported(UnsupportedOp::Readlink)
    }

    pub async fn realpath(&self, _path: impl ToObjectId) -> FsResult<String> {
        not_supported(UnsupportedOp::Realpath)
    }

    pub async fn rmdir(&self, _path: impl ToObjectId) -> FsResult<()> {
        not_supported(UnsupportedOp::Rmdir)
    }

    pub async fn mkdir(&self, _path: impl ToObjectId, _mode: u32) -> FsResult<()> {
        not_supported(UnsupportedOp::Mkdir)
    }

    pub async fn utimes(
        &self,
        _path: impl ToObjectId,
        _atime: SystemTime,
        _mtime: SystemTime,
    ) -> FsResult<()> {
        not_supported(UnsupportedOp::Utimes)
    }

    pub async fn futimes(
        &self,
        _fd: &S::Handle,
        _atime: SystemTime,
        _mtime: SystemTime,
    ) -> FsResult<()> {
        not_supported(UnsupportedOp::Futimes)
    }

    pub async fn fsync(&self, _fd: &S::Handle) -> FsResult<()> {
        not_supported(UnsupportedOp::Fsync)
    }

    pub async fn watch_file(&self, _path: impl ToObjectId) -> FsResult<()> {
        not_supported(UnsupportedOp::WatchFile)
    }

    pub async fn unwatch_file(&self, _path: impl ToObjectId) -> FsResult<()> {
        not_supported(UnsupportedOp::UnwatchFile)
    }

    pub async fn watch(&self, _path: impl ToObjectId) -> FsResult<()> {
        not_supported(UnsupportedOp::Watch)
    }

    pub async fn access(&self, _path: impl ToObjectId, _mode: u32) -> FsResult<()> {
        not_supported(UnsupportedOp::Access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryObjectStore, ObjectId};
    use std::rc::Rc;

    fn run_test<F>(test: F)
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("test runtime")
            .block_on(test);
    }

    #[test]
    fn test_op_names_are_unique() {
        let mut names: Vec<&str> = UnsupportedOp::ALL.iter().map(|op| op.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), UnsupportedOp::ALL.len());
    }

    #[test]
    fn test_chmod_is_a_silent_no_op() {
        run_test(async {
            let fs = ObjectFs::new(Rc::new(InMemoryObjectStore::new()), "test", None);
            let id = ObjectId::from_raw(1);

            // No object needs to exist for the call to succeed.
            fs.chmod(id, 0o644).await.unwrap();

            fs.write_file(id, b"data", None).await.unwrap();
            let fd = fs.open(id, "r", None).await.unwrap();
            fs.fchmod(&fd, 0o600).await.unwrap();
            fs.close(fd).await.unwrap();
        });
    }
}
