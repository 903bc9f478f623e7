//! End-to-end coverage of the adapter contract against the in-memory store:
//! identifier normalization, the positional read/write contract, stat
//! synthesis, whole-file and streaming conveniences, the unsupported
//! matrix, and idempotent delete.

use std::rc::Rc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use objectfs::{
    FsError, IdGenerator, InMemoryObjectStore, ObjectFs, OpenOptions, StoreError, UnsupportedOp,
};

fn new_fs() -> ObjectFs<InMemoryObjectStore> {
    objectfs::logging::init("warn");
    ObjectFs::new(
        Rc::new(InMemoryObjectStore::with_chunk_size(64)),
        "test",
        Some("fs"),
    )
}

fn ids() -> IdGenerator {
    IdGenerator::from_node_string("adapter_ops")
}

/// Deterministic non-trivial content.
fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(31) + 7) as u8).collect()
}

#[tokio::test]
async fn identifier_and_string_form_address_the_same_object() {
    let fs = new_fs();
    let gen = ids();
    let data = pattern(512);

    // Write through the native id, read through its string form.
    let id = gen.next_id().unwrap();
    fs.write_file(id, &data, None).await.unwrap();
    let by_string = fs.read_file(id.to_string().as_str(), None).await.unwrap();
    assert_eq!(by_string, data);

    // And the other way around.
    let id = gen.next_id().unwrap();
    fs.write_file(id.to_string(), &data, None).await.unwrap();
    let by_id = fs.read_file(id, None).await.unwrap();
    assert_eq!(by_id, data);
}

#[tokio::test]
async fn malformed_identifier_strings_are_rejected() {
    let fs = new_fs();
    let result = fs.read_file("not-a-hex-id", None).await;
    assert!(matches!(
        result,
        Err(FsError::Store(StoreError::InvalidId(_)))
    ));
}

#[tokio::test]
async fn successive_reads_partition_the_file() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();
    let data = pattern(512);
    fs.write_file(id, &data, None).await.unwrap();

    let mut fd = fs.open(id, "r", None).await.unwrap();

    let mut buf = vec![0u8; 128];
    let n = fs.read(&mut fd, &mut buf, 0, 128, None).await.unwrap();
    assert_eq!(n, 128);
    assert_eq!(&buf[..n], &data[..128]);

    let mut buf = vec![0u8; 128];
    let n = fs.read(&mut fd, &mut buf, 0, 128, None).await.unwrap();
    assert_eq!(n, 128);
    assert_eq!(&buf[..n], &data[128..256]);

    // Request more than remains: clamped to the 256 bytes left.
    let mut buf = vec![0u8; 384];
    let n = fs.read(&mut fd, &mut buf, 0, 384, None).await.unwrap();
    assert_eq!(n, 256);
    assert_eq!(&buf[..n], &data[256..]);

    // At end of file: zero-length read, never an error.
    let mut buf = vec![0u8; 384];
    let n = fs.read(&mut fd, &mut buf, 0, 384, None).await.unwrap();
    assert_eq!(n, 0);

    fs.close(fd).await.unwrap();
}

#[tokio::test]
async fn reading_past_end_clamps_instead_of_failing() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();
    fs.write_file(id, &pattern(100), None).await.unwrap();

    let mut fd = fs.open(id, "r", None).await.unwrap();
    let mut buf = vec![0u8; 1000];
    let n = fs.read(&mut fd, &mut buf, 0, 1000, Some(60)).await.unwrap();
    assert_eq!(n, 40);
    fs.close(fd).await.unwrap();
}

#[tokio::test]
async fn mode_mismatch_is_surfaced_not_swallowed() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();
    let data = pattern(32);

    // Write through a read-mode descriptor fails.
    fs.write_file(id, &data, None).await.unwrap();
    let mut fd = fs.open(id, "r", None).await.unwrap();
    let result = fs.write(&mut fd, &data, 0, data.len(), None).await;
    assert!(matches!(
        result,
        Err(FsError::Store(StoreError::InvalidMode { .. }))
    ));
    fs.close(fd).await.unwrap();

    // Read through a write-mode descriptor fails too.
    let mut fd = fs.open(id, "w", None).await.unwrap();
    fs.write(&mut fd, &data, 0, data.len(), None).await.unwrap();
    let mut buf = vec![0u8; 8];
    let result = fs.read(&mut fd, &mut buf, 0, 8, Some(0)).await;
    assert!(matches!(
        result,
        Err(FsError::Store(StoreError::InvalidMode { .. }))
    ));
    fs.close(fd).await.unwrap();
}

#[tokio::test]
async fn failed_seek_aborts_the_guarded_read() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();
    fs.write_file(id, &pattern(16), None).await.unwrap();

    let mut fd = fs.open(id, "r", None).await.unwrap();
    let mut buf = vec![0u8; 8];
    // Position far past the end: the seek fails, the read never runs.
    let result = fs.read(&mut fd, &mut buf, 0, 8, Some(1000)).await;
    assert!(matches!(result, Err(FsError::Seek(_))));
    // The descriptor is still usable at its old position.
    let n = fs.read(&mut fd, &mut buf, 0, 8, Some(0)).await.unwrap();
    assert_eq!(n, 8);
    fs.close(fd).await.unwrap();
}

#[tokio::test]
async fn whole_file_round_trip() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();
    let data = pattern(3000); // spans several 64-byte chunks

    fs.write_file(id, &data, None).await.unwrap();
    let out = fs.read_file(id, None).await.unwrap();
    assert_eq!(out, data);

    // Rewriting replaces, not appends.
    let shorter = pattern(10);
    fs.write_file(id, &shorter, None).await.unwrap();
    assert_eq!(fs.read_file(id, None).await.unwrap(), shorter);
}

#[tokio::test]
async fn append_preserves_existing_content() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();
    let first = pattern(100);
    let second: Vec<u8> = pattern(200).iter().map(|b| b.wrapping_add(1)).collect();

    fs.write_file(id, &first, None).await.unwrap();
    fs.append_file(id, &second, None).await.unwrap();

    let out = fs.read_file(id, None).await.unwrap();
    assert_eq!(&out[..100], &first[..]);
    assert_eq!(&out[100..], &second[..]);

    // Appending to a missing object creates it.
    let fresh = ids().next_id().unwrap();
    fs.append_file(fresh, &first, None).await.unwrap();
    assert_eq!(fs.read_file(fresh, None).await.unwrap(), first);
}

#[tokio::test]
async fn unlink_is_idempotent_and_exists_reports_absence() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();

    assert!(!fs.exists(id).await.unwrap());
    fs.unlink(id).await.unwrap(); // nothing there, still fine

    fs.write_file(id, b"data", None).await.unwrap();
    assert!(fs.exists(id).await.unwrap());

    fs.unlink(id).await.unwrap();
    assert!(!fs.exists(id).await.unwrap());
    fs.unlink(id).await.unwrap();
}

#[tokio::test]
async fn stat_synthesizes_a_regular_file_record() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();
    let data = pattern(321);

    let options = OpenOptions::new().with_content_type("application/octet-stream");
    fs.write_file(id, &data, Some(options)).await.unwrap();

    let stat = fs.stat(id).await.unwrap();
    assert_eq!(stat.size, data.len() as u64);
    assert!(stat.is_file());
    assert!(!stat.is_directory());
    assert!(!stat.is_symbolic_link());
    assert!(!stat.is_block_device());
    assert!(!stat.is_character_device());
    assert!(!stat.is_socket());
    assert!(!stat.is_fifo());

    // One upload timestamp feeds all three POSIX times.
    assert_eq!(stat.atime, stat.mtime);
    assert_eq!(stat.mtime, stat.ctime);

    assert_eq!(stat.content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(stat.mode, 0);
    assert_eq!(stat.uid, 0);
    assert_eq!(stat.blocks, 0);
}

#[tokio::test]
async fn fstat_matches_descriptor_fields() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();
    fs.write_file(id, &pattern(77), None).await.unwrap();

    let fd = fs.open(id, "r", None).await.unwrap();
    let stat = fs.fstat(&fd).unwrap();
    assert_eq!(stat.size, 77);
    assert!(stat.is_file());

    // fstat costs no store round trip and is recomputed per call.
    let again = fs.fstat(&fd).unwrap();
    assert_eq!(again.size, stat.size);
    assert_eq!(again.mtime, stat.mtime);
    fs.close(fd).await.unwrap();
}

#[tokio::test]
async fn stat_of_missing_object_propagates_not_found() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();
    let result = fs.stat(id).await;
    assert!(matches!(
        result,
        Err(FsError::Store(StoreError::NotFound(_)))
    ));
}

#[tokio::test]
async fn read_open_ignores_caller_options() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();

    let options = OpenOptions::new().with_content_type("image/png");
    fs.write_file(id, b"png bytes", Some(options)).await.unwrap();

    // A reader supplying different options cannot change the record.
    let injected = OpenOptions::new().with_content_type("text/plain");
    let fd = fs.open(id, "r", Some(injected)).await.unwrap();
    let stat = fs.fstat(&fd).unwrap();
    assert_eq!(stat.content_type.as_deref(), Some("image/png"));
    fs.close(fd).await.unwrap();
}

#[tokio::test]
async fn streams_reproduce_content_exactly() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();
    let data = pattern(4096);

    let mut sink = fs.create_write_stream(id, None).await.unwrap();
    sink.write_all(&data).await.unwrap();
    sink.shutdown().await.unwrap();

    let mut source = fs.create_read_stream(id, None).await.unwrap();
    let mut out = Vec::new();
    source.read_to_end(&mut out).await.unwrap();
    assert_eq!(out, data);
}

#[tokio::test]
async fn read_dir_enumerates_the_root() {
    let fs = new_fs();
    let gen = ids();
    let mut expected: Vec<String> = Vec::new();
    for _ in 0..3 {
        let id = gen.next_id().unwrap();
        fs.write_file(id, b"x", None).await.unwrap();
        expected.push(id.to_string());
    }
    expected.sort_unstable();

    let names = fs.read_dir(None).await.unwrap();
    assert_eq!(names, expected);

    // The ignored path argument changes nothing.
    assert_eq!(fs.read_dir(Some("/anything")).await.unwrap(), expected);
}

#[tokio::test]
async fn unsupported_operations_fail_uniformly() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();
    fs.write_file(id, b"data", None).await.unwrap();
    let fd = fs.open(id, "r", None).await.unwrap();
    let t = std::time::SystemTime::now();

    fn rejected<T: std::fmt::Debug>(result: Result<T, FsError>, op: UnsupportedOp) {
        match result {
            Err(FsError::OperationNotSupported(actual)) => assert_eq!(actual, op),
            other => panic!("{} must be rejected, got {:?}", op, other),
        }
    }

    rejected(fs.rename(id, id).await, UnsupportedOp::Rename);
    rejected(fs.truncate(id, 0).await, UnsupportedOp::Truncate);
    rejected(fs.ftruncate(&fd, 0).await, UnsupportedOp::Ftruncate);
    rejected(fs.chown(id, 0, 0).await, UnsupportedOp::Chown);
    rejected(fs.fchown(&fd, 0, 0).await, UnsupportedOp::Fchown);
    rejected(fs.lchown(id, 0, 0).await, UnsupportedOp::Lchown);
    rejected(fs.lchmod(id, 0o644).await, UnsupportedOp::Lchmod);
    rejected(fs.lstat(id).await, UnsupportedOp::Lstat);
    rejected(fs.link(id, id).await, UnsupportedOp::Link);
    rejected(fs.symlink(id, id).await, UnsupportedOp::Symlink);
    rejected(fs.readlink(id).await, UnsupportedOp::Readlink);
    rejected(fs.realpath(id).await, UnsupportedOp::Realpath);
    rejected(fs.rmdir(id).await, UnsupportedOp::Rmdir);
    rejected(fs.mkdir(id, 0o755).await, UnsupportedOp::Mkdir);
    rejected(fs.utimes(id, t, t).await, UnsupportedOp::Utimes);
    rejected(fs.futimes(&fd, t, t).await, UnsupportedOp::Futimes);
    rejected(fs.fsync(&fd).await, UnsupportedOp::Fsync);
    rejected(fs.watch_file(id).await, UnsupportedOp::WatchFile);
    rejected(fs.unwatch_file(id).await, UnsupportedOp::UnwatchFile);
    rejected(fs.watch(id).await, UnsupportedOp::Watch);
    rejected(fs.access(id, 0).await, UnsupportedOp::Access);

    // Rejection is argument-independent: a malformed id string changes
    // nothing.
    rejected(fs.rename("garbage", "more garbage").await, UnsupportedOp::Rename);
    rejected(fs.truncate("garbage", u64::MAX).await, UnsupportedOp::Truncate);

    // The two policy exceptions succeed silently.
    fs.chmod(id, 0o777).await.unwrap();
    fs.fchmod(&fd, 0o777).await.unwrap();

    fs.close(fd).await.unwrap();
}

/// A fresh descriptor must see content committed by an earlier one, and a
/// descriptor opened before an overwrite keeps its snapshot isolation at
/// the store's discretion; what the adapter guarantees is only delegation.
#[tokio::test]
async fn open_returns_store_descriptor_unchanged() {
    let fs = new_fs();
    let id = ids().next_id().unwrap();
    fs.write_file(id, &pattern(10), None).await.unwrap();

    let fd = fs.open(id, "r", None).await.unwrap();
    use objectfs::ObjectHandle;
    assert_eq!(fd.total_length(), 10);
    assert_eq!(fd.position(), 0);
    assert_eq!(*fd.id(), id);
    assert_eq!(fd.mode(), objectfs::OpenMode::Read);
    fs.close(fd).await.unwrap();
}
