//! objectfs - Filesystem-Shaped Access to a Chunked Object Store
//!
//! objectfs lets application code written against a conventional file-I/O
//! contract target a remote, chunked binary object store addressed by
//! opaque identifiers. The whole value of the crate is one adapter:
//! [`ObjectFs`] maps open/read/write/close/stat/readdir/unlink and
//! streaming onto the store's document primitives, preserving positional
//! read/write semantics byte for byte against an engine that only streams
//! fixed-size chunks.
//!
//! # Architecture
//!
//! - **API Layer** ([`api`]): the [`ObjectFs`] adapter, its error and
//!   metadata vocabulary, and the rejection matrix for filesystem
//!   operations a flat object store cannot express (rename, links,
//!   directories, permissions, watches)
//! - **Store Layer** ([`store`]): the [`ObjectStore`]/[`ObjectHandle`]
//!   collaborator traits the adapter delegates to, opaque [`ObjectId`]
//!   identifiers with their generator, and [`InMemoryObjectStore`], a
//!   chunked in-memory reference implementation
//! - **Configuration** ([`config`]): TOML-backed adapter settings with
//!   validated defaults
//! - **Logging** ([`logging`]): tracing subscriber setup
//!
//! Concurrency is single-threaded and cooperative: every operation is a
//! `?Send` future that suspends only while delegating to the store. The
//! adapter holds no locks, imposes no ordering on concurrent use of one
//! descriptor, and never retries.
//!
//! # Example
//!
//! ```rust
//! use objectfs::{IdGenerator, InMemoryObjectStore, ObjectFs};
//! use std::rc::Rc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Rc::new(InMemoryObjectStore::new());
//! let fs = ObjectFs::new(store, "app", None);
//!
//! let ids = IdGenerator::from_node_string("app");
//! let id = ids.next_id()?;
//!
//! fs.write_file(id, b"hello", None).await?;
//! let data = fs.read_file(id.to_string().as_str(), None).await?;
//! assert_eq!(data, b"hello");
//!
//! let stat = fs.stat(id).await?;
//! assert_eq!(stat.size, 5);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod logging;
pub mod store;

pub use api::{FileStat, FsError, FsResult, ObjectFs, OpenOptions, ToObjectId, UnsupportedOp};
pub use config::FsConfig;
pub use store::{
    IdGenerator, InMemoryObjectStore, ObjectHandle, ObjectId, ObjectOptions, ObjectStore,
    OpenMode, StoreError, StoreResult,
};
