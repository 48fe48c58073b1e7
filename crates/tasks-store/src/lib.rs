//! Record storage for the tasks client.
//!
//! Provides the [`RecordStore`] trait the save pipeline consumes, the
//! [`InMemoryStore`] working set the client edits, the dirty-set classifier
//! that turns the change log into per-kind save queues, and the
//! [`SqliteArchive`] that stands in for the server in offline mode.
//!
//! # Modules
//!
//! - [`error`]: StoreError enum with all failure modes
//! - [`types`]: SyntheticProjects
//! - [`traits`]: RecordStore trait definition
//! - [`memory`]: InMemoryStore implementation
//! - [`dirty`]: dirty-set classification into per-kind queues
//! - [`schema`]: SQL schema and migration setup
//! - [`archive`]: SqliteArchive implementation

pub mod archive;
pub mod dirty;
pub mod error;
pub mod memory;
pub mod schema;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use archive::SqliteArchive;
pub use dirty::{compute_dirty_queues, has_dirty_records, DirtyQueues};
pub use error::StoreError;
pub use memory::InMemoryStore;
pub use traits::RecordStore;
pub use types::SyntheticProjects;
