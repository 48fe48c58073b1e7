//! Save pipeline for the tasks client.
//!
//! Persists the dirty records of a [`tasks_store::RecordStore`] to a
//! [`Remote`] in dependency order: users, then projects, then tasks, then
//! watches. Newly created records get their permanent identity from the
//! remote and every reference to their temporary identity is relinked before
//! the next record is sent.
//!
//! # Modules
//!
//! - [`config`]: SyncConfig read from the environment
//! - [`error`]: RemoteError and SaveError
//! - [`mode`]: the session-wide SaveMode
//! - [`remote`]: the Remote trait with HTTP and offline-archive adapters
//! - [`scheduler`]: TierScheduler over the per-kind dirty queues
//! - [`commit`]: the per-record commit state machine
//! - [`relink`]: foreign-key relinking after identity assignment
//! - [`service`]: TasksService, the save session guard

pub mod commit;
pub mod config;
pub mod error;
pub mod mode;
pub mod relink;
pub mod remote;
pub mod scheduler;
pub mod service;

pub use commit::{CommittedRecord, Committer, SaveReport};
pub use config::{ConfigError, Mode, SyncConfig};
pub use error::{RemoteError, SaveError};
pub use mode::SaveMode;
pub use relink::Relinker;
pub use remote::{CommitAck, CommitRequest, HttpRemote, LocalRemote, Remote};
pub use scheduler::TierScheduler;
pub use service::TasksService;
