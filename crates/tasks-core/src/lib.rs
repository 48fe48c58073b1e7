//! Record model for the tasks client: identities, kinds, lifecycle status,
//! domain records with their foreign keys, and the kind reference graph that
//! fixes the order in which dirty records are persisted.

pub mod effort;
pub mod error;
pub mod id;
pub mod record;
pub mod schema;
pub mod types;

// Re-export commonly used types
pub use error::CoreError;
pub use id::{RecordId, StoreKey, TemporaryIds};
pub use record::{ForeignKey, Record, RecordData};
pub use schema::SchemaGraph;
pub use types::{Operation, RecordKind, RecordStatus};
