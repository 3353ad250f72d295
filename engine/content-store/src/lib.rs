//! # ContentStore
//!
//! Domain model and storage collaborators for the content platform's
//! engagement subsystem.
//!
//! The engagement engines (view tracking, analytics, suggestions) never talk
//! to a database directly. They depend on the three collaborator traits
//! defined here — [`ContentStore`], [`UserStore`], [`EventStore`] — and this
//! crate ships two backends for them: a Postgres implementation for
//! production and an in-memory implementation for tests and development.

pub mod bucket;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod types;

// Re-export main types for easy usage
pub use bucket::Granularity;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{ContentStore, EventStore, UserStore};
pub use types::{
    AggregationBucket, AuthorProfile, ContentId, ContentItem, HistoryEntry, Role, UserId,
    UserRecord, ViewEvent,
};
