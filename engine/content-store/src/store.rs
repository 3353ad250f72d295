//! Storage collaborator traits
//!
//! The engagement engines orchestrate over these interfaces; retry and
//! timeout policy for the underlying I/O belongs to each backend's client
//! contract, not to the engines.

use crate::bucket::Granularity;
use crate::error::Result;
use crate::types::{
    AggregationBucket, AuthorProfile, ContentId, ContentItem, HistoryEntry, Role, UserId,
    UserRecord, ViewEvent,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Access to content items
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Look up a single content item
    async fn find_by_id(&self, id: ContentId) -> Result<Option<ContentItem>>;

    /// Look up several content items at once.
    ///
    /// Unknown ids are skipped; the result order is unspecified.
    async fn find_by_ids(&self, ids: &[ContentId]) -> Result<Vec<ContentItem>>;

    /// Add `delta` to a content item's view counter.
    ///
    /// Must be an atomic in-place add, never an application-level
    /// read-modify-write: concurrent increments on the same item commute and
    /// none may be lost. Unknown ids are a no-op; existence validation is the
    /// caller's concern.
    async fn increment_view_count(&self, id: ContentId, delta: u64) -> Result<()>;

    /// Content whose tag set intersects `tags`, excluding the given ids
    async fn find_by_tag_intersection(
        &self,
        tags: &[String],
        exclude: &[ContentId],
    ) -> Result<Vec<ContentItem>>;

    /// The `limit` most viewed content items, view count descending.
    ///
    /// Ties keep a stable relative order; beyond that their order is
    /// unspecified.
    async fn find_top_by_views(&self, limit: usize) -> Result<Vec<ContentItem>>;
}

/// Access to user accounts and their engagement state
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a single user
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>>;

    /// Append one entry to a user's view history.
    ///
    /// History is append-only; repeat views of the same content are recorded
    /// as new entries. Fails with `UserNotFound` for unknown users.
    async fn append_view_history(&self, user_id: UserId, entry: HistoryEntry) -> Result<()>;

    /// Public profile fields for the given users, keyed by id.
    ///
    /// Ids with no matching user are simply absent from the result.
    async fn public_profiles(&self, ids: &[UserId]) -> Result<HashMap<UserId, AuthorProfile>>;

    /// Registration counts bucketed by `created_at`, bucket key ascending
    async fn registrations_by_bucket(
        &self,
        granularity: Granularity,
    ) -> Result<Vec<AggregationBucket>>;

    /// Number of users whose last login is at or after `cutoff`
    async fn count_active_since(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Count of users per role. Roles with no users are omitted.
    async fn role_counts(&self) -> Result<HashMap<Role, u64>>;
}

/// Append-only record of view events
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// Append one view event. Events are never updated or deleted.
    async fn append(&self, event: ViewEvent) -> Result<()>;

    /// View counts and duration sums bucketed by `viewed_at`, bucket key
    /// ascending. Events without a duration contribute zero to the sum.
    async fn views_by_bucket(&self, granularity: Granularity) -> Result<Vec<AggregationBucket>>;
}
