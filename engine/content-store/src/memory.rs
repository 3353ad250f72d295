//! In-memory storage backend
//!
//! Backs unit tests and development mode. Semantics match the Postgres
//! backend: the view counter is an atomic in-place add, history appends are
//! ordered, and rollups come back sorted by bucket key.

use crate::bucket::Granularity;
use crate::error::{Result, StoreError};
use crate::store::{ContentStore, EventStore, UserStore};
use crate::types::{
    AggregationBucket, AuthorProfile, ContentId, ContentItem, HistoryEntry, Role, UserId,
    UserRecord, ViewEvent,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// Content record with its hot counter split out for lock-free increments
#[derive(Debug)]
struct ContentEntry {
    title: String,
    author_id: UserId,
    tags: Vec<String>,
    view_count: AtomicU64,
    published: bool,
    created_at: DateTime<Utc>,
}

impl ContentEntry {
    fn to_item(&self, id: ContentId) -> ContentItem {
        ContentItem {
            id,
            title: self.title.clone(),
            author_id: self.author_id,
            tags: self.tags.clone(),
            view_count: self.view_count.load(Ordering::Relaxed),
            published: self.published,
            created_at: self.created_at,
        }
    }
}

/// In-memory implementation of all three store collaborators
#[derive(Debug, Default)]
pub struct MemoryStore {
    content: DashMap<ContentId, ContentEntry>,
    // insertion order doubles as the "natural storage order" used for
    // tie-breaking in top-by-views queries
    content_order: Mutex<Vec<ContentId>>,
    users: DashMap<UserId, UserRecord>,
    events: Mutex<Vec<ViewEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a content item
    pub fn insert_content(&self, item: ContentItem) {
        let entry = ContentEntry {
            title: item.title,
            author_id: item.author_id,
            tags: item.tags,
            view_count: AtomicU64::new(item.view_count),
            published: item.published,
            created_at: item.created_at,
        };
        self.content.insert(item.id, entry);
        self.content_order.lock().push(item.id);
    }

    /// Seed a user record
    pub fn insert_user(&self, user: UserRecord) {
        self.users.insert(user.id, user);
    }

    /// Snapshot of the event log, oldest first
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().clone()
    }

    fn items_in_order(&self) -> Vec<ContentItem> {
        let order = self.content_order.lock();
        order
            .iter()
            .filter_map(|id| self.content.get(id).map(|entry| entry.to_item(*id)))
            .collect()
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryStore {
    async fn find_by_id(&self, id: ContentId) -> Result<Option<ContentItem>> {
        Ok(self.content.get(&id).map(|entry| entry.to_item(id)))
    }

    async fn find_by_ids(&self, ids: &[ContentId]) -> Result<Vec<ContentItem>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.content.get(id).map(|entry| entry.to_item(*id)))
            .collect())
    }

    async fn increment_view_count(&self, id: ContentId, delta: u64) -> Result<()> {
        // fetch_add keeps concurrent increments commutative; unknown ids are
        // a no-op, matching the SQL UPDATE's zero-row case
        if let Some(entry) = self.content.get(&id) {
            entry.view_count.fetch_add(delta, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn find_by_tag_intersection(
        &self,
        tags: &[String],
        exclude: &[ContentId],
    ) -> Result<Vec<ContentItem>> {
        let items = self
            .items_in_order()
            .into_iter()
            .filter(|item| !exclude.contains(&item.id))
            .filter(|item| item.tags.iter().any(|tag| tags.contains(tag)))
            .collect();
        Ok(items)
    }

    async fn find_top_by_views(&self, limit: usize) -> Result<Vec<ContentItem>> {
        let mut items = self.items_in_order();
        // stable sort preserves storage order among tied counts
        items.sort_by_key(|item| std::cmp::Reverse(item.view_count));
        items.truncate(limit);
        Ok(items)
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.users.get(&id).map(|user| user.value().clone()))
    }

    async fn append_view_history(&self, user_id: UserId, entry: HistoryEntry) -> Result<()> {
        match self.users.get_mut(&user_id) {
            Some(mut user) => {
                user.view_history.push(entry);
                Ok(())
            }
            None => Err(StoreError::UserNotFound(user_id)),
        }
    }

    async fn public_profiles(&self, ids: &[UserId]) -> Result<HashMap<UserId, AuthorProfile>> {
        let mut profiles = HashMap::new();
        for id in ids {
            if let Some(user) = self.users.get(id) {
                profiles.insert(*id, user.author_profile());
            }
        }
        Ok(profiles)
    }

    async fn registrations_by_bucket(
        &self,
        granularity: Granularity,
    ) -> Result<Vec<AggregationBucket>> {
        let mut buckets: BTreeMap<String, u64> = BTreeMap::new();
        for user in self.users.iter() {
            *buckets.entry(granularity.bucket_key(user.created_at)).or_default() += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|(bucket_key, count)| AggregationBucket {
                bucket_key,
                count,
                total_duration_secs: None,
            })
            .collect())
    }

    async fn count_active_since(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        Ok(self.users.iter().filter(|user| user.last_login_at >= cutoff).count() as u64)
    }

    async fn role_counts(&self) -> Result<HashMap<Role, u64>> {
        let mut counts = HashMap::new();
        for user in self.users.iter() {
            *counts.entry(user.role).or_default() += 1;
        }
        Ok(counts)
    }
}

#[async_trait::async_trait]
impl EventStore for MemoryStore {
    async fn append(&self, event: ViewEvent) -> Result<()> {
        self.events.lock().push(event);
        Ok(())
    }

    async fn views_by_bucket(&self, granularity: Granularity) -> Result<Vec<AggregationBucket>> {
        let mut buckets: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for event in self.events.lock().iter() {
            let slot = buckets.entry(granularity.bucket_key(event.viewed_at)).or_default();
            slot.0 += 1;
            slot.1 += u64::from(event.duration_secs.unwrap_or(0));
        }
        Ok(buckets
            .into_iter()
            .map(|(bucket_key, (count, duration))| AggregationBucket {
                bucket_key,
                count,
                total_duration_secs: Some(duration),
            })
            .collect())
    }
}
