//! # ViewTracker
//!
//! Fans one logical view event out into its derived-state updates: the
//! append-only event log, the viewer's history, and the content item's view
//! counter.
//!
//! The three steps are deliberately not wrapped in a cross-document
//! transaction. Each piece of state lives in an independently-updatable
//! document, so the realistic contract is at-least-once and non-atomic: a
//! failure partway through leaves the earlier steps committed. Errors report
//! which step failed; they do not say which prior steps already took effect.

use chrono::Utc;
use content_store::{
    ContentId, ContentStore, EventStore, HistoryEntry, StoreError, UserId, UserStore, ViewEvent,
};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for view tracking operations
pub type Result<T> = std::result::Result<T, TrackError>;

/// The sub-step of `record_view` that an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStep {
    /// Appending the view event to the event log
    AppendEvent,
    /// Appending to the viewer's history
    AppendHistory,
    /// Incrementing the content item's view counter
    IncrementCounter,
}

impl fmt::Display for TrackStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackStep::AppendEvent => "event append",
            TrackStep::AppendHistory => "history append",
            TrackStep::IncrementCounter => "counter increment",
        };
        f.write_str(name)
    }
}

/// A view-tracking failure, tagged with the step it occurred in
#[derive(Error, Debug)]
#[error("view tracking failed at {step}: {source}")]
pub struct TrackError {
    pub step: TrackStep,
    #[source]
    pub source: StoreError,
}

impl TrackError {
    fn at(step: TrackStep) -> impl FnOnce(StoreError) -> TrackError {
        move |source| TrackError { step, source }
    }
}

/// Records views and maintains the derived counters
pub struct ViewTracker {
    events: Arc<dyn EventStore>,
    users: Arc<dyn UserStore>,
    content: Arc<dyn ContentStore>,
}

impl ViewTracker {
    pub fn new(
        events: Arc<dyn EventStore>,
        users: Arc<dyn UserStore>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self { events, users, content }
    }

    /// Record one view of `content_id`, anonymously or by `viewer_id`.
    ///
    /// Step order: event append, then history append (signed-in viewers
    /// only), then counter increment. Steps already committed are NOT rolled
    /// back when a later step fails. The counter increment is an atomic add
    /// in the store, so concurrent calls on the same content item never lose
    /// updates: N successful calls move the counter by exactly N.
    ///
    /// `content_id` is not validated here; existence checks belong to the
    /// content lookup path.
    pub async fn record_view(
        &self,
        content_id: ContentId,
        viewer_id: Option<UserId>,
        duration_secs: Option<u32>,
    ) -> Result<()> {
        let event = ViewEvent::new(content_id, viewer_id, duration_secs);
        self.events.append(event).await.map_err(TrackError::at(TrackStep::AppendEvent))?;

        if let Some(user_id) = viewer_id {
            let entry = HistoryEntry { content_id, viewed_at: Utc::now() };
            self.users
                .append_view_history(user_id, entry)
                .await
                .map_err(TrackError::at(TrackStep::AppendHistory))?;
        }

        self.content
            .increment_view_count(content_id, 1)
            .await
            .map_err(TrackError::at(TrackStep::IncrementCounter))?;

        tracing::debug!(%content_id, viewer = ?viewer_id, "view recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_store::{ContentItem, MemoryStore, Role, UserRecord};
    use std::collections::HashMap;
    use uuid::Uuid;

    fn seeded_store() -> (Arc<MemoryStore>, ContentId, UserId) {
        let store = Arc::new(MemoryStore::new());
        let content_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        store.insert_content(ContentItem {
            id: content_id,
            title: "intro".to_string(),
            author_id: Uuid::new_v4(),
            tags: vec!["rust".to_string()],
            view_count: 0,
            published: true,
            created_at: Utc::now(),
        });
        store.insert_user(UserRecord {
            id: user_id,
            username: "reader".to_string(),
            avatar_url: None,
            role: Role::User,
            interests: Vec::new(),
            view_history: Vec::new(),
            last_login_at: Utc::now(),
            created_at: Utc::now(),
        });
        (store, content_id, user_id)
    }

    fn tracker(store: &Arc<MemoryStore>) -> ViewTracker {
        ViewTracker::new(store.clone(), store.clone(), store.clone())
    }

    #[tokio::test]
    async fn records_event_history_and_counter() {
        let (store, content_id, user_id) = seeded_store();
        let tracker = tracker(&store);

        tracker.record_view(content_id, Some(user_id), Some(42)).await.unwrap();

        let events = store.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].content_id, content_id);
        assert_eq!(events[0].viewer_id, Some(user_id));
        assert_eq!(events[0].duration_secs, Some(42));

        let user = UserStore::find_by_id(store.as_ref(), user_id).await.unwrap().unwrap();
        assert_eq!(user.view_history.len(), 1);
        assert_eq!(user.view_history[0].content_id, content_id);

        let item = ContentStore::find_by_id(store.as_ref(), content_id).await.unwrap().unwrap();
        assert_eq!(item.view_count, 1);
    }

    #[tokio::test]
    async fn anonymous_views_skip_history() {
        let (store, content_id, user_id) = seeded_store();
        let tracker = tracker(&store);

        tracker.record_view(content_id, None, None).await.unwrap();

        assert_eq!(store.events().len(), 1);
        let user = UserStore::find_by_id(store.as_ref(), user_id).await.unwrap().unwrap();
        assert!(user.view_history.is_empty());
        let item = ContentStore::find_by_id(store.as_ref(), content_id).await.unwrap().unwrap();
        assert_eq!(item.view_count, 1);
    }

    #[tokio::test]
    async fn repeat_views_are_not_deduplicated() {
        let (store, content_id, user_id) = seeded_store();
        let tracker = tracker(&store);

        tracker.record_view(content_id, Some(user_id), None).await.unwrap();
        tracker.record_view(content_id, Some(user_id), None).await.unwrap();

        let user = UserStore::find_by_id(store.as_ref(), user_id).await.unwrap().unwrap();
        assert_eq!(user.view_history.len(), 2);
        let item = ContentStore::find_by_id(store.as_ref(), content_id).await.unwrap().unwrap();
        assert_eq!(item.view_count, 2);
    }

    #[tokio::test]
    async fn concurrent_views_move_counter_by_exactly_n() {
        let (store, content_id, _) = seeded_store();
        let tracker = Arc::new(tracker(&store));

        let n = 100;
        let handles: Vec<_> = (0..n)
            .map(|_| {
                let tracker = tracker.clone();
                tokio::spawn(async move { tracker.record_view(content_id, None, None).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let item = ContentStore::find_by_id(store.as_ref(), content_id).await.unwrap().unwrap();
        assert_eq!(item.view_count, n);
        assert_eq!(store.events().len(), n as usize);
    }

    /// UserStore double whose history append always fails
    struct BrokenHistory {
        inner: Arc<MemoryStore>,
    }

    #[async_trait::async_trait]
    impl UserStore for BrokenHistory {
        async fn find_by_id(&self, id: UserId) -> content_store::Result<Option<UserRecord>> {
            UserStore::find_by_id(self.inner.as_ref(), id).await
        }

        async fn append_view_history(
            &self,
            _user_id: UserId,
            _entry: HistoryEntry,
        ) -> content_store::Result<()> {
            Err(StoreError::Unavailable("history shard down".to_string()))
        }

        async fn public_profiles(
            &self,
            ids: &[UserId],
        ) -> content_store::Result<HashMap<UserId, content_store::AuthorProfile>> {
            self.inner.public_profiles(ids).await
        }

        async fn registrations_by_bucket(
            &self,
            granularity: content_store::Granularity,
        ) -> content_store::Result<Vec<content_store::AggregationBucket>> {
            self.inner.registrations_by_bucket(granularity).await
        }

        async fn count_active_since(
            &self,
            cutoff: chrono::DateTime<Utc>,
        ) -> content_store::Result<u64> {
            self.inner.count_active_since(cutoff).await
        }

        async fn role_counts(&self) -> content_store::Result<HashMap<Role, u64>> {
            self.inner.role_counts().await
        }
    }

    #[tokio::test]
    async fn history_failure_keeps_event_and_skips_counter() {
        let (store, content_id, user_id) = seeded_store();
        let tracker = ViewTracker::new(
            store.clone(),
            Arc::new(BrokenHistory { inner: store.clone() }),
            store.clone(),
        );

        let err = tracker.record_view(content_id, Some(user_id), None).await.unwrap_err();
        assert_eq!(err.step, TrackStep::AppendHistory);

        // step 1 committed, step 3 never ran
        assert_eq!(store.events().len(), 1);
        let item = ContentStore::find_by_id(store.as_ref(), content_id).await.unwrap().unwrap();
        assert_eq!(item.view_count, 0);
    }
}
