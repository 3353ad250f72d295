//! Point-in-time engagement queries

use crate::error::{AnalyticsError, Result};
use crate::AnalyticsEngine;
use chrono::{Duration, Utc};
use content_store::{AuthorProfile, ContentId, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default window for the active-user count
pub const DEFAULT_ACTIVE_WINDOW_DAYS: u32 = 7;

/// A popular content item, enriched with its author's public profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularContent {
    pub content_id: ContentId,
    pub title: String,
    pub tags: Vec<String>,
    pub view_count: u64,
    /// Absent only when the author reference is dangling, which is a
    /// data-integrity problem upstream of this subsystem
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorProfile>,
}

impl AnalyticsEngine {
    /// The `limit` most viewed content items, view count descending, each
    /// joined with its author's public profile.
    pub async fn popular_content(&self, limit: usize) -> Result<Vec<PopularContent>> {
        if limit == 0 {
            return Err(AnalyticsError::InvalidArgument("limit must be positive".to_string()));
        }

        let items = self.content().find_top_by_views(limit).await?;
        let author_ids: Vec<_> = items.iter().map(|item| item.author_id).collect();
        let mut profiles = self.users().public_profiles(&author_ids).await?;

        Ok(items
            .into_iter()
            .map(|item| PopularContent {
                content_id: item.id,
                title: item.title,
                tags: item.tags,
                view_count: item.view_count,
                author: profiles.remove(&item.author_id),
            })
            .collect())
    }

    /// Number of users whose last login falls within the past `window_days`
    /// days (default 7)
    pub async fn active_user_count(&self, window_days: Option<u32>) -> Result<u64> {
        let days = window_days.unwrap_or(DEFAULT_ACTIVE_WINDOW_DAYS);
        if days == 0 {
            return Err(AnalyticsError::InvalidArgument("window must be positive".to_string()));
        }
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        Ok(self.users().count_active_since(cutoff).await?)
    }

    /// Count of users per role. Roles with zero users are omitted, not
    /// reported as zero.
    pub async fn role_distribution(&self) -> Result<HashMap<Role, u64>> {
        Ok(self.users().role_counts().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_store::{ContentItem, MemoryStore, UserRecord};
    use std::sync::Arc;
    use uuid::Uuid;

    fn engine(store: &Arc<MemoryStore>) -> AnalyticsEngine {
        AnalyticsEngine::new(store.clone(), store.clone(), store.clone())
    }

    fn author(store: &MemoryStore, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        store.insert_user(UserRecord {
            id,
            username: username.to_string(),
            avatar_url: Some(format!("https://cdn.example/{username}.png")),
            role: Role::Writer,
            interests: Vec::new(),
            view_history: Vec::new(),
            last_login_at: Utc::now(),
            created_at: Utc::now(),
        });
        id
    }

    fn content(store: &MemoryStore, title: &str, author_id: Uuid, view_count: u64) {
        store.insert_content(ContentItem {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author_id,
            tags: vec!["general".to_string()],
            view_count,
            published: true,
            created_at: Utc::now(),
        });
    }

    #[tokio::test]
    async fn popular_content_ranks_and_joins_authors() {
        let store = Arc::new(MemoryStore::new());
        let alice = author(&store, "alice");
        let bob = author(&store, "bob");
        content(&store, "a", alice, 50);
        content(&store, "b", bob, 10);
        content(&store, "c", alice, 30);
        content(&store, "d", bob, 30);
        content(&store, "e", alice, 5);

        let top = engine(&store).popular_content(3).await.unwrap();
        let counts: Vec<u64> = top.iter().map(|p| p.view_count).collect();
        assert_eq!(counts, vec![50, 30, 30]);
        assert_eq!(top[0].author.as_ref().unwrap().username, "alice");
        assert!(top.iter().all(|p| p.author.is_some()));
    }

    #[tokio::test]
    async fn popular_content_rejects_zero_limit() {
        let store = Arc::new(MemoryStore::new());
        let err = engine(&store).popular_content(0).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn active_users_defaults_to_seven_days() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        for days_ago in [1, 3, 10, 40] {
            let id = Uuid::new_v4();
            store.insert_user(UserRecord {
                id,
                username: format!("u{id}"),
                avatar_url: None,
                role: Role::User,
                interests: Vec::new(),
                view_history: Vec::new(),
                last_login_at: now - Duration::days(days_ago),
                created_at: now - Duration::days(60),
            });
        }
        let engine = engine(&store);

        assert_eq!(engine.active_user_count(None).await.unwrap(), 2);
        assert_eq!(engine.active_user_count(Some(30)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn active_users_rejects_zero_window() {
        let store = Arc::new(MemoryStore::new());
        let err = engine(&store).active_user_count(Some(0)).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn role_distribution_reports_only_present_roles() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        for role in [Role::User, Role::User, Role::User, Role::Admin] {
            let id = Uuid::new_v4();
            store.insert_user(UserRecord {
                id,
                username: format!("u{id}"),
                avatar_url: None,
                role,
                interests: Vec::new(),
                view_history: Vec::new(),
                last_login_at: now,
                created_at: now,
            });
        }

        let distribution = engine(&store).role_distribution().await.unwrap();
        assert_eq!(distribution.get(&Role::User), Some(&3));
        assert_eq!(distribution.get(&Role::Admin), Some(&1));
        assert!(!distribution.contains_key(&Role::Writer));
    }
}
