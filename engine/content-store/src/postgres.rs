//! Postgres storage backend

use crate::bucket::Granularity;
use crate::error::{Result, StoreError};
use crate::store::{ContentStore, EventStore, UserStore};
use crate::types::{
    AggregationBucket, AuthorProfile, ContentId, ContentItem, HistoryEntry, Role, UserId,
    UserRecord, ViewEvent,
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;

/// Postgres implementation of all three store collaborators
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database and run pending migrations
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool. Migrations are assumed to have run.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn content_from_row(row: &sqlx::postgres::PgRow) -> Result<ContentItem> {
        Ok(ContentItem {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            author_id: row.try_get("author_id")?,
            tags: row.try_get("tags")?,
            view_count: row.try_get::<i64, _>("view_count")? as u64,
            published: row.try_get("published")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn role_from_row(row: &sqlx::postgres::PgRow) -> Result<Role> {
        let raw: String = row.try_get("role")?;
        raw.parse().map_err(StoreError::Internal)
    }

    fn bucket_from_row(row: &sqlx::postgres::PgRow, with_duration: bool) -> Result<AggregationBucket> {
        Ok(AggregationBucket {
            bucket_key: row.try_get("bucket_key")?,
            count: row.try_get::<i64, _>("count")? as u64,
            total_duration_secs: if with_duration {
                Some(row.try_get::<i64, _>("total_duration")? as u64)
            } else {
                None
            },
        })
    }
}

#[async_trait::async_trait]
impl ContentStore for PgStore {
    async fn find_by_id(&self, id: ContentId) -> Result<Option<ContentItem>> {
        let row = sqlx::query(
            "SELECT id, title, author_id, tags, view_count, published, created_at
             FROM content_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::content_from_row).transpose()
    }

    async fn find_by_ids(&self, ids: &[ContentId]) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query(
            "SELECT id, title, author_id, tags, view_count, published, created_at
             FROM content_items WHERE id = ANY($1)",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::content_from_row).collect()
    }

    async fn increment_view_count(&self, id: ContentId, delta: u64) -> Result<()> {
        // the add happens in-place inside the UPDATE, so concurrent
        // increments serialize on the row without losing updates
        sqlx::query("UPDATE content_items SET view_count = view_count + $2 WHERE id = $1")
            .bind(id)
            .bind(delta as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_tag_intersection(
        &self,
        tags: &[String],
        exclude: &[ContentId],
    ) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query(
            "SELECT id, title, author_id, tags, view_count, published, created_at
             FROM content_items
             WHERE tags && $1 AND NOT (id = ANY($2))",
        )
        .bind(tags.to_vec())
        .bind(exclude.to_vec())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::content_from_row).collect()
    }

    async fn find_top_by_views(&self, limit: usize) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query(
            "SELECT id, title, author_id, tags, view_count, published, created_at
             FROM content_items
             ORDER BY view_count DESC
             LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::content_from_row).collect()
    }
}

#[async_trait::async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, username, avatar_url, role, interests, last_login_at, created_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let history_rows = sqlx::query(
            "SELECT content_id, viewed_at FROM user_view_history
             WHERE user_id = $1 ORDER BY seq",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let view_history = history_rows
            .iter()
            .map(|entry| {
                Ok(HistoryEntry {
                    content_id: entry.try_get("content_id")?,
                    viewed_at: entry.try_get("viewed_at")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(UserRecord {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            avatar_url: row.try_get("avatar_url")?,
            role: Self::role_from_row(&row)?,
            interests: row.try_get("interests")?,
            view_history,
            last_login_at: row.try_get("last_login_at")?,
            created_at: row.try_get("created_at")?,
        }))
    }

    async fn append_view_history(&self, user_id: UserId, entry: HistoryEntry) -> Result<()> {
        // INSERT .. SELECT so an unknown user surfaces as NotFound instead
        // of a foreign-key violation
        let result = sqlx::query(
            "INSERT INTO user_view_history (user_id, content_id, viewed_at)
             SELECT u.id, $2, $3 FROM users u WHERE u.id = $1",
        )
        .bind(user_id)
        .bind(entry.content_id)
        .bind(entry.viewed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(user_id));
        }
        Ok(())
    }

    async fn public_profiles(&self, ids: &[UserId]) -> Result<HashMap<UserId, AuthorProfile>> {
        let rows = sqlx::query("SELECT id, username, avatar_url FROM users WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        let mut profiles = HashMap::with_capacity(rows.len());
        for row in &rows {
            let id: UserId = row.try_get("id")?;
            profiles.insert(
                id,
                AuthorProfile {
                    username: row.try_get("username")?,
                    avatar_url: row.try_get("avatar_url")?,
                },
            );
        }
        Ok(profiles)
    }

    async fn registrations_by_bucket(
        &self,
        granularity: Granularity,
    ) -> Result<Vec<AggregationBucket>> {
        let rows = sqlx::query(
            "SELECT to_char(created_at, $1) AS bucket_key, COUNT(*) AS count
             FROM users GROUP BY 1 ORDER BY 1",
        )
        .bind(granularity.sql_format())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| Self::bucket_from_row(row, false)).collect()
    }

    async fn count_active_since(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM users WHERE last_login_at >= $1")
            .bind(cutoff)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("count")? as u64)
    }

    async fn role_counts(&self) -> Result<HashMap<Role, u64>> {
        let rows = sqlx::query("SELECT role, COUNT(*) AS count FROM users GROUP BY role")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in &rows {
            let role = Self::role_from_row(row)?;
            counts.insert(role, row.try_get::<i64, _>("count")? as u64);
        }
        Ok(counts)
    }
}

#[async_trait::async_trait]
impl EventStore for PgStore {
    async fn append(&self, event: ViewEvent) -> Result<()> {
        sqlx::query(
            "INSERT INTO view_events (id, content_id, viewer_id, viewed_at, duration_secs)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event.id)
        .bind(event.content_id)
        .bind(event.viewer_id)
        .bind(event.viewed_at)
        .bind(event.duration_secs.map(|secs| secs as i32))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn views_by_bucket(&self, granularity: Granularity) -> Result<Vec<AggregationBucket>> {
        let rows = sqlx::query(
            "SELECT to_char(viewed_at, $1) AS bucket_key,
                    COUNT(*) AS count,
                    COALESCE(SUM(duration_secs), 0) AS total_duration
             FROM view_events GROUP BY 1 ORDER BY 1",
        )
        .bind(granularity.sql_format())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| Self::bucket_from_row(row, true)).collect()
    }
}
