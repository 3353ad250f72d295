//! Type definitions for the content platform domain

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a content item
pub type ContentId = Uuid;

/// Identifier of a user account
pub type UserId = Uuid;

/// User role, ordered from most to least privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    Writer,
    User,
}

impl Role {
    /// Roles allowed to read population-wide analytics
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Superadmin | Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::Writer => "writer",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(Role::Superadmin),
            "admin" => Ok(Role::Admin),
            "writer" => Ok(Role::Writer),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A content item as seen by the engagement subsystem.
///
/// `view_count` is owned by the view tracker: it is only ever mutated through
/// [`crate::ContentStore::increment_view_count`], which backends implement as
/// an atomic in-place add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub title: String,
    pub author_id: UserId,
    pub tags: Vec<String>,
    pub view_count: u64,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

/// Public profile fields of an author, joined into popular-content results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub username: String,
    pub avatar_url: Option<String>,
}

/// One entry of a user's view history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub content_id: ContentId,
    pub viewed_at: DateTime<Utc>,
}

/// Engagement-relevant subset of a user account.
///
/// `view_history` is append-only and chronological. Repeat views of the same
/// content append new entries; the model treats them as distinct engagement
/// signals, not as a deduplicated set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub interests: Vec<String>,
    pub view_history: Vec<HistoryEntry>,
    pub last_login_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn author_profile(&self) -> AuthorProfile {
        AuthorProfile { username: self.username.clone(), avatar_url: self.avatar_url.clone() }
    }

    /// Content ids referenced by the view history, duplicates included
    pub fn viewed_content_ids(&self) -> Vec<ContentId> {
        self.view_history.iter().map(|entry| entry.content_id).collect()
    }
}

/// One observation of a content view, by a user or an anonymous visitor.
///
/// Immutable once created; the engagement subsystem never updates or deletes
/// view events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewEvent {
    pub id: Uuid,
    pub content_id: ContentId,
    pub viewer_id: Option<UserId>,
    pub viewed_at: DateTime<Utc>,
    pub duration_secs: Option<u32>,
}

impl ViewEvent {
    /// Create a view event stamped with the current time
    pub fn new(content_id: ContentId, viewer_id: Option<UserId>, duration_secs: Option<u32>) -> Self {
        Self { id: Uuid::new_v4(), content_id, viewer_id, viewed_at: Utc::now(), duration_secs }
    }
}

/// A single time-bucketed rollup value.
///
/// Computed fresh per query and never persisted. `total_duration_secs` is
/// populated for view rollups only; events without a recorded duration
/// contribute zero to the sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationBucket {
    pub bucket_key: String,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_secs: Option<u64>,
}
