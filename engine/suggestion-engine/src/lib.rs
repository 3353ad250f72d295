//! # SuggestionEngine
//!
//! Personalized content suggestions. A user's explicit `interests` take
//! absolute precedence as the tag-affinity set; only when they are empty is
//! affinity derived from the tags of previously viewed content. Candidates
//! matching the affinity are sampled randomly, so two calls with identical
//! inputs agree on the candidate *set* but not necessarily on the sampled
//! subset.

pub mod error;

pub use error::{Result, SuggestionError};

use content_store::{ContentId, ContentItem, ContentStore, UserId, UserRecord, UserStore};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Default number of suggestions per request
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// A suggested content item. Transient; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationCandidate {
    pub content_id: ContentId,
    pub title: String,
    pub tags: Vec<String>,
    pub view_count: u64,
}

impl From<ContentItem> for RecommendationCandidate {
    fn from(item: ContentItem) -> Self {
        Self { content_id: item.id, title: item.title, tags: item.tags, view_count: item.view_count }
    }
}

/// Computes personalized suggestions from a user's interest signals
pub struct SuggestionEngine {
    users: Arc<dyn UserStore>,
    content: Arc<dyn ContentStore>,
}

impl SuggestionEngine {
    pub fn new(users: Arc<dyn UserStore>, content: Arc<dyn ContentStore>) -> Self {
        Self { users, content }
    }

    /// Suggest up to `sample_size` (default 10) unseen content items for
    /// `user_id`.
    ///
    /// Returns an unordered random sample, without replacement, of the
    /// candidate set: content whose tags intersect the user's tag-affinity
    /// set, minus everything already in their view history. A user with no
    /// interests and no history gets an empty result, not an error.
    pub async fn suggest(
        &self,
        user_id: UserId,
        sample_size: Option<usize>,
    ) -> Result<Vec<RecommendationCandidate>> {
        let size = sample_size.unwrap_or(DEFAULT_SAMPLE_SIZE);
        if size == 0 {
            return Err(SuggestionError::InvalidArgument(
                "sample size must be positive".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(SuggestionError::UserNotFound(user_id))?;

        let affinity = self.tag_affinity(&user).await?;
        if affinity.is_empty() {
            // no signal at all: empty result, no popularity fallback
            tracing::debug!(%user_id, "no interest signal, returning no suggestions");
            return Ok(Vec::new());
        }

        // exclusion is by content identity, not by tag: items sharing tags
        // with viewed content stay eligible
        let viewed = user.viewed_content_ids();
        let mut candidates = self.content.find_by_tag_intersection(&affinity, &viewed).await?;

        let mut rng = rand::thread_rng();
        candidates.shuffle(&mut rng);
        candidates.truncate(size);

        Ok(candidates.into_iter().map(RecommendationCandidate::from).collect())
    }

    /// The user's tag-affinity set: explicit interests when present,
    /// otherwise the union of tags across viewed content.
    async fn tag_affinity(&self, user: &UserRecord) -> Result<Vec<String>> {
        if !user.interests.is_empty() {
            return Ok(user.interests.clone());
        }

        if user.view_history.is_empty() {
            return Ok(Vec::new());
        }

        let viewed_ids: Vec<ContentId> =
            user.view_history.iter().map(|entry| entry.content_id).collect();
        let viewed = self.content.find_by_ids(&viewed_ids).await?;

        let tags: BTreeSet<String> =
            viewed.into_iter().flat_map(|item| item.tags).collect();
        Ok(tags.into_iter().collect())
    }
}
