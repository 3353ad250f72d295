//! # AnalyticsEngine
//!
//! On-demand engagement rollups over the event log and the user and content
//! collections: time-bucketed view and registration trends, popular content,
//! active-user counts, and role distribution.
//!
//! Every operation is a pure read. Rollups are computed fresh per query and
//! never cached; a read may observe state older than a concurrent write
//! (eventual consistency, no read-your-writes).

pub mod aggregation;
pub mod error;
pub mod query;

pub use error::{AnalyticsError, Result};
pub use query::PopularContent;

use content_store::{ContentStore, EventStore, UserStore};
use std::sync::Arc;

/// Read-only analytics over the platform's engagement state
pub struct AnalyticsEngine {
    events: Arc<dyn EventStore>,
    users: Arc<dyn UserStore>,
    content: Arc<dyn ContentStore>,
}

impl AnalyticsEngine {
    pub fn new(
        events: Arc<dyn EventStore>,
        users: Arc<dyn UserStore>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self { events, users, content }
    }

    pub(crate) fn events(&self) -> &dyn EventStore {
        self.events.as_ref()
    }

    pub(crate) fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub(crate) fn content(&self) -> &dyn ContentStore {
        self.content.as_ref()
    }
}
