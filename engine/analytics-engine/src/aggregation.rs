//! Time-bucketed rollups
//!
//! Views group by `viewed_at`, registrations by `created_at`. The period
//! string from the query layer is parsed permissively: `daily`, `weekly`
//! and `monthly` select their granularity, anything else falls back to
//! daily rather than failing.

use crate::error::Result;
use crate::AnalyticsEngine;
use content_store::{AggregationBucket, Granularity};

impl AnalyticsEngine {
    /// View counts and watch-duration sums per time bucket, bucket key
    /// ascending
    pub async fn views_over_time(&self, period: &str) -> Result<Vec<AggregationBucket>> {
        let granularity = Granularity::from_period(period);
        tracing::debug!(?granularity, "computing view rollup");
        Ok(self.events().views_by_bucket(granularity).await?)
    }

    /// Registration counts per time bucket, bucket key ascending
    pub async fn registrations_over_time(&self, period: &str) -> Result<Vec<AggregationBucket>> {
        let granularity = Granularity::from_period(period);
        tracing::debug!(?granularity, "computing registration rollup");
        Ok(self.users().registrations_by_bucket(granularity).await?)
    }
}
