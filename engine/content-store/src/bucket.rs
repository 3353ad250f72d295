//! Time-bucket truncation for rollup queries
//!
//! A bucket key is a deterministic truncation of a timestamp. The same
//! truncation rules are applied by every backend so that rollups computed in
//! SQL and in memory agree on keys.

use chrono::{DateTime, Datelike, Utc};

/// Rollup granularity for time-bucketed aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// `YYYY-MM-DD`
    Daily,
    /// `YYYY-Www`, ISO week of year
    Weekly,
    /// `YYYY-MM`
    Monthly,
}

impl Granularity {
    /// Parse a query-supplied period string.
    ///
    /// Unknown values fall back to daily rather than failing; a malformed
    /// query parameter still yields a sensible rollup.
    pub fn from_period(period: &str) -> Self {
        match period {
            "weekly" => Granularity::Weekly,
            "monthly" => Granularity::Monthly,
            _ => Granularity::Daily,
        }
    }

    /// Derive the bucket key for a timestamp
    pub fn bucket_key(&self, ts: DateTime<Utc>) -> String {
        match self {
            Granularity::Daily => ts.format("%Y-%m-%d").to_string(),
            Granularity::Weekly => {
                let week = ts.iso_week();
                format!("{:04}-W{:02}", week.year(), week.week())
            }
            Granularity::Monthly => ts.format("%Y-%m").to_string(),
        }
    }

    /// The equivalent Postgres `to_char` format string
    pub fn sql_format(&self) -> &'static str {
        match self {
            Granularity::Daily => "YYYY-MM-DD",
            Granularity::Weekly => "IYYY-\"W\"IW",
            Granularity::Monthly => "YYYY-MM",
        }
    }
}
