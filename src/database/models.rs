//! Data structures mirroring the SQLite tables.

use sqlx::FromRow;

/// Seconds a computed value stays fresh (7 days).
pub const STALENESS_WINDOW_SECS: i64 = 24 * 7 * 60 * 60;

/// One cached pp value. At most one row exists per `content_hash`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PerformanceRecord {
    pub id: i64,
    pub content_hash: String, // MD5 of the .osu file
    pub resource_id: Option<u32>,
    pub performance_value: f64,
    pub accuracy_percent: f64,
    pub modifier_flags: u32,
    pub last_computed_at: i64, // Unix timestamp of the last computation
}

impl PerformanceRecord {
    /// Age in seconds relative to `now` (unix seconds).
    pub fn age_secs(&self, now: i64) -> i64 {
        now - self.last_computed_at
    }

    /// A record is fresh while it is younger than the staleness window.
    /// A record exactly one window old is stale.
    pub fn is_fresh(&self, now: i64) -> bool {
        self.age_secs(now) < STALENESS_WINDOW_SECS
    }
}

/// Values written by a (re)computation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPerformance {
    pub content_hash: String,
    pub resource_id: Option<u32>,
    pub performance_value: f64,
    pub accuracy_percent: f64,
    pub modifier_flags: u32,
    pub computed_at: i64,
}
