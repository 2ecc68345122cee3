//! Leaderboard and rank types plus the calendar/percentile arithmetic.
//!
//! Ranking is read-only: it aggregates complaints and user counters, never
//! mutates them. Ordering is deterministic everywhere: complaint count
//! descending, then points descending, then user id ascending — the same
//! key for the boards and for a single user's rank, so the two always
//! agree.

use crate::types::UserId;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardScope {
    /// Approved complaints created in the current calendar month.
    Monthly,
    /// All citizens by lifetime approved count.
    AllTime,
    /// All-time, restricted to users whose address city matches.
    Area { city: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub rank: i64,
    pub user_id: UserId,
    pub name: String,
    pub count: i64,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankSummary {
    /// 1-based rank, or None when the user is not in the ranked population.
    pub rank: Option<i64>,
    pub total_users: i64,
    pub percentile: Option<i64>,
}

/// Half-open [start, end) unix-second bounds of the calendar month
/// containing `now`.
pub fn month_bounds(now: DateTime<Utc>) -> (i64, i64) {
    let start = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .expect("first of month is always valid");
    let (next_year, next_month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .expect("first of month is always valid");
    (start.timestamp(), end.timestamp())
}

/// Percentile for 0-based index `i` in a population of `n`:
/// round(((n − i) / n) × 100). Index 0 → 100; last index → round(100/n).
pub fn percentile(index: i64, total: i64) -> i64 {
    debug_assert!(total > 0 && index < total);
    (((total - index) as f64 / total as f64) * 100.0).round() as i64
}

/// Assign 1-based ranks to rows already in ranking order.
pub fn assign_ranks(rows: Vec<(UserId, String, i64, i64)>) -> Vec<LeaderboardRow> {
    rows.into_iter()
        .enumerate()
        .map(|(i, (user_id, name, count, points))| LeaderboardRow {
            rank: (i + 1) as i64,
            user_id,
            name,
            count,
            points,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_cover_mid_month_instant() {
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 9, 30, 0).unwrap();
        let (start, end) = month_bounds(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap().timestamp());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap().timestamp());
        assert!(now.timestamp() >= start && now.timestamp() < end);
    }

    #[test]
    fn december_rolls_into_next_year() {
        let now = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap();
        let (_, end) = month_bounds(now);
        assert_eq!(end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap().timestamp());
    }

    #[test]
    fn percentile_reference_case() {
        // Population 100, 0-based index 4 (rank 5) -> 96.
        assert_eq!(percentile(4, 100), 96);
    }

    #[test]
    fn percentile_endpoints_are_monotonic() {
        assert_eq!(percentile(0, 100), 100);
        assert_eq!(percentile(99, 100), 1);
        assert_eq!(percentile(0, 3), 100);
        assert_eq!(percentile(2, 3), 33);
    }
}
