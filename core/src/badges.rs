//! Badge engine: milestone crossing and the manual award path.
//!
//! Milestones are awarded on a crossing test — `previous < threshold <=
//! new` — evaluated inside the same transaction that moves the approved
//! counter. An equality test (`count == threshold`) would permanently miss
//! the badge if the counter ever jumped past the threshold.

use crate::config::BadgeSpec;
use crate::types::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BadgeRecord {
    pub user_id: UserId,
    pub name: String,
    pub icon: String,
    pub earned_at: i64,
}

/// Milestone badges whose threshold was crossed by moving the approved
/// counter from `before` to `after`.
pub fn crossed_milestones<'a>(
    milestones: &[&'a BadgeSpec],
    before: i64,
    after: i64,
) -> Vec<&'a BadgeSpec> {
    milestones
        .iter()
        .filter(|b| matches!(b.threshold, Some(t) if before < t && t <= after))
        .copied()
        .collect()
}

/// Milestone badges already earned at `count` — the backfill set used by
/// `check_auto_badges` to recover from any skipped evaluation.
pub fn earned_milestones<'a>(milestones: &[&'a BadgeSpec], count: i64) -> Vec<&'a BadgeSpec> {
    milestones
        .iter()
        .filter(|b| matches!(b.threshold, Some(t) if t <= count))
        .copied()
        .collect()
}

/// Result of the manual award path. An already-held badge is a no-op
/// outcome, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeAward {
    pub awarded: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewardConfig;

    #[test]
    fn single_step_crossing_awards_exactly_one() {
        let cfg = RewardConfig::default();
        let milestones = cfg.milestone_badges();
        let hit = crossed_milestones(&milestones, 9, 10);
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].name, "Clean Hero");
    }

    #[test]
    fn jump_past_threshold_still_awards() {
        // An external bulk increment moves 8 -> 12: equality would miss it.
        let cfg = RewardConfig::default();
        let milestones = cfg.milestone_badges();
        let hit = crossed_milestones(&milestones, 8, 12);
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].name, "Clean Hero");
    }

    #[test]
    fn no_recrossing_once_past() {
        let cfg = RewardConfig::default();
        let milestones = cfg.milestone_badges();
        assert!(crossed_milestones(&milestones, 10, 11).is_empty());
        assert!(crossed_milestones(&milestones, 11, 11).is_empty());
    }

    #[test]
    fn backfill_covers_everything_at_or_below_count() {
        let cfg = RewardConfig::default();
        let milestones = cfg.milestone_badges();
        let names: Vec<&str> =
            earned_milestones(&milestones, 50).iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["First Step", "Clean Hero", "City Champion"]);
    }
}
