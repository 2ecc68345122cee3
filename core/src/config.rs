//! Reward economy configuration.
//!
//! Compiled-in defaults match the city programme's published point tables.
//! Every table can be overridden from a JSON document (ops tooling passes
//! `--config`); unspecified sections keep their defaults.

use crate::complaints::{Category, Priority};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Point award tables for complaint approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    pub garbage_pile: i64,
    pub overflowing_bin: i64,
    pub illegal_dumping: i64,
    pub blocked_drain: i64,
    pub other: i64,
    pub urgent_bonus: i64,
    pub high_bonus: i64,
    pub medium_bonus: i64,
    pub low_bonus: i64,
    /// Flat bonus applied when upvotes exceed `upvote_threshold`.
    pub upvote_bonus: i64,
    pub upvote_threshold: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            garbage_pile: 10,
            overflowing_bin: 10,
            illegal_dumping: 20,
            blocked_drain: 15,
            other: 5,
            urgent_bonus: 10,
            high_bonus: 5,
            medium_bonus: 0,
            low_bonus: 0,
            upvote_bonus: 5,
            upvote_threshold: 10,
        }
    }
}

impl PointsConfig {
    pub fn category_base(&self, category: Category) -> i64 {
        match category {
            Category::GarbagePile => self.garbage_pile,
            Category::OverflowingBin => self.overflowing_bin,
            Category::IllegalDumping => self.illegal_dumping,
            Category::BlockedDrain => self.blocked_drain,
            Category::Other => self.other,
        }
    }

    pub fn priority_bonus(&self, priority: Priority) -> i64 {
        match priority {
            Priority::Urgent => self.urgent_bonus,
            Priority::High => self.high_bonus,
            Priority::Medium => self.medium_bonus,
            Priority::Low => self.low_bonus,
        }
    }

    pub fn upvote_bonus_for(&self, upvotes: i64) -> i64 {
        if upvotes > self.upvote_threshold {
            self.upvote_bonus
        } else {
            0
        }
    }
}

/// Duplicate-filter policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub radius_m: f64,
    pub window_hours: i64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { radius_m: 50.0, window_hours: 24 }
    }
}

/// Redemption economy constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedemptionConfig {
    /// Points per one unit of reward currency.
    pub points_per_unit: i64,
    pub min_points: i64,
    /// Vouchers issued on fulfillment expire after this many days.
    pub voucher_valid_days: i64,
}

impl Default for RedemptionConfig {
    fn default() -> Self {
        Self { points_per_unit: 10, min_points: 100, voucher_valid_days: 90 }
    }
}

/// One catalog badge. Milestone badges carry a threshold on the user's
/// approved-complaint counter; manual badges have none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeSpec {
    pub name: String,
    pub icon: String,
    pub description: String,
    #[serde(default)]
    pub threshold: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub points: PointsConfig,
    pub dedup: DedupConfig,
    pub redemption: RedemptionConfig,
    pub badges: Vec<BadgeSpec>,
    pub max_description_len: usize,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            points: PointsConfig::default(),
            dedup: DedupConfig::default(),
            redemption: RedemptionConfig::default(),
            badges: default_badge_catalog(),
            max_description_len: 2000,
        }
    }
}

impl RewardConfig {
    /// Parse a JSON override document. Missing sections fall back to
    /// defaults via `#[serde(default)]`.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: RewardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.dedup.radius_m <= 0.0 {
            return Err(CoreError::validation("dedup.radius_m must be positive"));
        }
        if self.dedup.window_hours <= 0 {
            return Err(CoreError::validation("dedup.window_hours must be positive"));
        }
        if self.redemption.points_per_unit <= 0 {
            return Err(CoreError::validation("redemption.points_per_unit must be positive"));
        }
        if self.redemption.min_points <= 0 {
            return Err(CoreError::validation("redemption.min_points must be positive"));
        }
        if self.badges.is_empty() {
            return Err(CoreError::validation("badge catalog must not be empty"));
        }
        Ok(())
    }

    pub fn find_badge(&self, name: &str) -> Option<&BadgeSpec> {
        self.badges.iter().find(|b| b.name == name)
    }

    /// Catalog badges that carry a milestone threshold, ascending.
    pub fn milestone_badges(&self) -> Vec<&BadgeSpec> {
        let mut milestones: Vec<&BadgeSpec> =
            self.badges.iter().filter(|b| b.threshold.is_some()).collect();
        milestones.sort_by_key(|b| b.threshold);
        milestones
    }
}

fn default_badge_catalog() -> Vec<BadgeSpec> {
    let badge = |name: &str, icon: &str, description: &str, threshold: Option<i64>| BadgeSpec {
        name: name.to_string(),
        icon: icon.to_string(),
        description: description.to_string(),
        threshold,
    };
    vec![
        badge("First Step", "seedling", "First approved report", Some(1)),
        badge("Clean Hero", "shield", "10 approved reports", Some(10)),
        badge("City Champion", "trophy", "50 approved reports", Some(50)),
        badge("Eco Warrior", "globe", "100 approved reports", Some(100)),
        badge("Top Contributor", "star", "Awarded to monthly leaderboard winners", None),
        badge("Consistency King", "crown", "Awarded for sustained reporting streaks", None),
    ]
}
