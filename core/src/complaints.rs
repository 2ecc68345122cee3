//! Complaint records and the lifecycle state machine's vocabulary.
//!
//! Status graph: pending → approved | rejected; approved → cleaned.
//! A pending complaint may also be deleted by its owner (a removal, not a
//! status). The transitions themselves commit in the store so that status,
//! award, stat deltas, and milestone badges land atomically; this module
//! owns the types and the point-award arithmetic.

use crate::config::PointsConfig;
use crate::geo::GeoPoint;
use crate::types::{ComplaintId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GarbagePile,
    OverflowingBin,
    IllegalDumping,
    BlockedDrain,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::GarbagePile => "garbage_pile",
            Category::OverflowingBin => "overflowing_bin",
            Category::IllegalDumping => "illegal_dumping",
            Category::BlockedDrain => "blocked_drain",
            Category::Other => "other",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "garbage_pile" => Ok(Category::GarbagePile),
            "overflowing_bin" => Ok(Category::OverflowingBin),
            "illegal_dumping" => Ok(Category::IllegalDumping),
            "blocked_drain" => Ok(Category::BlockedDrain),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    Approved,
    Rejected,
    Cleaned,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::Approved => "approved",
            ComplaintStatus::Rejected => "rejected",
            ComplaintStatus::Cleaned => "cleaned",
        }
    }
}

impl std::str::FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ComplaintStatus::Pending),
            "approved" => Ok(ComplaintStatus::Approved),
            "rejected" => Ok(ComplaintStatus::Rejected),
            "cleaned" => Ok(ComplaintStatus::Cleaned),
            other => Err(format!("unknown complaint status: {other}")),
        }
    }
}

/// Opaque reference into the external image store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhotoRef {
    pub url: String,
    pub handle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintRecord {
    pub complaint_id: ComplaintId,
    pub reporter_id: UserId,
    pub photo: PhotoRef,
    pub location: GeoPoint,
    pub address: Option<String>,
    pub description: Option<String>,
    pub category: Category,
    pub priority: Priority,
    pub status: ComplaintStatus,
    /// 0 until approval; set exactly once at the pending→approved
    /// transition and immutable afterwards.
    pub points_awarded: i64,
    pub reviewer_id: Option<UserId>,
    pub reviewed_at: Option<i64>,
    pub rejection_reason: Option<String>,
    pub cleanup_photo_url: Option<String>,
    pub cleanup_uploader_id: Option<UserId>,
    pub cleanup_notes: Option<String>,
    pub cleaned_at: Option<i64>,
    pub upvotes: i64,
    pub is_public: bool,
    pub created_at: i64,
}

/// Citizen submission input, as handed over by the request layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComplaint {
    pub location: GeoPoint,
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    pub photo: PhotoRef,
    pub description: Option<String>,
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

fn default_true() -> bool {
    true
}

/// The approval award: category base + priority bonus + upvote bonus.
pub fn award_points(
    points: &PointsConfig,
    category: Category,
    priority: Priority,
    upvotes: i64,
) -> i64 {
    points.category_base(category) + points.priority_bonus(priority) + points.upvote_bonus_for(upvotes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn award_formula_reference_case() {
        // illegal_dumping + urgent + 12 upvotes = 20 + 10 + 5.
        let cfg = PointsConfig::default();
        assert_eq!(award_points(&cfg, Category::IllegalDumping, Priority::Urgent, 12), 35);
    }

    #[test]
    fn upvote_bonus_requires_strictly_more_than_threshold() {
        let cfg = PointsConfig::default();
        assert_eq!(award_points(&cfg, Category::GarbagePile, Priority::Medium, 10), 10);
        assert_eq!(award_points(&cfg, Category::GarbagePile, Priority::Medium, 11), 15);
    }

    #[test]
    fn category_round_trip() {
        for s in ["garbage_pile", "overflowing_bin", "illegal_dumping", "blocked_drain", "other"] {
            let c: Category = s.parse().unwrap();
            assert_eq!(c.as_str(), s);
        }
        assert!("potholes".parse::<Category>().is_err());
    }
}
