//! Audit events.
//!
//! Every committed transition appends one typed event to the audit_log
//! table with a JSON payload. Ops tooling reads them back by time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoreEvent {
    UserRegistered { user_id: String, role: String },
    ComplaintFiled { complaint_id: String, reporter_id: String, category: String },
    ComplaintApproved { complaint_id: String, reporter_id: String, reviewer_id: String, points: i64 },
    ComplaintRejected { complaint_id: String, reviewer_id: String, reason: String },
    ComplaintCleaned { complaint_id: String, uploader_id: String },
    ComplaintDeleted { complaint_id: String, owner_id: String },
    UpvoteToggled { complaint_id: String, voter_id: String, voted: bool, upvotes: i64 },
    BadgeAwarded { user_id: String, name: String },
    RedemptionRequested { redemption_id: String, user_id: String, points: i64 },
    RedemptionFulfilled { redemption_id: String, reviewer_id: String },
    RedemptionRejected { redemption_id: String, reviewer_id: String, reason: String },
}

/// Stable string name for the event_type column.
pub fn event_type_name(event: &CoreEvent) -> &'static str {
    match event {
        CoreEvent::UserRegistered { .. } => "user_registered",
        CoreEvent::ComplaintFiled { .. } => "complaint_filed",
        CoreEvent::ComplaintApproved { .. } => "complaint_approved",
        CoreEvent::ComplaintRejected { .. } => "complaint_rejected",
        CoreEvent::ComplaintCleaned { .. } => "complaint_cleaned",
        CoreEvent::ComplaintDeleted { .. } => "complaint_deleted",
        CoreEvent::UpvoteToggled { .. } => "upvote_toggled",
        CoreEvent::BadgeAwarded { .. } => "badge_awarded",
        CoreEvent::RedemptionRequested { .. } => "redemption_requested",
        CoreEvent::RedemptionFulfilled { .. } => "redemption_fulfilled",
        CoreEvent::RedemptionRejected { .. } => "redemption_rejected",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Option<i64>,
    pub occurred_at: i64,
    pub actor_id: String,
    pub event_type: String,
    pub payload: String,
}
