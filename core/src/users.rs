//! User records. The ledger fields (`reward_points`, `total_points_earned`)
//! and the stat counters are mutated only through `LedgerDelta` application
//! in the store — never written directly by callers.

use crate::badges::BadgeRecord;
use crate::types::{Role, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub name: String,
    pub role: Role,
    pub city: String,
    /// Spendable balance. Never negative.
    pub reward_points: i64,
    /// Lifetime earnings. Monotonically non-decreasing.
    pub total_points_earned: i64,
    pub total_complaints: i64,
    pub approved_complaints: i64,
    pub rejected_complaints: i64,
    pub pending_complaints: i64,
    pub is_active: bool,
    pub created_at: i64,
}

/// Everything the profile screen needs in one read.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user: UserRecord,
    pub badges: Vec<BadgeRecord>,
}
