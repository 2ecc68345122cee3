//! Redemption records and the points→reward conversion.
//!
//! Escrow discipline: the requested points are debited (held) when the
//! request is created, refunded if an admin rejects it, and simply kept
//! when fulfillment succeeds. A pending redemption therefore can never
//! overdraft at finalization — the funds left the spendable balance up
//! front.

use crate::config::RedemptionConfig;
use crate::error::{CoreError, CoreResult};
use crate::types::{RedemptionId, UserId};
use serde::{Deserialize, Serialize};

/// Closed reward catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    GiftVoucher,
    MobileRecharge,
    BillDiscount,
    TreeDonation,
}

impl RewardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardType::GiftVoucher => "gift_voucher",
            RewardType::MobileRecharge => "mobile_recharge",
            RewardType::BillDiscount => "bill_discount",
            RewardType::TreeDonation => "tree_donation",
        }
    }
}

impl std::str::FromStr for RewardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gift_voucher" => Ok(RewardType::GiftVoucher),
            "mobile_recharge" => Ok(RewardType::MobileRecharge),
            "bill_discount" => Ok(RewardType::BillDiscount),
            "tree_donation" => Ok(RewardType::TreeDonation),
            other => Err(format!("unknown reward type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Pending,
    Approved,
    Rejected,
    Fulfilled,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::Pending => "pending",
            RedemptionStatus::Approved => "approved",
            RedemptionStatus::Rejected => "rejected",
            RedemptionStatus::Fulfilled => "fulfilled",
        }
    }
}

impl std::str::FromStr for RedemptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RedemptionStatus::Pending),
            "approved" => Ok(RedemptionStatus::Approved),
            "rejected" => Ok(RedemptionStatus::Rejected),
            "fulfilled" => Ok(RedemptionStatus::Fulfilled),
            other => Err(format!("unknown redemption status: {other}")),
        }
    }
}

/// Delivery details recorded at fulfillment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub voucher_code: String,
    /// Unix seconds; filled from config's validity window when absent.
    pub voucher_expiry: Option<i64>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionRecord {
    pub redemption_id: RedemptionId,
    pub user_id: UserId,
    pub points_redeemed: i64,
    pub reward_type: RewardType,
    /// points / conversion rate, fixed at creation; never recomputed.
    pub reward_value: f64,
    pub status: RedemptionStatus,
    pub contact: String,
    pub voucher_code: Option<String>,
    pub voucher_expiry: Option<i64>,
    pub delivery_instructions: Option<String>,
    pub rejection_reason: Option<String>,
    pub reviewer_id: Option<UserId>,
    pub reviewed_at: Option<i64>,
    pub created_at: i64,
}

/// Validate the requested amount against the configured minimum and derive
/// the currency value.
pub fn reward_value_for(config: &RedemptionConfig, points: i64) -> CoreResult<f64> {
    if points < config.min_points {
        return Err(CoreError::BelowMinimum { requested: points, minimum: config.min_points });
    }
    Ok(points as f64 / config.points_per_unit as f64)
}
