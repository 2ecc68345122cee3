//! Store methods for the redemption workflow.
//!
//! The hold is taken in the same transaction that creates the request:
//! once a pending redemption row exists, its points have already left the
//! requester's spendable balance. Rejection refunds in the transaction
//! that flips the status, fulfillment only records delivery.

use crate::error::{CoreError, CoreResult};
use crate::event::CoreEvent;
use crate::ledger::LedgerDelta;
use crate::redemptions::{DeliveryDetails, RedemptionRecord, RedemptionStatus};
use rusqlite::params;

use super::CoreStore;

impl CoreStore {
    /// Insert a pending redemption and debit the hold atomically.
    /// `InsufficientPoints` from the debit rolls the whole request back.
    pub fn create_redemption_with_hold(&self, rec: &RedemptionRecord) -> CoreResult<()> {
        let tx = self.write_tx()?;

        self.apply_ledger_delta(&rec.user_id, &LedgerDelta::debit(rec.points_redeemed))?;
        self.conn.execute(
            "INSERT INTO redemptions (
                redemption_id, user_id, points_redeemed, reward_type, reward_value,
                status, contact, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                rec.redemption_id,
                rec.user_id,
                rec.points_redeemed,
                rec.reward_type.as_str(),
                rec.reward_value,
                rec.status.as_str(),
                rec.contact,
                rec.created_at,
            ],
        )?;
        self.append_event(
            &rec.user_id,
            rec.created_at,
            &CoreEvent::RedemptionRequested {
                redemption_id: rec.redemption_id.clone(),
                user_id: rec.user_id.clone(),
                points: rec.points_redeemed,
            },
        )?;

        tx.commit()?;
        Ok(())
    }

    pub fn get_redemption(&self, redemption_id: &str) -> CoreResult<RedemptionRecord> {
        self.conn
            .query_row(
                &format!("{REDEMPTION_SELECT} WHERE redemption_id = ?1"),
                params![redemption_id],
                redemption_row_mapper,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    CoreError::not_found("redemption", redemption_id)
                }
                other => other.into(),
            })
    }

    /// pending → fulfilled. The hold becomes final; only delivery details
    /// and the review trail are written.
    pub fn fulfill_redemption(
        &self,
        redemption_id: &str,
        reviewer_id: &str,
        delivery: &DeliveryDetails,
        now: i64,
    ) -> CoreResult<RedemptionRecord> {
        let tx = self.write_tx()?;

        let mut rec = self.get_redemption(redemption_id)?;
        require_status(&rec, RedemptionStatus::Pending, "pending")?;

        self.conn.execute(
            "UPDATE redemptions
             SET status = 'fulfilled', voucher_code = ?1, voucher_expiry = ?2,
                 delivery_instructions = ?3, reviewer_id = ?4, reviewed_at = ?5
             WHERE redemption_id = ?6 AND status = 'pending'",
            params![
                delivery.voucher_code,
                delivery.voucher_expiry,
                delivery.instructions,
                reviewer_id,
                now,
                redemption_id,
            ],
        )?;
        self.append_event(
            reviewer_id,
            now,
            &CoreEvent::RedemptionFulfilled {
                redemption_id: rec.redemption_id.clone(),
                reviewer_id: reviewer_id.to_string(),
            },
        )?;

        tx.commit()?;

        rec.status = RedemptionStatus::Fulfilled;
        rec.voucher_code = Some(delivery.voucher_code.clone());
        rec.voucher_expiry = delivery.voucher_expiry;
        rec.delivery_instructions = delivery.instructions.clone();
        rec.reviewer_id = Some(reviewer_id.to_string());
        rec.reviewed_at = Some(now);
        Ok(rec)
    }

    /// pending → rejected, refunding the held points in the same
    /// transaction. The refund moves only the spendable balance.
    pub fn reject_redemption(
        &self,
        redemption_id: &str,
        reviewer_id: &str,
        reason: &str,
        now: i64,
    ) -> CoreResult<RedemptionRecord> {
        let tx = self.write_tx()?;

        let mut rec = self.get_redemption(redemption_id)?;
        require_status(&rec, RedemptionStatus::Pending, "pending")?;

        self.conn.execute(
            "UPDATE redemptions
             SET status = 'rejected', rejection_reason = ?1, reviewer_id = ?2, reviewed_at = ?3
             WHERE redemption_id = ?4 AND status = 'pending'",
            params![reason, reviewer_id, now, redemption_id],
        )?;
        self.apply_ledger_delta(&rec.user_id, &LedgerDelta::refund(rec.points_redeemed))?;
        self.append_event(
            reviewer_id,
            now,
            &CoreEvent::RedemptionRejected {
                redemption_id: rec.redemption_id.clone(),
                reviewer_id: reviewer_id.to_string(),
                reason: reason.to_string(),
            },
        )?;

        tx.commit()?;

        rec.status = RedemptionStatus::Rejected;
        rec.rejection_reason = Some(reason.to_string());
        rec.reviewer_id = Some(reviewer_id.to_string());
        rec.reviewed_at = Some(now);
        Ok(rec)
    }

    pub fn redemptions_by_user(&self, user_id: &str) -> CoreResult<Vec<RedemptionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REDEMPTION_SELECT} WHERE user_id = ?1 ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map(params![user_id], redemption_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// The admin review queue, oldest first.
    pub fn pending_redemptions(&self, limit: usize) -> CoreResult<Vec<RedemptionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REDEMPTION_SELECT} WHERE status = 'pending' ORDER BY created_at ASC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit as i64], redemption_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn require_status(
    rec: &RedemptionRecord,
    expected: RedemptionStatus,
    expected_str: &'static str,
) -> CoreResult<()> {
    if rec.status != expected {
        return Err(CoreError::InvalidState {
            entity: "redemption",
            id: rec.redemption_id.clone(),
            expected: expected_str,
            actual: rec.status.as_str().to_string(),
        });
    }
    Ok(())
}

const REDEMPTION_SELECT: &str = "SELECT redemption_id, user_id, points_redeemed, reward_type, reward_value,
        status, contact, voucher_code, voucher_expiry, delivery_instructions,
        rejection_reason, reviewer_id, reviewed_at, created_at
 FROM redemptions";

fn redemption_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<RedemptionRecord> {
    Ok(RedemptionRecord {
        redemption_id: row.get(0)?,
        user_id: row.get(1)?,
        points_redeemed: row.get(2)?,
        reward_type: super::parse_enum_col(3, row.get::<_, String>(3)?)?,
        reward_value: row.get(4)?,
        status: super::parse_enum_col(5, row.get::<_, String>(5)?)?,
        contact: row.get(6)?,
        voucher_code: row.get(7)?,
        voucher_expiry: row.get(8)?,
        delivery_instructions: row.get(9)?,
        rejection_reason: row.get(10)?,
        reviewer_id: row.get(11)?,
        reviewed_at: row.get(12)?,
        created_at: row.get(13)?,
    })
}
