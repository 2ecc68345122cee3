//! Store methods for users and the rewards ledger.
//!
//! `apply_ledger_delta` is the ONLY path that moves balances or stat
//! counters. It is a single guarded UPDATE with a RETURNING clause: the
//! increment happens inside SQLite, the balance floor is enforced in the
//! WHERE clause, and the post-commit counters come back from the same
//! statement — no read-modify-write window exists.

use crate::error::{CoreError, CoreResult};
use crate::event::CoreEvent;
use crate::ledger::{LedgerDelta, LedgerReceipt};
use crate::users::UserRecord;
use rusqlite::{params, OptionalExtension};

use super::CoreStore;

impl CoreStore {
    pub fn insert_user(&self, u: &UserRecord) -> CoreResult<()> {
        let tx = self.write_tx()?;
        self.conn.execute(
            "INSERT INTO users (
                user_id, name, role, city,
                reward_points, total_points_earned,
                total_complaints, approved_complaints, rejected_complaints, pending_complaints,
                is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                u.user_id,
                u.name,
                u.role.as_str(),
                u.city,
                u.reward_points,
                u.total_points_earned,
                u.total_complaints,
                u.approved_complaints,
                u.rejected_complaints,
                u.pending_complaints,
                if u.is_active { 1 } else { 0 },
                u.created_at,
            ],
        )?;
        self.append_event(
            &u.user_id,
            u.created_at,
            &CoreEvent::UserRegistered {
                user_id: u.user_id.clone(),
                role: u.role.as_str().to_string(),
            },
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn try_get_user(&self, user_id: &str) -> CoreResult<Option<UserRecord>> {
        let user = self
            .conn
            .query_row(
                "SELECT user_id, name, role, city,
                        reward_points, total_points_earned,
                        total_complaints, approved_complaints, rejected_complaints,
                        pending_complaints, is_active, created_at
                 FROM users WHERE user_id = ?1",
                params![user_id],
                user_row_mapper,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user(&self, user_id: &str) -> CoreResult<UserRecord> {
        self.try_get_user(user_id)?
            .ok_or_else(|| CoreError::not_found("user", user_id))
    }

    pub fn set_user_active(&self, user_id: &str, active: bool) -> CoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET is_active = ?1 WHERE user_id = ?2",
            params![if active { 1 } else { 0 }, user_id],
        )?;
        if changed == 0 {
            return Err(CoreError::not_found("user", user_id));
        }
        Ok(())
    }

    /// Apply one ledger delta atomically. Fails `InsufficientPoints` when a
    /// debit would push the balance below zero, `NotFound` when the user
    /// does not exist; in both cases nothing is written.
    pub fn apply_ledger_delta(
        &self,
        user_id: &str,
        delta: &LedgerDelta,
    ) -> CoreResult<LedgerReceipt> {
        let receipt = self
            .conn
            .query_row(
                "UPDATE users SET
                    reward_points       = reward_points + ?1,
                    total_points_earned = total_points_earned + ?2,
                    total_complaints    = total_complaints + ?3,
                    approved_complaints = approved_complaints + ?4,
                    rejected_complaints = rejected_complaints + ?5,
                    pending_complaints  = pending_complaints + ?6
                 WHERE user_id = ?7 AND reward_points + ?1 >= 0
                 RETURNING reward_points, total_points_earned, approved_complaints",
                params![
                    delta.balance_delta(),
                    delta.lifetime_delta(),
                    delta.stats.total,
                    delta.stats.approved,
                    delta.stats.rejected,
                    delta.stats.pending,
                    user_id,
                ],
                |row| {
                    Ok(LedgerReceipt {
                        reward_points: row.get(0)?,
                        total_points_earned: row.get(1)?,
                        approved_after: row.get(2)?,
                    })
                },
            )
            .optional()?;

        match receipt {
            Some(r) => {
                log::debug!(
                    "ledger {user_id}: balance={} lifetime={} ({:+})",
                    r.reward_points,
                    r.total_points_earned,
                    delta.balance_delta(),
                );
                Ok(r)
            }
            None => match self.try_get_user(user_id)? {
                Some(u) => Err(CoreError::InsufficientPoints {
                    requested: delta.points,
                    available: u.reward_points,
                }),
                None => Err(CoreError::not_found("user", user_id)),
            },
        }
    }
}

fn user_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user_id: row.get(0)?,
        name: row.get(1)?,
        role: super::parse_enum_col(2, row.get::<_, String>(2)?)?,
        city: row.get(3)?,
        reward_points: row.get(4)?,
        total_points_earned: row.get(5)?,
        total_complaints: row.get(6)?,
        approved_complaints: row.get(7)?,
        rejected_complaints: row.get(8)?,
        pending_complaints: row.get(9)?,
        is_active: row.get::<_, i32>(10)? != 0,
        created_at: row.get(11)?,
    })
}
