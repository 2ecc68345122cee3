//! Store methods for badges.

use crate::badges::BadgeRecord;
use crate::error::CoreResult;
use crate::event::CoreEvent;
use rusqlite::params;

use super::CoreStore;

impl CoreStore {
    /// Conflict-ignoring insert: returns true only when the badge row was
    /// actually created. The (user_id, name) primary key makes every award
    /// path idempotent. Bare primitive — the approval transaction calls it
    /// with its own transaction already open and audits alongside.
    pub fn insert_badge_if_absent(
        &self,
        user_id: &str,
        name: &str,
        icon: &str,
        earned_at: i64,
    ) -> CoreResult<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO badges (user_id, name, icon, earned_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, name) DO NOTHING",
            params![user_id, name, icon, earned_at],
        )?;
        Ok(inserted > 0)
    }

    /// Standalone award (manual path, backfill): badge row and audit event
    /// commit together. A held badge awards nothing and logs nothing.
    pub fn award_badge_audited(
        &self,
        actor_id: &str,
        user_id: &str,
        name: &str,
        icon: &str,
        earned_at: i64,
    ) -> CoreResult<bool> {
        let tx = self.write_tx()?;
        let inserted = self.insert_badge_if_absent(user_id, name, icon, earned_at)?;
        if inserted {
            self.append_event(
                actor_id,
                earned_at,
                &CoreEvent::BadgeAwarded {
                    user_id: user_id.to_string(),
                    name: name.to_string(),
                },
            )?;
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn badges_for_user(&self, user_id: &str) -> CoreResult<Vec<BadgeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, name, icon, earned_at FROM badges
             WHERE user_id = ?1 ORDER BY earned_at ASC, name ASC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(BadgeRecord {
                user_id: row.get(0)?,
                name: row.get(1)?,
                icon: row.get(2)?,
                earned_at: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn has_badge(&self, user_id: &str, name: &str) -> CoreResult<bool> {
        self.conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM badges WHERE user_id = ?1 AND name = ?2",
                params![user_id, name],
                |row| row.get::<_, i64>(0).map(|c| c > 0),
            )
            .map_err(Into::into)
    }

    pub fn badge_count(&self, user_id: &str) -> CoreResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM badges WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
