//! Read-only ranking queries.
//!
//! All four surfaces (monthly, all-time, area, single-user rank) use the
//! same ordering key — count desc, points desc, user id asc — so a user's
//! reported rank always matches their leaderboard position.

use crate::error::CoreResult;
use crate::types::UserId;
use crate::users::UserRecord;
use rusqlite::params;

use super::CoreStore;

/// (user_id, display name, complaint count, points) in ranking order.
pub type RankedRow = (UserId, String, i64, i64);

impl CoreStore {
    /// Approved complaints created inside [start, end), grouped by
    /// reporter. Counts complaints, sums the awards.
    pub fn monthly_leaderboard(
        &self,
        start_unix: i64,
        end_unix: i64,
        limit: usize,
    ) -> CoreResult<Vec<RankedRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.reporter_id, u.name, COUNT(*) AS cnt,
                    COALESCE(SUM(c.points_awarded), 0) AS pts
             FROM complaints c
             JOIN users u ON u.user_id = c.reporter_id
             WHERE c.status = 'approved'
               AND c.created_at >= ?1 AND c.created_at < ?2
             GROUP BY c.reporter_id, u.name
             ORDER BY cnt DESC, pts DESC, c.reporter_id ASC
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![start_unix, end_unix, limit as i64], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Citizens by lifetime approved count, optionally restricted to one
    /// city.
    pub fn alltime_leaderboard(
        &self,
        city: Option<&str>,
        limit: usize,
    ) -> CoreResult<Vec<RankedRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, name, approved_complaints, total_points_earned
             FROM users
             WHERE role = 'citizen' AND (?1 IS NULL OR city = ?1)
             ORDER BY approved_complaints DESC, total_points_earned DESC, user_id ASC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![city, limit as i64], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn citizen_count(&self) -> CoreResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM users WHERE role = 'citizen'", [], |row| {
                row.get(0)
            })
            .map_err(Into::into)
    }

    /// 0-based position of `user` in the all-time ordering: the number of
    /// citizens ranked strictly ahead of them.
    pub fn rank_index_for(&self, user: &UserRecord) -> CoreResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM users
                 WHERE role = 'citizen' AND (
                     approved_complaints > ?1
                     OR (approved_complaints = ?1 AND total_points_earned > ?2)
                     OR (approved_complaints = ?1 AND total_points_earned = ?2
                         AND user_id < ?3))",
                params![user.approved_complaints, user.total_points_earned, user.user_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
