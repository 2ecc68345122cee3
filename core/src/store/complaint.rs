//! Store methods for the complaint lifecycle.
//!
//! Each transition is one IMMEDIATE transaction: the status guard, the
//! ledger delta, the audit event, and (for approval) the milestone badge
//! inserts commit together. Taking the write lock up front also makes the
//! duplicate check-and-insert in `create_complaint` race-free across
//! connections: no second submission can slip between the radius scan and
//! the insert.

use crate::complaints::{self, ComplaintRecord, ComplaintStatus, PhotoRef};
use crate::config::{BadgeSpec, PointsConfig};
use crate::badges::{crossed_milestones, BadgeRecord};
use crate::dedup::DedupCheck;
use crate::error::{CoreError, CoreResult};
use crate::event::CoreEvent;
use crate::geo::GeoPoint;
use crate::ledger::{LedgerDelta, StatDeltas};
use rusqlite::params;

use super::CoreStore;

impl CoreStore {
    /// Duplicate-checked insert. The whole check-and-insert runs in one
    /// transaction; a hit within the radius/window fails `DuplicateReport`
    /// and writes nothing.
    pub fn create_complaint(&self, rec: &ComplaintRecord, check: &DedupCheck) -> CoreResult<()> {
        let tx = self.write_tx()?;

        let mut stmt = self.conn.prepare(
            "SELECT longitude, latitude FROM complaints
             WHERE reporter_id = ?1 AND created_at >= ?2
               AND latitude  BETWEEN ?3 AND ?4
               AND longitude BETWEEN ?5 AND ?6",
        )?;
        let candidates = stmt
            .query_map(
                params![
                    rec.reporter_id,
                    check.since_unix,
                    check.lat_min,
                    check.lat_max,
                    check.lon_min,
                    check.lon_max,
                ],
                |row| Ok(GeoPoint::new(row.get(0)?, row.get(1)?)),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);

        if candidates.iter().any(|p| check.within_radius(p)) {
            return Err(CoreError::DuplicateReport {
                radius_m: check.radius_m,
                window_hours: check.window_hours,
            });
        }

        self.conn.execute(
            "INSERT INTO complaints (
                complaint_id, reporter_id, photo_url, photo_handle,
                longitude, latitude, address, description,
                category, priority, status, points_awarded,
                upvotes, is_public, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, 0, ?12, ?13)",
            params![
                rec.complaint_id,
                rec.reporter_id,
                rec.photo.url,
                rec.photo.handle,
                rec.location.longitude,
                rec.location.latitude,
                rec.address,
                rec.description,
                rec.category.as_str(),
                rec.priority.as_str(),
                rec.status.as_str(),
                if rec.is_public { 1 } else { 0 },
                rec.created_at,
            ],
        )?;
        self.apply_ledger_delta(&rec.reporter_id, &LedgerDelta::stats_only(StatDeltas::filed()))?;
        self.append_event(
            &rec.reporter_id,
            rec.created_at,
            &CoreEvent::ComplaintFiled {
                complaint_id: rec.complaint_id.clone(),
                reporter_id: rec.reporter_id.clone(),
                category: rec.category.as_str().to_string(),
            },
        )?;

        tx.commit()?;
        Ok(())
    }

    pub fn get_complaint(&self, complaint_id: &str) -> CoreResult<ComplaintRecord> {
        self.conn
            .query_row(
                &format!("{COMPLAINT_SELECT} WHERE complaint_id = ?1"),
                params![complaint_id],
                complaint_row_mapper,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    CoreError::not_found("complaint", complaint_id)
                }
                other => other.into(),
            })
    }

    /// pending → approved. Computes the award from the complaint's category,
    /// priority, and upvote count as read inside the transaction, credits
    /// the reporter, and awards any milestone badge whose threshold was
    /// crossed by this approval.
    pub fn approve_complaint(
        &self,
        complaint_id: &str,
        reviewer_id: &str,
        points_cfg: &PointsConfig,
        milestones: &[&BadgeSpec],
        now: i64,
    ) -> CoreResult<(ComplaintRecord, Vec<BadgeRecord>)> {
        let tx = self.write_tx()?;

        let mut rec = self.get_complaint(complaint_id)?;
        require_status(&rec, ComplaintStatus::Pending, "pending")?;

        let points = complaints::award_points(points_cfg, rec.category, rec.priority, rec.upvotes);
        self.conn.execute(
            "UPDATE complaints
             SET status = 'approved', points_awarded = ?1, reviewer_id = ?2, reviewed_at = ?3
             WHERE complaint_id = ?4 AND status = 'pending'",
            params![points, reviewer_id, now, complaint_id],
        )?;

        let delta = LedgerDelta::credit(points, StatDeltas::approved());
        let receipt = self.apply_ledger_delta(&rec.reporter_id, &delta)?;

        let before = receipt.approved_before(&delta);
        let mut new_badges = Vec::new();
        for spec in crossed_milestones(milestones, before, receipt.approved_after) {
            if self.insert_badge_if_absent(&rec.reporter_id, &spec.name, &spec.icon, now)? {
                new_badges.push(BadgeRecord {
                    user_id: rec.reporter_id.clone(),
                    name: spec.name.clone(),
                    icon: spec.icon.clone(),
                    earned_at: now,
                });
            }
        }

        self.append_event(
            reviewer_id,
            now,
            &CoreEvent::ComplaintApproved {
                complaint_id: rec.complaint_id.clone(),
                reporter_id: rec.reporter_id.clone(),
                reviewer_id: reviewer_id.to_string(),
                points,
            },
        )?;
        for badge in &new_badges {
            self.append_event(
                reviewer_id,
                now,
                &CoreEvent::BadgeAwarded {
                    user_id: badge.user_id.clone(),
                    name: badge.name.clone(),
                },
            )?;
        }

        tx.commit()?;

        rec.status = ComplaintStatus::Approved;
        rec.points_awarded = points;
        rec.reviewer_id = Some(reviewer_id.to_string());
        rec.reviewed_at = Some(now);
        Ok((rec, new_badges))
    }

    /// pending → rejected. No points; stat counters move.
    pub fn reject_complaint(
        &self,
        complaint_id: &str,
        reviewer_id: &str,
        reason: &str,
        now: i64,
    ) -> CoreResult<ComplaintRecord> {
        let tx = self.write_tx()?;

        let mut rec = self.get_complaint(complaint_id)?;
        require_status(&rec, ComplaintStatus::Pending, "pending")?;

        self.conn.execute(
            "UPDATE complaints
             SET status = 'rejected', rejection_reason = ?1, reviewer_id = ?2, reviewed_at = ?3
             WHERE complaint_id = ?4 AND status = 'pending'",
            params![reason, reviewer_id, now, complaint_id],
        )?;
        self.apply_ledger_delta(&rec.reporter_id, &LedgerDelta::stats_only(StatDeltas::rejected()))?;
        self.append_event(
            reviewer_id,
            now,
            &CoreEvent::ComplaintRejected {
                complaint_id: rec.complaint_id.clone(),
                reviewer_id: reviewer_id.to_string(),
                reason: reason.to_string(),
            },
        )?;

        tx.commit()?;

        rec.status = ComplaintStatus::Rejected;
        rec.rejection_reason = Some(reason.to_string());
        rec.reviewer_id = Some(reviewer_id.to_string());
        rec.reviewed_at = Some(now);
        Ok(rec)
    }

    /// approved → cleaned. No ledger effect.
    pub fn attach_cleanup_proof(
        &self,
        complaint_id: &str,
        uploader_id: &str,
        photo_url: &str,
        notes: Option<&str>,
        now: i64,
    ) -> CoreResult<ComplaintRecord> {
        let tx = self.write_tx()?;

        let mut rec = self.get_complaint(complaint_id)?;
        require_status(&rec, ComplaintStatus::Approved, "approved")?;

        self.conn.execute(
            "UPDATE complaints
             SET status = 'cleaned', cleanup_photo_url = ?1, cleanup_uploader_id = ?2,
                 cleanup_notes = ?3, cleaned_at = ?4
             WHERE complaint_id = ?5 AND status = 'approved'",
            params![photo_url, uploader_id, notes, now, complaint_id],
        )?;
        self.append_event(
            uploader_id,
            now,
            &CoreEvent::ComplaintCleaned {
                complaint_id: rec.complaint_id.clone(),
                uploader_id: uploader_id.to_string(),
            },
        )?;

        tx.commit()?;

        rec.status = ComplaintStatus::Cleaned;
        rec.cleanup_photo_url = Some(photo_url.to_string());
        rec.cleanup_uploader_id = Some(uploader_id.to_string());
        rec.cleanup_notes = notes.map(String::from);
        rec.cleaned_at = Some(now);
        Ok(rec)
    }

    /// Toggle the voter's membership in the upvote set. Returns the new
    /// count and whether the voter's vote is now present.
    pub fn toggle_upvote(
        &self,
        complaint_id: &str,
        voter_id: &str,
        now: i64,
    ) -> CoreResult<(i64, bool)> {
        let tx = self.write_tx()?;

        // Existence check first so a vote on a missing id is NotFound.
        self.get_complaint(complaint_id)?;

        let removed = self.conn.execute(
            "DELETE FROM complaint_upvotes WHERE complaint_id = ?1 AND voter_id = ?2",
            params![complaint_id, voter_id],
        )?;

        let (upvotes, voted) = if removed > 0 {
            let n: i64 = self.conn.query_row(
                "UPDATE complaints SET upvotes = upvotes - 1
                 WHERE complaint_id = ?1 RETURNING upvotes",
                params![complaint_id],
                |row| row.get(0),
            )?;
            (n, false)
        } else {
            self.conn.execute(
                "INSERT INTO complaint_upvotes (complaint_id, voter_id, voted_at)
                 VALUES (?1, ?2, ?3)",
                params![complaint_id, voter_id, now],
            )?;
            let n: i64 = self.conn.query_row(
                "UPDATE complaints SET upvotes = upvotes + 1
                 WHERE complaint_id = ?1 RETURNING upvotes",
                params![complaint_id],
                |row| row.get(0),
            )?;
            (n, true)
        };

        self.append_event(
            voter_id,
            now,
            &CoreEvent::UpvoteToggled {
                complaint_id: complaint_id.to_string(),
                voter_id: voter_id.to_string(),
                voted,
                upvotes,
            },
        )?;

        tx.commit()?;
        Ok((upvotes, voted))
    }

    /// Owner removal of a pending complaint. Returns the photo handle so
    /// the caller can release the image asset after commit.
    pub fn delete_pending_complaint(
        &self,
        complaint_id: &str,
        owner_id: &str,
        now: i64,
    ) -> CoreResult<PhotoRef> {
        let tx = self.write_tx()?;

        let rec = self.get_complaint(complaint_id)?;
        if rec.reporter_id != owner_id {
            return Err(CoreError::forbidden(format!(
                "user '{owner_id}' does not own complaint '{complaint_id}'"
            )));
        }
        require_status(&rec, ComplaintStatus::Pending, "pending")?;

        // Upvote rows go with it via ON DELETE CASCADE.
        self.conn.execute(
            "DELETE FROM complaints WHERE complaint_id = ?1",
            params![complaint_id],
        )?;
        self.apply_ledger_delta(owner_id, &LedgerDelta::stats_only(StatDeltas::withdrawn()))?;
        self.append_event(
            owner_id,
            now,
            &CoreEvent::ComplaintDeleted {
                complaint_id: complaint_id.to_string(),
                owner_id: owner_id.to_string(),
            },
        )?;

        tx.commit()?;
        Ok(rec.photo)
    }

    // ── Read paths for the UI layer ────────────────────────────

    pub fn recent_public_complaints(&self, limit: usize) -> CoreResult<Vec<ComplaintRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLAINT_SELECT} WHERE is_public = 1 ORDER BY created_at DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit as i64], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn complaints_by_reporter(
        &self,
        reporter_id: &str,
        limit: usize,
    ) -> CoreResult<Vec<ComplaintRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLAINT_SELECT} WHERE reporter_id = ?1 ORDER BY created_at DESC LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![reporter_id, limit as i64], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Test / summary helpers ─────────────────────────────────

    pub fn complaint_count_by_status(&self, status: ComplaintStatus) -> CoreResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM complaints WHERE status = ?1",
                params![status.as_str()],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn upvote_row_count(&self, complaint_id: &str) -> CoreResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM complaint_upvotes WHERE complaint_id = ?1",
                params![complaint_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}

fn require_status(
    rec: &ComplaintRecord,
    expected: ComplaintStatus,
    expected_str: &'static str,
) -> CoreResult<()> {
    if rec.status != expected {
        return Err(CoreError::InvalidState {
            entity: "complaint",
            id: rec.complaint_id.clone(),
            expected: expected_str,
            actual: rec.status.as_str().to_string(),
        });
    }
    Ok(())
}

const COMPLAINT_SELECT: &str = "SELECT complaint_id, reporter_id, photo_url, photo_handle,
        longitude, latitude, address, description,
        category, priority, status, points_awarded,
        reviewer_id, reviewed_at, rejection_reason,
        cleanup_photo_url, cleanup_uploader_id, cleanup_notes, cleaned_at,
        upvotes, is_public, created_at
 FROM complaints";

fn complaint_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ComplaintRecord> {
    Ok(ComplaintRecord {
        complaint_id: row.get(0)?,
        reporter_id: row.get(1)?,
        photo: PhotoRef { url: row.get(2)?, handle: row.get(3)? },
        location: GeoPoint::new(row.get(4)?, row.get(5)?),
        address: row.get(6)?,
        description: row.get(7)?,
        category: super::parse_enum_col(8, row.get::<_, String>(8)?)?,
        priority: super::parse_enum_col(9, row.get::<_, String>(9)?)?,
        status: super::parse_enum_col(10, row.get::<_, String>(10)?)?,
        points_awarded: row.get(11)?,
        reviewer_id: row.get(12)?,
        reviewed_at: row.get(13)?,
        rejection_reason: row.get(14)?,
        cleanup_photo_url: row.get(15)?,
        cleanup_uploader_id: row.get(16)?,
        cleanup_notes: row.get(17)?,
        cleaned_at: row.get(18)?,
        upvotes: row.get(19)?,
        is_public: row.get::<_, i32>(20)? != 0,
        created_at: row.get(21)?,
    })
}
