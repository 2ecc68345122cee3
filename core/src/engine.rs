//! The rewards engine — the single entry point for every operation.
//!
//! RULES:
//!   - Authorization (role + ownership) is checked here, before any write.
//!   - The store commits each transition atomically — status, ledger
//!     delta, badges, and the audit event in one transaction; the engine
//!     never splits a transition across store calls.
//!   - Time comes from the injected Clock, never from Utc::now().

use crate::{
    badges::{earned_milestones, BadgeAward, BadgeRecord},
    clock::{Clock, ManualClock, SystemClock},
    complaints::{ComplaintRecord, NewComplaint},
    config::RewardConfig,
    error::{CoreError, CoreResult},
    images::{ImageStore, NoopImageStore},
    rankings::{self, LeaderboardRow, LeaderboardScope, RankSummary},
    redemptions::{self, DeliveryDetails, RedemptionRecord, RewardType},
    store::CoreStore,
    types::{Actor, Role},
    users::{UserProfile, UserRecord},
};
use chrono::TimeZone;
use std::sync::Arc;
use uuid::Uuid;

pub struct RewardsEngine {
    pub store: CoreStore,
    config: RewardConfig,
    clock: Arc<dyn Clock>,
    images: Arc<dyn ImageStore>,
}

/// Result of an approval: the updated complaint plus any milestone badges
/// this approval crossed.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub complaint: ComplaintRecord,
    pub badges_awarded: Vec<BadgeRecord>,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct UpvoteOutcome {
    pub upvotes: i64,
    pub voted: bool,
}

impl RewardsEngine {
    pub fn new(
        store: CoreStore,
        config: RewardConfig,
        clock: Arc<dyn Clock>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self { store, config, clock, images }
    }

    /// Open (or create) a file-backed engine with production wiring.
    pub fn open(path: &str, config: RewardConfig) -> CoreResult<Self> {
        config.validate()?;
        let store = CoreStore::open(path)?;
        store.migrate()?;
        Ok(Self::new(store, config, Arc::new(SystemClock), Arc::new(NoopImageStore)))
    }

    /// In-memory engine with a hand-driven clock. Used by the test suite
    /// and the demo runner.
    pub fn build_test() -> CoreResult<(Self, Arc<ManualClock>)> {
        let store = CoreStore::in_memory()?;
        store.migrate()?;
        let clock = Arc::new(ManualClock::new(
            chrono::Utc
                .with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
                .single()
                .expect("fixed test epoch is valid"),
        ));
        let engine = Self::new(
            store,
            RewardConfig::default(),
            clock.clone(),
            Arc::new(NoopImageStore),
        );
        Ok((engine, clock))
    }

    /// Swap the image-store seam (tests attach a recording store).
    pub fn set_image_store(&mut self, images: Arc<dyn ImageStore>) {
        self.images = images;
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    fn now_unix(&self) -> i64 {
        self.clock.now().timestamp()
    }

    // ── Authorization helpers ──────────────────────────────────

    fn require_admin(actor: &Actor) -> CoreResult<()> {
        if !actor.is_admin() {
            return Err(CoreError::forbidden(format!(
                "user '{}' lacks the admin role",
                actor.id
            )));
        }
        Ok(())
    }

    fn require_citizen(actor: &Actor) -> CoreResult<()> {
        if actor.role != Role::Citizen {
            return Err(CoreError::forbidden(format!(
                "operation is reserved for citizens, '{}' is {}",
                actor.id,
                actor.role.as_str()
            )));
        }
        Ok(())
    }

    /// The actor must exist and be active.
    fn active_user(&self, actor: &Actor) -> CoreResult<UserRecord> {
        let user = self.store.get_user(&actor.id)?;
        if !user.is_active {
            return Err(CoreError::forbidden(format!("user '{}' is deactivated", actor.id)));
        }
        Ok(user)
    }

    // ── Users ──────────────────────────────────────────────────

    pub fn register_user(
        &self,
        user_id: &str,
        name: &str,
        role: Role,
        city: &str,
    ) -> CoreResult<UserRecord> {
        if user_id.trim().is_empty() || name.trim().is_empty() || city.trim().is_empty() {
            return Err(CoreError::validation("user id, name, and city must be non-empty"));
        }
        if self.store.try_get_user(user_id)?.is_some() {
            return Err(CoreError::validation(format!("user '{user_id}' already registered")));
        }
        let user = UserRecord {
            user_id: user_id.to_string(),
            name: name.to_string(),
            role,
            city: city.to_string(),
            reward_points: 0,
            total_points_earned: 0,
            total_complaints: 0,
            approved_complaints: 0,
            rejected_complaints: 0,
            pending_complaints: 0,
            is_active: true,
            created_at: self.now_unix(),
        };
        self.store.insert_user(&user)?;
        log::info!("registered user {user_id} ({}) in {city}", role.as_str());
        Ok(user)
    }

    pub fn get_profile(&self, user_id: &str) -> CoreResult<UserProfile> {
        let user = self.store.get_user(user_id)?;
        let badges = self.store.badges_for_user(user_id)?;
        Ok(UserProfile { user, badges })
    }

    pub fn set_user_active(&self, admin: &Actor, user_id: &str, active: bool) -> CoreResult<()> {
        Self::require_admin(admin)?;
        self.store.set_user_active(user_id, active)
    }

    // ── Complaint lifecycle ────────────────────────────────────

    pub fn create_complaint(
        &self,
        reporter: &Actor,
        new: NewComplaint,
    ) -> CoreResult<ComplaintRecord> {
        Self::require_citizen(reporter)?;
        self.active_user(reporter)?;
        new.location.validate()?;
        if let Some(desc) = &new.description {
            if desc.chars().count() > self.config.max_description_len {
                return Err(CoreError::validation(format!(
                    "description exceeds {} characters",
                    self.config.max_description_len
                )));
            }
        }

        let now = self.clock.now();
        let rec = ComplaintRecord {
            complaint_id: Uuid::new_v4().to_string(),
            reporter_id: reporter.id.clone(),
            photo: new.photo,
            location: new.location,
            address: new.address,
            description: new.description,
            category: new.category,
            priority: new.priority,
            status: crate::complaints::ComplaintStatus::Pending,
            points_awarded: 0,
            reviewer_id: None,
            reviewed_at: None,
            rejection_reason: None,
            cleanup_photo_url: None,
            cleanup_uploader_id: None,
            cleanup_notes: None,
            cleaned_at: None,
            upvotes: 0,
            is_public: new.is_public,
            created_at: now.timestamp(),
        };

        let check = crate::dedup::DedupCheck::for_submission(&self.config.dedup, &rec.location, now);
        self.store.create_complaint(&rec, &check)?;
        log::info!(
            "complaint {} filed by {} ({}, {})",
            rec.complaint_id,
            reporter.id,
            rec.category.as_str(),
            rec.priority.as_str(),
        );
        Ok(rec)
    }

    pub fn get_complaint(&self, complaint_id: &str) -> CoreResult<ComplaintRecord> {
        self.store.get_complaint(complaint_id)
    }

    pub fn approve_complaint(
        &self,
        reviewer: &Actor,
        complaint_id: &str,
    ) -> CoreResult<ApprovalOutcome> {
        Self::require_admin(reviewer)?;
        self.active_user(reviewer)?;

        let milestones = self.config.milestone_badges();
        let (complaint, badges_awarded) = self.store.approve_complaint(
            complaint_id,
            &reviewer.id,
            &self.config.points,
            &milestones,
            self.now_unix(),
        )?;
        log::info!(
            "complaint {complaint_id} approved: {} points to {} ({} new badge(s))",
            complaint.points_awarded,
            complaint.reporter_id,
            badges_awarded.len(),
        );
        Ok(ApprovalOutcome { complaint, badges_awarded })
    }

    pub fn reject_complaint(
        &self,
        reviewer: &Actor,
        complaint_id: &str,
        reason: &str,
    ) -> CoreResult<ComplaintRecord> {
        Self::require_admin(reviewer)?;
        self.active_user(reviewer)?;
        if reason.trim().is_empty() {
            return Err(CoreError::validation("rejection reason must be non-empty"));
        }

        let rec =
            self.store
                .reject_complaint(complaint_id, &reviewer.id, reason, self.now_unix())?;
        log::debug!("complaint {complaint_id} rejected by {}", reviewer.id);
        Ok(rec)
    }

    pub fn attach_cleanup_proof(
        &self,
        uploader: &Actor,
        complaint_id: &str,
        photo_url: &str,
        notes: Option<&str>,
    ) -> CoreResult<ComplaintRecord> {
        Self::require_admin(uploader)?;
        self.active_user(uploader)?;
        if photo_url.trim().is_empty() {
            return Err(CoreError::validation("cleanup photo url must be non-empty"));
        }

        let rec = self.store.attach_cleanup_proof(
            complaint_id,
            &uploader.id,
            photo_url,
            notes,
            self.now_unix(),
        )?;
        Ok(rec)
    }

    pub fn upvote(&self, voter: &Actor, complaint_id: &str) -> CoreResult<UpvoteOutcome> {
        self.active_user(voter)?;
        let (upvotes, voted) = self.store.toggle_upvote(complaint_id, &voter.id, self.now_unix())?;
        Ok(UpvoteOutcome { upvotes, voted })
    }

    pub fn delete_complaint(&self, owner: &Actor, complaint_id: &str) -> CoreResult<()> {
        self.active_user(owner)?;
        let photo =
            self.store.delete_pending_complaint(complaint_id, &owner.id, self.now_unix())?;

        // The record is gone; a failed asset release must not undo that.
        if let Err(e) = self.images.delete(&photo.handle) {
            log::warn!("image release failed for handle {}: {e}", photo.handle);
        }
        log::debug!("complaint {complaint_id} deleted by owner {}", owner.id);
        Ok(())
    }

    pub fn recent_complaints(&self, limit: usize) -> CoreResult<Vec<ComplaintRecord>> {
        self.store.recent_public_complaints(limit)
    }

    pub fn my_complaints(&self, user: &Actor, limit: usize) -> CoreResult<Vec<ComplaintRecord>> {
        self.store.complaints_by_reporter(&user.id, limit)
    }

    // ── Badges ─────────────────────────────────────────────────

    /// Backfill every milestone badge the user's counter already covers.
    /// Idempotent: a second call with the same counters awards nothing.
    pub fn check_auto_badges(&self, user_id: &str) -> CoreResult<Vec<String>> {
        let user = self.store.get_user(user_id)?;
        let milestones = self.config.milestone_badges();
        let now = self.now_unix();

        let mut awarded = Vec::new();
        for spec in earned_milestones(&milestones, user.approved_complaints) {
            if self.store.award_badge_audited(user_id, user_id, &spec.name, &spec.icon, now)? {
                awarded.push(spec.name.clone());
            }
        }
        Ok(awarded)
    }

    /// Manual/administrative award path. Already-held is a no-op outcome,
    /// not an error; a name outside the catalog is `UnknownBadge`.
    pub fn award_badge(&self, admin: &Actor, user_id: &str, name: &str) -> CoreResult<BadgeAward> {
        Self::require_admin(admin)?;
        let spec = self
            .config
            .find_badge(name)
            .ok_or_else(|| CoreError::UnknownBadge { name: name.to_string() })?
            .clone();
        self.store.get_user(user_id)?;

        let inserted = self.store.award_badge_audited(
            &admin.id,
            user_id,
            &spec.name,
            &spec.icon,
            self.now_unix(),
        )?;
        if inserted {
            Ok(BadgeAward { awarded: true, message: format!("badge '{}' awarded", spec.name) })
        } else {
            Ok(BadgeAward {
                awarded: false,
                message: format!("badge '{}' already held", spec.name),
            })
        }
    }

    // ── Redemptions ────────────────────────────────────────────

    pub fn request_redemption(
        &self,
        requester: &Actor,
        points: i64,
        reward_type: RewardType,
        contact: &str,
    ) -> CoreResult<RedemptionRecord> {
        Self::require_citizen(requester)?;
        self.active_user(requester)?;
        if contact.trim().is_empty() {
            return Err(CoreError::validation("contact details must be non-empty"));
        }
        let reward_value = redemptions::reward_value_for(&self.config.redemption, points)?;

        let rec = RedemptionRecord {
            redemption_id: Uuid::new_v4().to_string(),
            user_id: requester.id.clone(),
            points_redeemed: points,
            reward_type,
            reward_value,
            status: redemptions::RedemptionStatus::Pending,
            contact: contact.to_string(),
            voucher_code: None,
            voucher_expiry: None,
            delivery_instructions: None,
            rejection_reason: None,
            reviewer_id: None,
            reviewed_at: None,
            created_at: self.now_unix(),
        };
        self.store.create_redemption_with_hold(&rec)?;
        log::info!(
            "redemption {} requested: {points} points held from {}",
            rec.redemption_id,
            requester.id,
        );
        Ok(rec)
    }

    pub fn approve_redemption(
        &self,
        reviewer: &Actor,
        redemption_id: &str,
        delivery: DeliveryDetails,
    ) -> CoreResult<RedemptionRecord> {
        Self::require_admin(reviewer)?;
        self.active_user(reviewer)?;
        if delivery.voucher_code.trim().is_empty() {
            return Err(CoreError::validation("voucher code must be non-empty"));
        }
        let delivery = DeliveryDetails {
            voucher_expiry: delivery.voucher_expiry.or_else(|| {
                Some(self.now_unix() + self.config.redemption.voucher_valid_days * 86_400)
            }),
            ..delivery
        };

        let rec = self.store.fulfill_redemption(
            redemption_id,
            &reviewer.id,
            &delivery,
            self.now_unix(),
        )?;
        log::info!("redemption {redemption_id} fulfilled by {}", reviewer.id);
        Ok(rec)
    }

    pub fn reject_redemption(
        &self,
        reviewer: &Actor,
        redemption_id: &str,
        reason: &str,
    ) -> CoreResult<RedemptionRecord> {
        Self::require_admin(reviewer)?;
        self.active_user(reviewer)?;
        if reason.trim().is_empty() {
            return Err(CoreError::validation("rejection reason must be non-empty"));
        }

        let rec =
            self.store
                .reject_redemption(redemption_id, &reviewer.id, reason, self.now_unix())?;
        Ok(rec)
    }

    pub fn my_redemptions(&self, user: &Actor) -> CoreResult<Vec<RedemptionRecord>> {
        self.store.redemptions_by_user(&user.id)
    }

    // ── Rankings ───────────────────────────────────────────────

    pub fn get_leaderboard(
        &self,
        scope: LeaderboardScope,
        limit: usize,
    ) -> CoreResult<Vec<LeaderboardRow>> {
        let rows = match scope {
            LeaderboardScope::Monthly => {
                let (start, end) = rankings::month_bounds(self.clock.now());
                self.store.monthly_leaderboard(start, end, limit)?
            }
            LeaderboardScope::AllTime => self.store.alltime_leaderboard(None, limit)?,
            LeaderboardScope::Area { city } => {
                self.store.alltime_leaderboard(Some(&city), limit)?
            }
        };
        Ok(rankings::assign_ranks(rows))
    }

    pub fn get_user_rank(&self, user_id: &str) -> CoreResult<RankSummary> {
        let total_users = self.store.citizen_count()?;
        let user = match self.store.try_get_user(user_id)? {
            Some(u) if u.role == Role::Citizen => u,
            _ => return Ok(RankSummary { rank: None, total_users, percentile: None }),
        };
        let index = self.store.rank_index_for(&user)?;
        Ok(RankSummary {
            rank: Some(index + 1),
            total_users,
            percentile: Some(rankings::percentile(index, total_users)),
        })
    }
}
