//! Rewards ledger deltas.
//!
//! Every balance or stat-counter mutation in the system is expressed as one
//! `LedgerDelta` and applied by the store as a single guarded UPDATE — the
//! read-modify-write never happens in Rust, so concurrent applications
//! cannot lose updates.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
    /// Raises both `reward_points` and `total_points_earned`.
    Credit,
    /// Lowers only `reward_points`; fails `InsufficientPoints` at commit if
    /// the balance cannot cover it.
    Debit,
    /// Raises only `reward_points`. Used to release a redemption hold; the
    /// lifetime total must not move, the points were already counted.
    Refund,
}

/// Increments applied to the user's stat counters alongside the points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDeltas {
    pub total: i64,
    pub approved: i64,
    pub rejected: i64,
    pub pending: i64,
}

impl StatDeltas {
    pub const NONE: StatDeltas = StatDeltas { total: 0, approved: 0, rejected: 0, pending: 0 };

    pub fn filed() -> Self {
        StatDeltas { total: 1, pending: 1, ..Default::default() }
    }

    pub fn approved() -> Self {
        StatDeltas { approved: 1, pending: -1, ..Default::default() }
    }

    pub fn rejected() -> Self {
        StatDeltas { rejected: 1, pending: -1, ..Default::default() }
    }

    pub fn withdrawn() -> Self {
        StatDeltas { total: -1, pending: -1, ..Default::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerDelta {
    pub kind: DeltaKind,
    /// Magnitude, always non-negative; the kind carries the sign.
    pub points: i64,
    pub stats: StatDeltas,
}

impl LedgerDelta {
    pub fn credit(points: i64, stats: StatDeltas) -> Self {
        debug_assert!(points >= 0);
        Self { kind: DeltaKind::Credit, points, stats }
    }

    pub fn debit(points: i64) -> Self {
        debug_assert!(points >= 0);
        Self { kind: DeltaKind::Debit, points, stats: StatDeltas::NONE }
    }

    pub fn refund(points: i64) -> Self {
        debug_assert!(points >= 0);
        Self { kind: DeltaKind::Refund, points, stats: StatDeltas::NONE }
    }

    /// Stat-only delta (filing, rejection, withdrawal).
    pub fn stats_only(stats: StatDeltas) -> Self {
        Self { kind: DeltaKind::Credit, points: 0, stats }
    }

    /// Signed change to `reward_points`.
    pub fn balance_delta(&self) -> i64 {
        match self.kind {
            DeltaKind::Credit | DeltaKind::Refund => self.points,
            DeltaKind::Debit => -self.points,
        }
    }

    /// Signed change to `total_points_earned`.
    pub fn lifetime_delta(&self) -> i64 {
        match self.kind {
            DeltaKind::Credit => self.points,
            DeltaKind::Debit | DeltaKind::Refund => 0,
        }
    }
}

/// Post-commit counters, read back from the same UPDATE that applied the
/// delta. The before/after pair feeds the milestone crossing test.
#[derive(Debug, Clone, Copy)]
pub struct LedgerReceipt {
    pub reward_points: i64,
    pub total_points_earned: i64,
    pub approved_after: i64,
}

impl LedgerReceipt {
    pub fn approved_before(&self, delta: &LedgerDelta) -> i64 {
        self.approved_after - delta.stats.approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_moves_both_balances() {
        let d = LedgerDelta::credit(35, StatDeltas::approved());
        assert_eq!(d.balance_delta(), 35);
        assert_eq!(d.lifetime_delta(), 35);
        assert_eq!(d.stats.approved, 1);
        assert_eq!(d.stats.pending, -1);
    }

    #[test]
    fn debit_never_touches_lifetime() {
        let d = LedgerDelta::debit(100);
        assert_eq!(d.balance_delta(), -100);
        assert_eq!(d.lifetime_delta(), 0);
    }

    #[test]
    fn refund_restores_balance_only() {
        let d = LedgerDelta::refund(100);
        assert_eq!(d.balance_delta(), 100);
        assert_eq!(d.lifetime_delta(), 0);
    }

    #[test]
    fn receipt_recovers_prior_approved_count() {
        let d = LedgerDelta::credit(10, StatDeltas::approved());
        let r = LedgerReceipt { reward_points: 10, total_points_earned: 10, approved_after: 10 };
        assert_eq!(r.approved_before(&d), 9);
    }
}
