//! Redemption workflow tests: escrow holds, refunds, fulfillment.

use cleancity_core::clock::{Clock, ManualClock};
use cleancity_core::engine::RewardsEngine;
use cleancity_core::error::CoreError;
use cleancity_core::ledger::{LedgerDelta, StatDeltas};
use cleancity_core::redemptions::{DeliveryDetails, RedemptionStatus, RewardType};
use cleancity_core::types::{Actor, Role};
use std::sync::Arc;

fn build() -> (RewardsEngine, Arc<ManualClock>) {
    RewardsEngine::build_test().expect("build test engine")
}

/// Register a citizen pre-loaded with `points` spendable (and lifetime)
/// points.
fn funded_citizen(engine: &RewardsEngine, id: &str, points: i64) -> Actor {
    engine
        .register_user(id, &format!("Citizen {id}"), Role::Citizen, "Pune")
        .expect("register citizen");
    engine
        .store
        .apply_ledger_delta(id, &LedgerDelta::credit(points, StatDeltas::NONE))
        .expect("seed points");
    Actor::citizen(id)
}

fn admin(engine: &RewardsEngine, id: &str) -> Actor {
    engine
        .register_user(id, &format!("Admin {id}"), Role::Admin, "Pune")
        .expect("register admin");
    Actor::admin(id)
}

fn delivery(code: &str) -> DeliveryDetails {
    DeliveryDetails {
        voucher_code: code.to_string(),
        voucher_expiry: None,
        instructions: Some("redeem at any partner store".to_string()),
    }
}

/// The hold leaves the spendable balance at request time; the lifetime
/// total never moves.
#[test]
fn request_holds_points_immediately() {
    let (engine, _clock) = build();
    let asha = funded_citizen(&engine, "asha", 500);

    let rec = engine
        .request_redemption(&asha, 200, RewardType::GiftVoucher, "asha@example.in")
        .unwrap();
    assert_eq!(rec.status, RedemptionStatus::Pending);
    assert_eq!(rec.points_redeemed, 200);
    assert_eq!(rec.reward_value, 20.0); // 200 points at 10 points/unit

    let user = engine.store.get_user("asha").unwrap();
    assert_eq!(user.reward_points, 300);
    assert_eq!(user.total_points_earned, 500);
}

#[test]
fn below_minimum_is_rejected_before_any_hold() {
    let (engine, _clock) = build();
    let asha = funded_citizen(&engine, "asha", 500);

    match engine.request_redemption(&asha, 50, RewardType::TreeDonation, "asha@example.in") {
        Err(CoreError::BelowMinimum { requested: 50, minimum: 100 }) => {}
        other => panic!("expected BelowMinimum, got {other:?}"),
    }
    assert_eq!(engine.store.get_user("asha").unwrap().reward_points, 500);
}

/// When the balance cannot cover the hold, the whole request rolls back:
/// no redemption row, no balance change.
#[test]
fn insufficient_balance_rolls_back_the_request() {
    let (engine, _clock) = build();
    let asha = funded_citizen(&engine, "asha", 150);

    match engine.request_redemption(&asha, 200, RewardType::GiftVoucher, "asha@example.in") {
        Err(CoreError::InsufficientPoints { requested: 200, available: 150 }) => {}
        other => panic!("expected InsufficientPoints, got {other:?}"),
    }
    assert!(engine.my_redemptions(&asha).unwrap().is_empty());
    assert_eq!(engine.store.get_user("asha").unwrap().reward_points, 150);
}

/// Held points can't be double-spent: two holds against one balance fail
/// on the second.
#[test]
fn holds_are_not_double_spendable() {
    let (engine, _clock) = build();
    let asha = funded_citizen(&engine, "asha", 250);

    engine.request_redemption(&asha, 150, RewardType::GiftVoucher, "asha@example.in").unwrap();
    match engine.request_redemption(&asha, 150, RewardType::GiftVoucher, "asha@example.in") {
        Err(CoreError::InsufficientPoints { available: 100, .. }) => {}
        other => panic!("expected InsufficientPoints, got {other:?}"),
    }
}

/// Rejection refunds the hold into the spendable balance only.
#[test]
fn rejection_refunds_balance_not_lifetime() {
    let (engine, _clock) = build();
    let asha = funded_citizen(&engine, "asha", 500);
    let officer = admin(&engine, "rewards-desk");

    let rec = engine
        .request_redemption(&asha, 200, RewardType::MobileRecharge, "98-xxx-xxx")
        .unwrap();
    let rejected = engine
        .reject_redemption(&officer, &rec.redemption_id, "recharge partner unavailable")
        .unwrap();
    assert_eq!(rejected.status, RedemptionStatus::Rejected);

    let user = engine.store.get_user("asha").unwrap();
    assert_eq!(user.reward_points, 500);
    assert_eq!(user.total_points_earned, 500);
}

/// Fulfillment records the voucher; a missing expiry defaults to the
/// configured validity window from the fulfillment instant.
#[test]
fn fulfillment_records_voucher_with_default_expiry() {
    let (engine, clock) = build();
    let asha = funded_citizen(&engine, "asha", 500);
    let officer = admin(&engine, "rewards-desk");

    let rec = engine
        .request_redemption(&asha, 200, RewardType::GiftVoucher, "asha@example.in")
        .unwrap();
    let fulfilled = engine
        .approve_redemption(&officer, &rec.redemption_id, delivery("GV-2026-0042"))
        .unwrap();

    assert_eq!(fulfilled.status, RedemptionStatus::Fulfilled);
    assert_eq!(fulfilled.voucher_code.as_deref(), Some("GV-2026-0042"));
    let expected_expiry = clock.now().timestamp() + 90 * 86_400;
    assert_eq!(fulfilled.voucher_expiry, Some(expected_expiry));

    // Points stay spent.
    assert_eq!(engine.store.get_user("asha").unwrap().reward_points, 300);
}

#[test]
fn explicit_expiry_is_preserved() {
    let (engine, _clock) = build();
    let asha = funded_citizen(&engine, "asha", 500);
    let officer = admin(&engine, "rewards-desk");

    let rec = engine
        .request_redemption(&asha, 100, RewardType::BillDiscount, "acct-771")
        .unwrap();
    let explicit = DeliveryDetails {
        voucher_code: "BD-77".to_string(),
        voucher_expiry: Some(1_800_000_000),
        instructions: None,
    };
    let fulfilled =
        engine.approve_redemption(&officer, &rec.redemption_id, explicit).unwrap();
    assert_eq!(fulfilled.voucher_expiry, Some(1_800_000_000));
}

/// A redemption is reviewed exactly once.
#[test]
fn double_review_fails() {
    let (engine, _clock) = build();
    let asha = funded_citizen(&engine, "asha", 500);
    let officer = admin(&engine, "rewards-desk");

    let rec = engine
        .request_redemption(&asha, 200, RewardType::GiftVoucher, "asha@example.in")
        .unwrap();
    engine.approve_redemption(&officer, &rec.redemption_id, delivery("GV-1")).unwrap();

    match engine.reject_redemption(&officer, &rec.redemption_id, "changed my mind") {
        Err(CoreError::InvalidState { expected: "pending", .. }) => {}
        other => panic!("expected InvalidState, got {other:?}"),
    }
    // No refund happened: the balance reflects the spent hold.
    assert_eq!(engine.store.get_user("asha").unwrap().reward_points, 300);
}

#[test]
fn review_roles_are_enforced() {
    let (engine, _clock) = build();
    let asha = funded_citizen(&engine, "asha", 500);
    let ravi = funded_citizen(&engine, "ravi", 500);
    let officer = admin(&engine, "rewards-desk");

    let rec = engine
        .request_redemption(&asha, 200, RewardType::GiftVoucher, "asha@example.in")
        .unwrap();

    // Citizens cannot review.
    match engine.approve_redemption(&ravi, &rec.redemption_id, delivery("GV-1")) {
        Err(CoreError::Forbidden { .. }) => {}
        other => panic!("expected Forbidden, got {other:?}"),
    }
    // Admins cannot request.
    match engine.request_redemption(&officer, 200, RewardType::GiftVoucher, "desk@city.gov") {
        Err(CoreError::Forbidden { .. }) => {}
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

#[test]
fn blank_voucher_code_is_rejected() {
    let (engine, _clock) = build();
    let asha = funded_citizen(&engine, "asha", 500);
    let officer = admin(&engine, "rewards-desk");

    let rec = engine
        .request_redemption(&asha, 200, RewardType::GiftVoucher, "asha@example.in")
        .unwrap();
    match engine.approve_redemption(&officer, &rec.redemption_id, delivery("  ")) {
        Err(CoreError::Validation { .. }) => {}
        other => panic!("expected Validation, got {other:?}"),
    }
    // Still pending, still reviewable.
    assert_eq!(
        engine.store.get_redemption(&rec.redemption_id).unwrap().status,
        RedemptionStatus::Pending
    );
}
