//! Ledger and badge tests: atomic credits, milestone crossings, backfill,
//! and the manual award path.

use cleancity_core::complaints::{Category, NewComplaint, PhotoRef, Priority};
use cleancity_core::engine::RewardsEngine;
use cleancity_core::error::CoreError;
use cleancity_core::geo::GeoPoint;
use cleancity_core::ledger::{LedgerDelta, StatDeltas};
use cleancity_core::types::{Actor, Role};

const M_PER_DEG_LAT: f64 = 111_195.0;

fn build() -> RewardsEngine {
    let (engine, _clock) = RewardsEngine::build_test().expect("build test engine");
    engine
}

fn citizen(engine: &RewardsEngine, id: &str) -> Actor {
    engine
        .register_user(id, &format!("Citizen {id}"), Role::Citizen, "Pune")
        .expect("register citizen");
    Actor::citizen(id)
}

fn admin(engine: &RewardsEngine, id: &str) -> Actor {
    engine
        .register_user(id, &format!("Admin {id}"), Role::Admin, "Pune")
        .expect("register admin");
    Actor::admin(id)
}

/// File a report at the n-th test spot (spots are ~110 m apart so the
/// duplicate filter never triggers between them).
fn file_nth(engine: &RewardsEngine, reporter: &Actor, n: usize) -> String {
    let report = NewComplaint {
        location: GeoPoint::new(73.8567, 18.5204 + n as f64 * 110.0 / M_PER_DEG_LAT),
        category: Category::GarbagePile,
        priority: Priority::Medium,
        photo: PhotoRef {
            url: format!("https://img.example/{n}.jpg"),
            handle: format!("img-{n}"),
        },
        description: None,
        address: None,
        is_public: true,
    };
    engine.create_complaint(reporter, report).unwrap().complaint_id
}

/// The very first approval crosses the "First Step" threshold.
#[test]
fn first_approval_awards_first_step() {
    let engine = build();
    let reporter = citizen(&engine, "asha");
    let reviewer = admin(&engine, "ward-officer");

    let id = file_nth(&engine, &reporter, 0);
    let outcome = engine.approve_complaint(&reviewer, &id).unwrap();

    let names: Vec<&str> = outcome.badges_awarded.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["First Step"]);
    assert!(engine.store.has_badge("asha", "First Step").unwrap());
    assert_eq!(engine.store.audit_count_by_type("badge_awarded").unwrap(), 1);
}

/// Ten approvals earn "Clean Hero" exactly once; the crossing fires on the
/// tenth approval and never again.
#[test]
fn tenth_approval_awards_clean_hero_once() {
    let engine = build();
    let reporter = citizen(&engine, "asha");
    let reviewer = admin(&engine, "ward-officer");

    for n in 0..11 {
        let id = file_nth(&engine, &reporter, n);
        let outcome = engine.approve_complaint(&reviewer, &id).unwrap();
        let got_hero = outcome.badges_awarded.iter().any(|b| b.name == "Clean Hero");
        assert_eq!(got_hero, n == 9, "Clean Hero mis-awarded at approval {}", n + 1);
    }

    // First Step + Clean Hero, nothing else, no duplicates.
    assert_eq!(engine.store.badge_count("asha").unwrap(), 2);
}

/// Every approval moves both the spendable balance and the lifetime total
/// by the same amount.
#[test]
fn approvals_credit_both_balances() {
    let engine = build();
    let reporter = citizen(&engine, "asha");
    let reviewer = admin(&engine, "ward-officer");

    for n in 0..3 {
        let id = file_nth(&engine, &reporter, n);
        engine.approve_complaint(&reviewer, &id).unwrap();
    }

    let user = engine.store.get_user("asha").unwrap();
    assert_eq!(user.reward_points, 30); // 3 × garbage_pile(10)
    assert_eq!(user.total_points_earned, 30);
    assert_eq!(user.approved_complaints, 3);
}

/// `check_auto_badges` backfills everything the counter already covers,
/// and a second call is a no-op.
#[test]
fn auto_badge_backfill_is_idempotent() {
    let engine = build();
    citizen(&engine, "asha");

    // Counters moved outside the approval path (an import, say): 50
    // approved complaints and no badge rows yet.
    engine
        .store
        .apply_ledger_delta(
            "asha",
            &LedgerDelta::credit(500, StatDeltas { total: 50, approved: 50, rejected: 0, pending: 0 }),
        )
        .unwrap();

    let awarded = engine.check_auto_badges("asha").unwrap();
    assert_eq!(awarded, vec!["First Step", "Clean Hero", "City Champion"]);

    let again = engine.check_auto_badges("asha").unwrap();
    assert!(again.is_empty(), "backfill must be idempotent, got {again:?}");
    assert_eq!(engine.store.badge_count("asha").unwrap(), 3);
}

/// Manual awards: catalog-checked, admin-only, and a no-op (not an error)
/// when the badge is already held.
#[test]
fn manual_award_path() {
    let engine = build();
    let reporter = citizen(&engine, "asha");
    let reviewer = admin(&engine, "ward-officer");

    match engine.award_badge(&reviewer, "asha", "Platinum Llama") {
        Err(CoreError::UnknownBadge { name }) => assert_eq!(name, "Platinum Llama"),
        other => panic!("expected UnknownBadge, got {other:?}"),
    }

    match engine.award_badge(&reporter, "asha", "Top Contributor") {
        Err(CoreError::Forbidden { .. }) => {}
        other => panic!("expected Forbidden, got {other:?}"),
    }

    let first = engine.award_badge(&reviewer, "asha", "Top Contributor").unwrap();
    assert!(first.awarded);
    let second = engine.award_badge(&reviewer, "asha", "Top Contributor").unwrap();
    assert!(!second.awarded);
    assert_eq!(engine.store.badge_count("asha").unwrap(), 1);
}

/// A debit below the floor fails atomically: the balance is untouched.
#[test]
fn ledger_floor_is_enforced() {
    let engine = build();
    citizen(&engine, "asha");
    engine.store.apply_ledger_delta("asha", &LedgerDelta::credit(40, StatDeltas::NONE)).unwrap();

    match engine.store.apply_ledger_delta("asha", &LedgerDelta::debit(50)) {
        Err(CoreError::InsufficientPoints { requested: 50, available: 40 }) => {}
        other => panic!("expected InsufficientPoints, got {other:?}"),
    }
    assert_eq!(engine.store.get_user("asha").unwrap().reward_points, 40);

    match engine.store.apply_ledger_delta("nobody", &LedgerDelta::debit(1)) {
        Err(CoreError::NotFound { .. }) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

/// The profile read assembles the user record and their badges.
#[test]
fn profile_includes_badges() {
    let engine = build();
    let reporter = citizen(&engine, "asha");
    let reviewer = admin(&engine, "ward-officer");

    let id = file_nth(&engine, &reporter, 0);
    engine.approve_complaint(&reviewer, &id).unwrap();

    let profile = engine.get_profile("asha").unwrap();
    assert_eq!(profile.user.approved_complaints, 1);
    assert_eq!(profile.badges.len(), 1);
    assert_eq!(profile.badges[0].name, "First Step");
}
