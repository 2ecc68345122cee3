//! User registration and audit-trail tests.

use cleancity_core::engine::RewardsEngine;
use cleancity_core::error::CoreError;
use cleancity_core::types::Role;

fn build() -> RewardsEngine {
    let (engine, _clock) = RewardsEngine::build_test().expect("build test engine");
    engine
}

#[test]
fn registration_starts_with_empty_ledger() {
    let engine = build();
    let user = engine.register_user("asha", "Asha K", Role::Citizen, "Pune").unwrap();
    assert_eq!(user.reward_points, 0);
    assert_eq!(user.total_points_earned, 0);
    assert_eq!(user.total_complaints, 0);
    assert!(user.is_active);

    let stored = engine.store.get_user("asha").unwrap();
    assert_eq!(stored.name, "Asha K");
    assert_eq!(stored.role, Role::Citizen);
    assert_eq!(stored.city, "Pune");
}

#[test]
fn duplicate_registration_is_rejected() {
    let engine = build();
    engine.register_user("asha", "Asha K", Role::Citizen, "Pune").unwrap();
    match engine.register_user("asha", "Someone Else", Role::Citizen, "Nashik") {
        Err(CoreError::Validation { .. }) => {}
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn blank_fields_are_rejected() {
    let engine = build();
    assert!(engine.register_user("", "Asha K", Role::Citizen, "Pune").is_err());
    assert!(engine.register_user("asha", "  ", Role::Citizen, "Pune").is_err());
    assert!(engine.register_user("asha", "Asha K", Role::Citizen, "").is_err());
}

#[test]
fn profile_for_missing_user_is_not_found() {
    let engine = build();
    match engine.get_profile("nobody") {
        Err(CoreError::NotFound { entity: "user", .. }) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn deactivation_is_admin_only() {
    let engine = build();
    engine.register_user("asha", "Asha K", Role::Citizen, "Pune").unwrap();
    engine.register_user("ravi", "Ravi B", Role::Citizen, "Pune").unwrap();

    let ravi = cleancity_core::types::Actor::citizen("ravi");
    match engine.set_user_active(&ravi, "asha", false) {
        Err(CoreError::Forbidden { .. }) => {}
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

/// Every registration lands one typed event in the audit log.
#[test]
fn registrations_are_audited() {
    let engine = build();
    engine.register_user("asha", "Asha K", Role::Citizen, "Pune").unwrap();
    engine.register_user("ward-officer", "Ward Officer", Role::Admin, "Pune").unwrap();

    assert_eq!(engine.store.audit_count_by_type("user_registered").unwrap(), 2);
    let recent = engine.store.recent_audit_entries(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent.iter().all(|e| e.event_type == "user_registered"));
    assert!(recent[0].payload.contains("ward-officer"));
}
