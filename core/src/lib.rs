//! Rewards ledger and ranking engine for a civic waste-reporting programme.
//!
//! Citizens file geo-tagged complaints; admins review them. Approval credits
//! points through an atomic ledger, milestone badges are granted on threshold
//! crossings, and points are spent through an escrowed redemption workflow.
//! Leaderboards and per-user rank read from the same ordering key.
//!
//! RULE: Only the store talks to the database. The engine layers
//! authorization, validation, and the audit trail on top of the store's
//! atomic transitions; everything else is pure types and arithmetic.

pub mod badges;
pub mod clock;
pub mod complaints;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod event;
pub mod geo;
pub mod images;
pub mod ledger;
pub mod rankings;
pub mod redemptions;
pub mod store;
pub mod types;
pub mod users;

pub use engine::{ApprovalOutcome, RewardsEngine, UpvoteOutcome};
pub use error::{CoreError, CoreResult};
pub use store::CoreStore;
