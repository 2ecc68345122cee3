//! rewards-cli: headless demo runner for the CleanCity rewards engine.
//!
//! Usage:
//!   rewards-cli --db rewards.db --citizens 8 --reports 24
//!   rewards-cli --config overrides.json --json

use anyhow::{Context, Result};
use cleancity_core::complaints::{Category, ComplaintStatus, NewComplaint, PhotoRef, Priority};
use cleancity_core::config::RewardConfig;
use cleancity_core::engine::RewardsEngine;
use cleancity_core::geo::GeoPoint;
use cleancity_core::rankings::LeaderboardScope;
use cleancity_core::redemptions::{DeliveryDetails, RewardType};
use cleancity_core::types::{Actor, Role};
use std::env;

const CITIES: [&str; 3] = ["Pune", "Nashik", "Nagpur"];
const CATEGORIES: [Category; 5] = [
    Category::GarbagePile,
    Category::OverflowingBin,
    Category::IllegalDumping,
    Category::BlockedDrain,
    Category::Other,
];
const PRIORITIES: [Priority; 4] =
    [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

/// Meters per degree of latitude; demo reports are spread ~150 m apart so
/// the duplicate filter stays quiet.
const M_PER_DEG_LAT: f64 = 111_195.0;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let citizens = parse_arg(&args, "--citizens", 8usize);
    let reports = parse_arg(&args, "--reports", 24usize);
    let json_out = args.iter().any(|a| a == "--json");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let config_path = args.windows(2).find(|w| w[0] == "--config").map(|w| w[1].as_str());

    let config = match config_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {path}"))?;
            RewardConfig::from_json(&raw).context("parsing config overrides")?
        }
        None => RewardConfig::default(),
    };

    if !json_out {
        println!("CleanCity Rewards — demo runner");
        println!("  started:  {}", chrono::Utc::now().to_rfc3339());
        println!("  db:       {db}");
        println!("  citizens: {citizens}");
        println!("  reports:  {reports}");
        println!();
    }

    let engine = RewardsEngine::open(db, config)?;

    let officer = seed_population(&engine, citizens)?;
    run_demo_flow(&engine, &officer, citizens, reports)?;

    if json_out {
        print_json(&engine)?;
    } else {
        print_summary(&engine)?;
    }
    Ok(())
}

/// Register one reviewing admin plus `citizens` reporters across the demo
/// cities.
fn seed_population(engine: &RewardsEngine, citizens: usize) -> Result<Actor> {
    engine.register_user("ward-officer", "Ward Officer", Role::Admin, CITIES[0])?;
    for n in 0..citizens {
        let id = format!("citizen-{n:02}");
        let city = CITIES[n % CITIES.len()];
        engine.register_user(&id, &format!("Citizen {n:02}"), Role::Citizen, city)?;
    }
    Ok(Actor::admin("ward-officer"))
}

/// Drive the whole programme once: file, upvote, review, clean, redeem.
fn run_demo_flow(
    engine: &RewardsEngine,
    officer: &Actor,
    citizens: usize,
    reports: usize,
) -> Result<()> {
    let mut filed = Vec::new();
    for n in 0..reports {
        let reporter = Actor::citizen(format!("citizen-{:02}", n % citizens));
        let report = NewComplaint {
            location: GeoPoint::new(73.8567, 18.5204 + n as f64 * 150.0 / M_PER_DEG_LAT),
            category: CATEGORIES[n % CATEGORIES.len()],
            priority: PRIORITIES[n % PRIORITIES.len()],
            photo: PhotoRef {
                url: format!("https://img.cleancity.example/{n}.jpg"),
                handle: format!("demo-{n}"),
            },
            description: Some(format!("demo report #{n}")),
            address: None,
            is_public: true,
        };
        let rec = engine.create_complaint(&reporter, report)?;
        filed.push(rec.complaint_id);
    }

    // Everyone else supports the first report.
    if let Some(first) = filed.first() {
        for n in 1..citizens {
            let voter = Actor::citizen(format!("citizen-{n:02}"));
            engine.upvote(&voter, first)?;
        }
    }

    // Review: approve two out of three, reject the rest; clean a few of
    // the approved ones.
    for (n, id) in filed.iter().enumerate() {
        if n % 3 == 2 {
            engine.reject_complaint(officer, id, "photo unusable")?;
        } else {
            engine.approve_complaint(officer, id)?;
            if n % 6 == 0 {
                engine.attach_cleanup_proof(
                    officer,
                    id,
                    &format!("https://img.cleancity.example/cleaned-{n}.jpg"),
                    Some("cleared by morning crew"),
                )?;
            }
        }
    }

    // The top earner cashes in, if anyone has reached the minimum.
    let board = engine.get_leaderboard(LeaderboardScope::AllTime, 1)?;
    if let Some(top) = board.first() {
        let user = engine.store.get_user(&top.user_id)?;
        if user.reward_points >= engine.config().redemption.min_points {
            let requester = Actor::citizen(user.user_id.clone());
            let rec = engine.request_redemption(
                &requester,
                engine.config().redemption.min_points,
                RewardType::GiftVoucher,
                "demo@cleancity.example",
            )?;
            engine.approve_redemption(
                officer,
                &rec.redemption_id,
                DeliveryDetails {
                    voucher_code: format!("GV-{}", &rec.redemption_id[..8]),
                    voucher_expiry: None,
                    instructions: Some("redeem at any partner store".to_string()),
                },
            )?;
        }
    }
    Ok(())
}

fn print_summary(engine: &RewardsEngine) -> Result<()> {
    let store = &engine.store;
    let pending = store.complaint_count_by_status(ComplaintStatus::Pending)?;
    let approved = store.complaint_count_by_status(ComplaintStatus::Approved)?;
    let rejected = store.complaint_count_by_status(ComplaintStatus::Rejected)?;
    let cleaned = store.complaint_count_by_status(ComplaintStatus::Cleaned)?;

    println!("=== COMPLAINTS ===");
    println!("  pending:  {pending}");
    println!("  approved: {approved}");
    println!("  rejected: {rejected}");
    println!("  cleaned:  {cleaned}");

    println!();
    println!("=== MONTHLY LEADERBOARD ===");
    let monthly = engine.get_leaderboard(LeaderboardScope::Monthly, 10)?;
    if monthly.is_empty() {
        println!("  (no approved reports this month)");
    }
    for row in &monthly {
        println!(
            "  #{:<2} {:<12} {:>3} reports  {:>5} pts",
            row.rank, row.user_id, row.count, row.points
        );
    }

    println!();
    println!("=== ALL-TIME LEADERBOARD ===");
    for row in engine.get_leaderboard(LeaderboardScope::AllTime, 10)? {
        let summary = engine.get_user_rank(&row.user_id)?;
        let pct = summary.percentile.map(|p| format!("top {p}%")).unwrap_or_default();
        println!(
            "  #{:<2} {:<12} {:>3} reports  {:>5} pts  {pct}",
            row.rank, row.user_id, row.count, row.points
        );
    }

    println!();
    println!("=== REDEMPTIONS ===");
    let open = store.pending_redemptions(10)?;
    println!("  pending review: {}", open.len());
    for entry in store.recent_audit_entries(5)? {
        log::debug!("audit tail: {} by {}", entry.event_type, entry.actor_id);
    }
    Ok(())
}

fn print_json(engine: &RewardsEngine) -> Result<()> {
    let board = engine.get_leaderboard(LeaderboardScope::AllTime, 50)?;
    println!("{}", serde_json::to_string_pretty(&board)?);
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
