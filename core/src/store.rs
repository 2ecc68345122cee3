//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Domain modules and the engine call store methods — they never execute
//! SQL directly. Compound transitions (status change + ledger delta + stat
//! counters + milestone badges) run inside one transaction here, so either
//! the whole transition commits or none of it does.

mod badge;
mod complaint;
mod ranking;
mod redemption;
mod user;

use crate::{
    error::CoreResult,
    event::{event_type_name, AuditLogEntry, CoreEvent},
};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::time::Duration;

pub struct CoreStore {
    conn: Connection,
}

impl CoreStore {
    pub fn open(path: &str) -> CoreResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL only matters for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests and the demo runner).
    pub fn in_memory() -> CoreResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Begin a write transaction. IMMEDIATE takes the write lock up front,
    /// so a read-then-write transition cannot interleave with another
    /// connection's writes: the loser of a concurrent pair waits for the
    /// winner's commit and then re-reads its effects.
    pub(crate) fn write_tx(&self) -> CoreResult<Transaction<'_>> {
        Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(Into::into)
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> CoreResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/002_complaints.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/003_badges.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/004_redemptions.sql"))?;
        Ok(())
    }

    // ── Audit log ──────────────────────────────────────────────

    pub fn append_audit(&self, entry: &AuditLogEntry) -> CoreResult<()> {
        self.conn.execute(
            "INSERT INTO audit_log (occurred_at, actor_id, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.occurred_at, entry.actor_id, entry.event_type, entry.payload],
        )?;
        Ok(())
    }

    pub fn recent_audit_entries(&self, limit: usize) -> CoreResult<Vec<AuditLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, occurred_at, actor_id, event_type, payload
             FROM audit_log ORDER BY id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit as i64], |row| {
                Ok(AuditLogEntry {
                    id: Some(row.get(0)?),
                    occurred_at: row.get(1)?,
                    actor_id: row.get(2)?,
                    event_type: row.get(3)?,
                    payload: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Serialize and append one typed event. Called inside the same
    /// transaction as the transition it records, never after commit.
    pub(crate) fn append_event(
        &self,
        actor_id: &str,
        occurred_at: i64,
        event: &CoreEvent,
    ) -> CoreResult<()> {
        self.append_audit(&AuditLogEntry {
            id: None,
            occurred_at,
            actor_id: actor_id.to_string(),
            event_type: event_type_name(event).to_string(),
            payload: serde_json::to_string(event)?,
        })
    }

    pub fn audit_count_by_type(&self, event_type: &str) -> CoreResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM audit_log WHERE event_type = ?1",
                params![event_type],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}

/// Map a stored string column into a closed-set enum, surfacing a proper
/// conversion error instead of panicking on corrupt rows.
pub(crate) fn parse_enum_col<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("{e}").into(),
        )
    })
}
