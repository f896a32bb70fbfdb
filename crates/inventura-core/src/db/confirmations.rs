//! Pending confirmation tokens for destructive bulk operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::catalog::parse_column;
use super::{from_micros, to_micros};
use crate::confirm::{DestructiveAction, PendingConfirmation};
use crate::model::Cadence;

pub fn insert_pending(
    conn: &Connection,
    pending: &PendingConfirmation,
    created_at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO pending_confirmations (token, action, cadence, step, steps,
            created_at_us, expires_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            pending.token,
            pending.action.kind(),
            pending.action.cadence().as_str(),
            pending.step,
            pending.steps,
            to_micros(created_at),
            to_micros(pending.expires_at)
        ],
    )
    .context("insert pending confirmation")?;
    Ok(())
}

/// Remove and return a pending token. Tokens are single-use, so a token is
/// consumed whether or not the caller goes on to accept it.
pub fn take_pending(conn: &Connection, token: &str) -> Result<Option<PendingConfirmation>> {
    let pending = conn
        .query_row(
            "SELECT token, action, cadence, step, steps, expires_at_us
             FROM pending_confirmations WHERE token = ?1",
            params![token],
            |row| {
                let action: String = row.get(1)?;
                let cadence: String = row.get(2)?;
                let cadence = parse_column::<Cadence>(2, &cadence)?;
                let action = DestructiveAction::from_parts(&action, cadence).ok_or_else(|| {
                    rusqlite::Error::InvalidColumnType(
                        1,
                        "action".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?;
                Ok(PendingConfirmation {
                    token: row.get(0)?,
                    action,
                    step: row.get(3)?,
                    steps: row.get(4)?,
                    expires_at: from_micros(5, row.get(5)?)?,
                })
            },
        )
        .optional()
        .context("lookup pending confirmation")?;

    if pending.is_some() {
        conn.execute(
            "DELETE FROM pending_confirmations WHERE token = ?1",
            params![token],
        )
        .context("consume pending confirmation")?;
    }
    Ok(pending)
}

pub fn purge_expired(conn: &Connection, now: DateTime<Utc>) -> Result<usize> {
    conn.execute(
        "DELETE FROM pending_confirmations WHERE expires_at_us <= ?1",
        params![to_micros(now)],
    )
    .context("purge expired confirmations")
}
