//! Two-phase gate for destructive bulk operations.
//!
//! `request` hands back a pending token; `confirm` consumes it and either
//! releases the action or, for multi-step actions, issues the next token.
//! Tokens are single-use and expire after a TTL. Nothing is executed here:
//! the caller runs the released action.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::db::confirmations;
use crate::ids;
use crate::model::Cadence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "cadence")]
pub enum DestructiveAction {
    /// Wipe one cadence catalog. Needs two confirmations.
    DeleteAllItems(Cadence),
    /// Zero every count and drop the value cache key. One confirmation.
    ResetValues(Cadence),
}

impl DestructiveAction {
    #[must_use]
    pub const fn steps(self) -> u32 {
        match self {
            Self::DeleteAllItems(_) => 2,
            Self::ResetValues(_) => 1,
        }
    }

    #[must_use]
    pub const fn cadence(self) -> Cadence {
        match self {
            Self::DeleteAllItems(cadence) | Self::ResetValues(cadence) => cadence,
        }
    }

    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::DeleteAllItems(_) => "delete_all_items",
            Self::ResetValues(_) => "reset_values",
        }
    }

    pub(crate) fn from_parts(kind: &str, cadence: Cadence) -> Option<Self> {
        match kind {
            "delete_all_items" => Some(Self::DeleteAllItems(cadence)),
            "reset_values" => Some(Self::ResetValues(cadence)),
            _ => None,
        }
    }

    /// Operator-facing prompt for a given step.
    #[must_use]
    pub fn prompt(self, step: u32) -> String {
        match (self, step) {
            (Self::DeleteAllItems(cadence), 1) => {
                format!("Delete ALL items in the {cadence} catalog?")
            }
            (Self::DeleteAllItems(cadence), _) => {
                format!("This cannot be undone. Really delete every {cadence} item?")
            }
            (Self::ResetValues(cadence), _) => {
                format!("Reset every {cadence} count, note and lock?")
            }
        }
    }
}

impl fmt::Display for DestructiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind(), self.cadence())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingConfirmation {
    pub token: String,
    pub action: DestructiveAction,
    /// 1-based step this token confirms.
    pub step: u32,
    pub steps: u32,
    pub expires_at: DateTime<Utc>,
}

impl PendingConfirmation {
    #[must_use]
    pub fn prompt(&self) -> String {
        self.action.prompt(self.step)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmed {
    /// Every step confirmed; run the action.
    Execute(DestructiveAction),
    /// Another confirmation is required.
    NextStep(PendingConfirmation),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfirmError {
    #[error("unknown or already used confirmation token '{0}'")]
    UnknownToken(String),

    #[error("confirmation token '{0}' expired")]
    Expired(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Confirmation gate backed by the store.
pub struct ConfirmationGate<'a> {
    conn: &'a Connection,
    ttl: Duration,
}

impl<'a> ConfirmationGate<'a> {
    #[must_use]
    pub fn new(conn: &'a Connection, ttl_secs: i64) -> Self {
        Self {
            conn,
            ttl: Duration::seconds(ttl_secs.max(1)),
        }
    }

    pub fn request(&self, action: DestructiveAction) -> Result<PendingConfirmation, ConfirmError> {
        self.request_at(action, Utc::now())
    }

    pub fn request_at(
        &self,
        action: DestructiveAction,
        now: DateTime<Utc>,
    ) -> Result<PendingConfirmation, ConfirmError> {
        confirmations::purge_expired(self.conn, now)?;
        let pending = self.issue(action, 1, now)?;
        info!(action = %action, steps = pending.steps, "confirmation requested");
        Ok(pending)
    }

    pub fn confirm(&self, token: &str) -> Result<Confirmed, ConfirmError> {
        self.confirm_at(token, Utc::now())
    }

    pub fn confirm_at(&self, token: &str, now: DateTime<Utc>) -> Result<Confirmed, ConfirmError> {
        let pending = confirmations::take_pending(self.conn, token.trim())?
            .ok_or_else(|| ConfirmError::UnknownToken(token.to_string()))?;

        if pending.expires_at <= now {
            warn!(action = %pending.action, "confirmation token expired");
            return Err(ConfirmError::Expired(token.to_string()));
        }

        if pending.step >= pending.steps {
            info!(action = %pending.action, "destructive action confirmed");
            return Ok(Confirmed::Execute(pending.action));
        }

        let next = self.issue(pending.action, pending.step + 1, now)?;
        Ok(Confirmed::NextStep(next))
    }

    fn issue(
        &self,
        action: DestructiveAction,
        step: u32,
        now: DateTime<Utc>,
    ) -> Result<PendingConfirmation, ConfirmError> {
        let pending = PendingConfirmation {
            token: ids::random_hex(8),
            action,
            step,
            steps: action.steps(),
            expires_at: now + self.ttl,
        };
        confirmations::insert_pending(self.conn, &pending, now)?;
        Ok(pending)
    }
}
