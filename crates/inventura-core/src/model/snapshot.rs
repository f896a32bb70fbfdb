use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::InvalidEnumValue;
use super::item::Cadence;
use super::row::InventoryRow;

/// Workflow status of a saved snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    #[default]
    Draft,
    Completed,
    Archived,
}

impl SnapshotStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "completed" | "complete" | "done" => Ok(Self::Completed),
            "archived" | "archive" => Ok(Self::Archived),
            _ => Err(InvalidEnumValue::new(
                "snapshot status",
                s,
                "draft, completed, archived",
            )),
        }
    }
}

/// A saved, dated, point-in-time copy of counted rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    pub id: String,
    pub owner_id: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<Cadence>,
    pub items: Vec<InventoryRow>,
    pub status: SnapshotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for saving a new snapshot. The owner comes from the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSnapshot {
    pub date: NaiveDate,
    #[serde(default)]
    pub cadence: Option<Cadence>,
    #[serde(default)]
    pub items: Vec<InventoryRow>,
    #[serde(default)]
    pub status: SnapshotStatus,
}

/// Partial snapshot update; last writer wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotPatch {
    pub date: Option<NaiveDate>,
    pub items: Option<Vec<InventoryRow>>,
    pub status: Option<SnapshotStatus>,
}
