//! Inventory snapshot store.
//!
//! Snapshots are owner-scoped: every lookup filters by owner, so a foreign
//! id is indistinguishable from a missing one. Rows are stored as an
//! independent JSON copy taken at save time.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use super::catalog::parse_column;
use super::{from_micros, to_micros};
use crate::ids::{self, SNAPSHOT_PREFIX};
use crate::model::{
    Cadence, InventoryRow, InventorySnapshot, NewSnapshot, SnapshotPatch, SnapshotStatus,
};

const SNAPSHOT_COLUMNS: &str = "inventory_id, owner_id, inventory_date, cadence, items_json, \
    status, completed_at_us, created_at_us, updated_at_us";

pub fn create_snapshot(
    conn: &Connection,
    owner_id: &str,
    new: &NewSnapshot,
) -> Result<InventorySnapshot> {
    let now = Utc::now();
    let snapshot = InventorySnapshot {
        id: ids::new_id(SNAPSHOT_PREFIX),
        owner_id: owner_id.to_string(),
        date: new.date,
        cadence: new.cadence,
        items: new.items.clone(),
        status: new.status,
        completed_at: (new.status == SnapshotStatus::Completed).then_some(now),
        created_at: now,
        updated_at: now,
    };
    let items_json = serde_json::to_string(&snapshot.items).context("encode snapshot rows")?;

    conn.execute(
        "INSERT INTO inventories (inventory_id, owner_id, inventory_date, cadence, items_json,
            status, completed_at_us, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            snapshot.id,
            snapshot.owner_id,
            snapshot.date.to_string(),
            snapshot.cadence.map(Cadence::as_str),
            items_json,
            snapshot.status.as_str(),
            snapshot.completed_at.map(to_micros),
            to_micros(now)
        ],
    )
    .context("insert snapshot")?;

    info!(id = %snapshot.id, date = %snapshot.date, rows = snapshot.items.len(), "snapshot saved");
    Ok(snapshot)
}

/// The owner's snapshots, newest date first.
pub fn list_snapshots(conn: &Connection, owner_id: &str) -> Result<Vec<InventorySnapshot>> {
    let sql = format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM inventories WHERE owner_id = ?1
         ORDER BY inventory_date DESC, created_at_us DESC"
    );
    let mut stmt = conn.prepare(&sql).context("prepare list_snapshots query")?;
    let rows = stmt
        .query_map(params![owner_id], row_to_snapshot)
        .context("execute list_snapshots query")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read list_snapshots rows")
}

pub fn get_snapshot(
    conn: &Connection,
    owner_id: &str,
    snapshot_id: &str,
) -> Result<Option<InventorySnapshot>> {
    let sql = format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM inventories WHERE inventory_id = ?1 AND owner_id = ?2"
    );
    conn.query_row(&sql, params![snapshot_id, owner_id], row_to_snapshot)
        .optional()
        .with_context(|| format!("get_snapshot '{snapshot_id}'"))
}

/// Apply `patch`; last writer wins. `completed_at` is stamped the first time
/// the status becomes completed. Returns `None` for unknown or foreign ids.
pub fn update_snapshot(
    conn: &Connection,
    owner_id: &str,
    snapshot_id: &str,
    patch: &SnapshotPatch,
) -> Result<Option<InventorySnapshot>> {
    let Some(mut snapshot) = get_snapshot(conn, owner_id, snapshot_id)? else {
        return Ok(None);
    };
    let now = Utc::now();

    if let Some(date) = patch.date {
        snapshot.date = date;
    }
    if let Some(items) = &patch.items {
        snapshot.items.clone_from(items);
    }
    if let Some(status) = patch.status {
        if status == SnapshotStatus::Completed && snapshot.completed_at.is_none() {
            snapshot.completed_at = Some(now);
        }
        snapshot.status = status;
    }
    snapshot.updated_at = now;

    let items_json = serde_json::to_string(&snapshot.items).context("encode snapshot rows")?;
    conn.execute(
        "UPDATE inventories SET inventory_date = ?3, items_json = ?4, status = ?5,
            completed_at_us = ?6, updated_at_us = ?7
         WHERE inventory_id = ?1 AND owner_id = ?2",
        params![
            snapshot_id,
            owner_id,
            snapshot.date.to_string(),
            items_json,
            snapshot.status.as_str(),
            snapshot.completed_at.map(to_micros),
            to_micros(now)
        ],
    )
    .with_context(|| format!("update snapshot '{snapshot_id}'"))?;

    info!(id = %snapshot_id, status = %snapshot.status, "snapshot updated");
    Ok(Some(snapshot))
}

pub fn delete_snapshot(conn: &Connection, owner_id: &str, snapshot_id: &str) -> Result<bool> {
    let removed = conn
        .execute(
            "DELETE FROM inventories WHERE inventory_id = ?1 AND owner_id = ?2",
            params![snapshot_id, owner_id],
        )
        .with_context(|| format!("delete snapshot '{snapshot_id}'"))?;
    Ok(removed > 0)
}

fn row_to_snapshot(row: &rusqlite::Row<'_>) -> rusqlite::Result<InventorySnapshot> {
    let date: String = row.get(2)?;
    let cadence: Option<String> = row.get(3)?;
    let items_json: String = row.get(4)?;
    let status: String = row.get(5)?;
    let completed_at: Option<i64> = row.get(6)?;

    let items: Vec<InventoryRow> = serde_json::from_str(&items_json).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(InventorySnapshot {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        date: parse_column::<NaiveDate>(2, &date)?,
        cadence: cadence
            .as_deref()
            .map(|raw| parse_column::<Cadence>(3, raw))
            .transpose()?,
        items,
        status: parse_column::<SnapshotStatus>(5, &status)?,
        completed_at: completed_at.map(|us| from_micros(6, us)).transpose()?,
        created_at: from_micros(7, row.get(7)?)?,
        updated_at: from_micros(8, row.get(8)?)?,
    })
}
