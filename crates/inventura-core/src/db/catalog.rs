//! Item catalog store.
//!
//! One catalog per cadence. `item_number` is unique within a cadence and
//! catalog order is insertion order.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{info, warn};

use super::to_micros;
use crate::ids::{self, ITEM_PREFIX};
use crate::model::{Cadence, Item, ItemPatch, ItemStatus, NewItem};

/// Catalog mutation failures the caller is expected to surface.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("item number '{item_number}' already exists in the {cadence} catalog")]
    DuplicateNumber {
        cadence: Cadence,
        item_number: String,
    },

    #[error("item '{0}' not found")]
    NotFound(String),

    #[error("invalid item: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

const ITEM_COLUMNS: &str = "item_id, cadence, item_number, description, \
    unit_label_1, unit_label_2, unit_label_3, status";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// All items of one cadence in catalog order.
pub fn list_items(conn: &Connection, cadence: Cadence) -> Result<Vec<Item>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE cadence = ?1 ORDER BY rowid");
    let mut stmt = conn.prepare(&sql).context("prepare list_items query")?;
    let rows = stmt
        .query_map(params![cadence.as_str()], row_to_item)
        .context("execute list_items query")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read list_items rows")
}

/// Every catalog, daily first, each in catalog order.
pub fn list_all_items(conn: &Connection) -> Result<Vec<Vec<Item>>> {
    Cadence::ALL
        .iter()
        .map(|cadence| list_items(conn, *cadence))
        .collect()
}

pub fn get_item(conn: &Connection, item_id: &str) -> Result<Option<Item>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE item_id = ?1");
    conn.query_row(&sql, params![item_id], row_to_item)
        .optional()
        .with_context(|| format!("get_item for '{item_id}'"))
}

/// Resolve an item by id, or by item number within `cadence`.
pub fn find_item(conn: &Connection, cadence: Cadence, key: &str) -> Result<Option<Item>> {
    if let Some(item) = get_item(conn, key)? {
        return Ok(Some(item));
    }
    let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE cadence = ?1 AND item_number = ?2");
    conn.query_row(&sql, params![cadence.as_str(), key.trim()], row_to_item)
        .optional()
        .with_context(|| format!("find_item '{key}' in {cadence}"))
}

pub fn item_number_exists(
    conn: &Connection,
    cadence: Cadence,
    item_number: &str,
    except_id: Option<&str>,
) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM items
            WHERE cadence = ?1 AND item_number = ?2 AND item_id IS NOT ?3)",
        params![cadence.as_str(), item_number, except_id],
        |row| row.get(0),
    )
    .context("check item_number uniqueness")
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

pub fn insert_item(conn: &Connection, new: &NewItem) -> Result<Item, CatalogError> {
    let new = new.normalized().map_err(CatalogError::Invalid)?;
    if item_number_exists(conn, new.cadence, &new.item_number, None)? {
        warn!(cadence = %new.cadence, item_number = %new.item_number, "duplicate item number rejected");
        return Err(CatalogError::DuplicateNumber {
            cadence: new.cadence,
            item_number: new.item_number,
        });
    }

    let item = Item {
        id: ids::new_id(ITEM_PREFIX),
        cadence: new.cadence,
        item_number: new.item_number,
        description: new.description,
        unit_labels: new.unit_labels,
        status: new.status,
    };
    let now = to_micros(Utc::now());
    let [label1, label2, label3] = &item.unit_labels;
    conn.execute(
        "INSERT INTO items (item_id, cadence, item_number, description,
            unit_label_1, unit_label_2, unit_label_3, status, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            item.id,
            item.cadence.as_str(),
            item.item_number,
            item.description,
            label1,
            label2,
            label3,
            item.status.as_str(),
            now
        ],
    )
    .with_context(|| format!("insert item '{}'", item.item_number))?;

    info!(id = %item.id, cadence = %item.cadence, item_number = %item.item_number, "item added");
    Ok(item)
}

pub fn update_item(conn: &Connection, item_id: &str, patch: &ItemPatch) -> Result<Item, CatalogError> {
    let current =
        get_item(conn, item_id)?.ok_or_else(|| CatalogError::NotFound(item_id.to_string()))?;
    let next = patch.apply_to(&current).map_err(CatalogError::Invalid)?;

    if next.item_number != current.item_number
        && item_number_exists(conn, next.cadence, &next.item_number, Some(item_id))?
    {
        return Err(CatalogError::DuplicateNumber {
            cadence: next.cadence,
            item_number: next.item_number,
        });
    }

    let [label1, label2, label3] = &next.unit_labels;
    conn.execute(
        "UPDATE items SET item_number = ?2, description = ?3, unit_label_1 = ?4,
            unit_label_2 = ?5, unit_label_3 = ?6, status = ?7, updated_at_us = ?8
         WHERE item_id = ?1",
        params![
            item_id,
            next.item_number,
            next.description,
            label1,
            label2,
            label3,
            next.status.as_str(),
            to_micros(Utc::now())
        ],
    )
    .with_context(|| format!("update item '{item_id}'"))?;

    info!(id = %item_id, "item updated");
    Ok(next)
}

/// Delete one item. Returns the removed item.
pub fn delete_item(conn: &Connection, item_id: &str) -> Result<Item, CatalogError> {
    let item =
        get_item(conn, item_id)?.ok_or_else(|| CatalogError::NotFound(item_id.to_string()))?;
    conn.execute("DELETE FROM items WHERE item_id = ?1", params![item_id])
        .with_context(|| format!("delete item '{item_id}'"))?;
    info!(id = %item_id, "item removed");
    Ok(item)
}

/// Delete a whole cadence catalog. Returns the number of removed items.
pub fn delete_all_items(conn: &Connection, cadence: Cadence) -> Result<usize> {
    let removed = conn
        .execute("DELETE FROM items WHERE cadence = ?1", params![cadence.as_str()])
        .with_context(|| format!("delete {cadence} catalog"))?;
    warn!(cadence = %cadence, removed, "catalog cleared");
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    let cadence: String = row.get(1)?;
    let status: String = row.get(7)?;
    Ok(Item {
        id: row.get(0)?,
        cadence: parse_column(1, &cadence)?,
        item_number: row.get(2)?,
        description: row.get(3)?,
        unit_labels: [row.get(4)?, row.get(5)?, row.get(6)?],
        status: parse_column::<ItemStatus>(7, &status)?,
    })
}

pub(crate) fn parse_column<T>(index: usize, raw: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn new_item(cadence: Cadence, number: &str) -> NewItem {
        NewItem {
            cadence,
            item_number: number.into(),
            description: format!("Item {number}"),
            unit_labels: ["BAL".into(), "KUS".into(), "KU".into()],
            status: ItemStatus::Active,
        }
    }

    #[test]
    fn insert_then_list_in_catalog_order() {
        let conn = open_in_memory().expect("store");
        for number in ["300", "100", "200"] {
            insert_item(&conn, &new_item(Cadence::Daily, number)).expect("insert");
        }
        let numbers: Vec<String> = list_items(&conn, Cadence::Daily)
            .expect("list")
            .into_iter()
            .map(|item| item.item_number)
            .collect();
        assert_eq!(numbers, ["300", "100", "200"]);
        assert!(list_items(&conn, Cadence::Weekly).expect("list").is_empty());
    }

    #[test]
    fn duplicate_number_rejected_per_cadence() {
        let conn = open_in_memory().expect("store");
        insert_item(&conn, &new_item(Cadence::Daily, "A1")).expect("insert");
        insert_item(&conn, &new_item(Cadence::Weekly, "A1")).expect("other cadence ok");
        let err = insert_item(&conn, &new_item(Cadence::Daily, " A1 ")).expect_err("dup");
        assert!(matches!(err, CatalogError::DuplicateNumber { .. }));
    }

    #[test]
    fn blank_fields_are_invalid() {
        let conn = open_in_memory().expect("store");
        let mut item = new_item(Cadence::Daily, " ");
        item.unit_labels[2] = String::new();
        match insert_item(&conn, &item) {
            Err(CatalogError::Invalid(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[test]
    fn update_checks_rename_collisions() {
        let conn = open_in_memory().expect("store");
        let a = insert_item(&conn, &new_item(Cadence::Monthly, "A")).expect("insert");
        insert_item(&conn, &new_item(Cadence::Monthly, "B")).expect("insert");

        let rename = ItemPatch {
            item_number: Some("B".into()),
            ..ItemPatch::default()
        };
        assert!(matches!(
            update_item(&conn, &a.id, &rename),
            Err(CatalogError::DuplicateNumber { .. })
        ));

        let patch = ItemPatch {
            description: Some("Renamed".into()),
            status: Some(ItemStatus::Inactive),
            ..ItemPatch::default()
        };
        let updated = update_item(&conn, &a.id, &patch).expect("update");
        assert_eq!(updated.description, "Renamed");
        assert_eq!(get_item(&conn, &a.id).expect("get"), Some(updated));
    }

    #[test]
    fn find_by_id_or_number() {
        let conn = open_in_memory().expect("store");
        let a = insert_item(&conn, &new_item(Cadence::Daily, "X-9")).expect("insert");
        assert_eq!(find_item(&conn, Cadence::Daily, &a.id).expect("find"), Some(a.clone()));
        assert_eq!(find_item(&conn, Cadence::Daily, "X-9").expect("find"), Some(a));
        assert_eq!(find_item(&conn, Cadence::Weekly, "X-9").expect("find"), None);
    }

    #[test]
    fn delete_one_and_all() {
        let conn = open_in_memory().expect("store");
        let a = insert_item(&conn, &new_item(Cadence::Daily, "1")).expect("insert");
        insert_item(&conn, &new_item(Cadence::Daily, "2")).expect("insert");
        insert_item(&conn, &new_item(Cadence::Weekly, "3")).expect("insert");

        delete_item(&conn, &a.id).expect("delete");
        assert!(matches!(delete_item(&conn, &a.id), Err(CatalogError::NotFound(_))));
        assert_eq!(delete_all_items(&conn, Cadence::Daily).expect("clear"), 1);
        assert_eq!(list_items(&conn, Cadence::Weekly).expect("list").len(), 1);
    }
}
