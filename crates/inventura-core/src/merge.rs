//! Merge engine: catalog items joined with locally cached count values.
//!
//! The catalog is the authority on row membership and order. Cached values
//! are looked up by item id; cache entries whose item no longer exists are
//! dropped without being surfaced. Totals are always recomputed here and
//! never read back from the cache.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::cache::{CacheError, ValueStore};
use crate::model::{Cadence, CountValue, InventoryRow, Item, RowPatch, ValueMap};

/// Build the row set for one catalog.
#[must_use]
pub fn merge_rows(catalog: &[Item], cache: &ValueMap) -> Vec<InventoryRow> {
    let rows: Vec<InventoryRow> = catalog
        .iter()
        .map(|item| {
            let values = cache.get(&item.id).cloned().unwrap_or_default();
            InventoryRow::new(item.clone(), values)
        })
        .collect();

    let known: HashSet<&str> = catalog.iter().map(|item| item.id.as_str()).collect();
    let orphans = cache
        .keys()
        .filter(|id| !known.contains(id.as_str()))
        .count();
    if orphans > 0 {
        debug!(orphans, "dropped cached values without a catalog item");
    }

    rows
}

/// Extract the cache payload from a row set (inverse of [`merge_rows`]).
#[must_use]
pub fn capture_values(rows: &[InventoryRow]) -> ValueMap {
    rows.iter()
        .map(|row| (row.id().to_string(), row.values().clone()))
        .collect()
}

/// What [`try_edit`] did with a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// The row is locked; nothing changed.
    Locked,
    /// The new values would sum past `f64::MAX`; nothing changed.
    Overflow,
}

/// Apply an edit to a row and report whether it took effect.
///
/// Locked rows are returned unchanged, and so is a row whose patched values
/// would no longer have a finite total.
#[must_use]
pub fn try_edit(row: &InventoryRow, patch: &RowPatch) -> (InventoryRow, EditOutcome) {
    if row.locked() {
        return (row.clone(), EditOutcome::Locked);
    }

    let mut values = row.values().clone();
    if let Some(value1) = patch.value1 {
        values.value1 = value1;
    }
    if let Some(value2) = patch.value2 {
        values.value2 = value2;
    }
    if let Some(value3) = patch.value3 {
        values.value3 = value3;
    }
    if !values.sum_is_finite() {
        warn!(item = row.item_number(), "edit dropped: total would overflow");
        return (row.clone(), EditOutcome::Overflow);
    }
    if let Some(note) = &patch.note {
        values.note.clone_from(note);
    }
    (row.with_values(values), EditOutcome::Applied)
}

/// Apply an edit to a row. Locked rows, and edits whose total would
/// overflow, leave the row unchanged.
#[must_use]
pub fn apply_edit(row: &InventoryRow, patch: &RowPatch) -> InventoryRow {
    try_edit(row, patch).0
}

/// Flip the lock flag. Values and total are untouched.
#[must_use]
pub fn toggle_lock(row: &InventoryRow) -> InventoryRow {
    let mut values = row.values().clone();
    values.locked = !values.locked;
    row.with_values(values)
}

/// Fresh rows for `catalog` with every value, note and lock cleared, and
/// the cache key for `cadence` dropped.
pub fn reset_all(
    catalog: &[Item],
    store: &mut dyn ValueStore,
    cadence: Cadence,
) -> Result<Vec<InventoryRow>, CacheError> {
    store.clear(cadence)?;
    Ok(catalog
        .iter()
        .map(|item| InventoryRow::new(item.clone(), CountValue::default()))
        .collect())
}

/// Anything that carries an item business key.
pub trait CatalogEntry {
    fn item_number(&self) -> &str;
}

impl CatalogEntry for Item {
    fn item_number(&self) -> &str {
        &self.item_number
    }
}

impl CatalogEntry for InventoryRow {
    fn item_number(&self) -> &str {
        InventoryRow::item_number(self)
    }
}

/// Unified view across several catalogs: de-duplicated by item number
/// (first occurrence wins), then sorted by item number.
#[must_use]
pub fn unify<T: CatalogEntry + Clone>(groups: &[&[T]]) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut unified: Vec<T> = groups
        .iter()
        .flat_map(|group| group.iter())
        .filter(|entry| seen.insert(entry.item_number().to_string()))
        .cloned()
        .collect();
    unified.sort_by(|a, b| a.item_number().cmp(b.item_number()));
    unified
}

/// Row filter for count sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    /// Case-insensitive substring on item number or description.
    pub search: Option<String>,
    pub only_locked: bool,
    pub only_unlocked: bool,
}

impl RowFilter {
    #[must_use]
    pub fn matches(&self, row: &InventoryRow) -> bool {
        if self.only_locked && !row.locked() {
            return false;
        }
        if self.only_unlocked && row.locked() {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                row.item_number().to_lowercase().contains(&term)
                    || row.description().to_lowercase().contains(&term)
            }
        }
    }
}

#[must_use]
pub fn filter_rows(rows: &[InventoryRow], filter: &RowFilter) -> Vec<InventoryRow> {
    rows.iter().filter(|row| filter.matches(row)).cloned().collect()
}

/// Materials search: item number, description, or any unit label.
#[must_use]
pub fn search_items(items: &[Item], term: &str) -> Vec<Item> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| {
            item.item_number.to_lowercase().contains(&term)
                || item.description.to_lowercase().contains(&term)
                || item
                    .unit_labels
                    .iter()
                    .any(|label| label.to_lowercase().contains(&term))
        })
        .cloned()
        .collect()
}

/// Counting progress: how many rows are locked (done).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Progress {
    pub total: usize,
    pub locked: usize,
    pub percent: u8,
}

#[must_use]
pub fn progress(rows: &[InventoryRow]) -> Progress {
    let total = rows.len();
    let locked = rows.iter().filter(|row| row.locked()).count();
    let percent = if total == 0 {
        0
    } else {
        u8::try_from((locked * 100 + total / 2) / total).unwrap_or(100)
    };
    Progress {
        total,
        locked,
        percent,
    }
}
