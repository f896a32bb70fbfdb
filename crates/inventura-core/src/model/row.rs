//! Count values and the derived inventory row.
//!
//! An [`InventoryRow`] is never stored on its own: it is rebuilt from the
//! catalog and the value cache every time a count sheet is opened. The
//! `total` column is derived and has no setter; deserializing a row
//! recomputes it from the three values. Totals are kept finite so every row
//! serializes to plain JSON numbers.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::item::{Cadence, Item, ItemStatus};
use crate::ids;

/// Client-owned counts for one item, keyed by item id in the value cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountValue {
    #[serde(deserialize_with = "null_as_zero")]
    pub value1: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub value2: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub value3: f64,
    pub note: String,
    pub locked: bool,
}

impl CountValue {
    /// Sum of the three values, saturated at `±f64::MAX`.
    #[must_use]
    pub fn total(&self) -> f64 {
        let sum = self.value1 + self.value2 + self.value3;
        if sum.is_nan() {
            0.0
        } else {
            sum.clamp(f64::MIN, f64::MAX)
        }
    }

    /// Whether the unsaturated sum is representable.
    #[must_use]
    pub fn sum_is_finite(&self) -> bool {
        (self.value1 + self.value2 + self.value3).is_finite()
    }
}

/// Older payloads may carry `null` where a non-finite number was written.
fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

/// Per-cadence value cache contents: item id -> counts.
pub type ValueMap = BTreeMap<String, CountValue>;

/// Partial edit of a row's counts. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowPatch {
    pub value1: Option<f64>,
    pub value2: Option<f64>,
    pub value3: Option<f64>,
    pub note: Option<String>,
}

impl RowPatch {
    #[must_use]
    pub const fn touches_values(&self) -> bool {
        self.value1.is_some() || self.value2.is_some() || self.value3.is_some()
    }
}

/// A catalog item joined with its current counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RowRecord", into = "RowRecord")]
pub struct InventoryRow {
    item: Item,
    values: CountValue,
    total: f64,
    row_key: String,
}

impl InventoryRow {
    /// Join `item` with `values` under a fresh ephemeral row key.
    #[must_use]
    pub fn new(item: Item, values: CountValue) -> Self {
        let total = values.total();
        Self {
            item,
            values,
            total,
            row_key: ids::row_key(),
        }
    }

    /// Same row with replaced counts; the row key is kept and the total
    /// recomputed.
    pub(crate) fn with_values(&self, values: CountValue) -> Self {
        Self {
            item: self.item.clone(),
            total: values.total(),
            values,
            row_key: self.row_key.clone(),
        }
    }

    #[must_use]
    pub const fn item(&self) -> &Item {
        &self.item
    }

    #[must_use]
    pub const fn values(&self) -> &CountValue {
        &self.values
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.item.id
    }

    #[must_use]
    pub fn item_number(&self) -> &str {
        &self.item.item_number
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.item.description
    }

    #[must_use]
    pub const fn cadence(&self) -> Cadence {
        self.item.cadence
    }

    #[must_use]
    pub const fn status(&self) -> ItemStatus {
        self.item.status
    }

    #[must_use]
    pub const fn unit_labels(&self) -> &[String; 3] {
        &self.item.unit_labels
    }

    #[must_use]
    pub const fn value1(&self) -> f64 {
        self.values.value1
    }

    #[must_use]
    pub const fn value2(&self) -> f64 {
        self.values.value2
    }

    #[must_use]
    pub const fn value3(&self) -> f64 {
        self.values.value3
    }

    /// Values in unit-slot order.
    #[must_use]
    pub const fn slot_values(&self) -> [f64; 3] {
        [self.values.value1, self.values.value2, self.values.value3]
    }

    #[must_use]
    pub fn note(&self) -> &str {
        &self.values.note
    }

    #[must_use]
    pub const fn locked(&self) -> bool {
        self.values.locked
    }

    #[must_use]
    pub const fn total(&self) -> f64 {
        self.total
    }

    /// Ephemeral key, regenerated whenever a row set is rebuilt or reset.
    #[must_use]
    pub fn row_key(&self) -> &str {
        &self.row_key
    }
}

// The row key is session-local and excluded from equality.
impl PartialEq for InventoryRow {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item && self.values == other.values && self.total == other.total
    }
}

/// Wire shape of a row inside snapshots and API payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RowRecord {
    #[serde(flatten)]
    item: Item,
    #[serde(default, deserialize_with = "null_as_zero")]
    value1: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    value2: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    value3: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    total: f64,
    #[serde(default)]
    note: String,
    #[serde(default)]
    locked: bool,
}

impl From<RowRecord> for InventoryRow {
    fn from(record: RowRecord) -> Self {
        Self::new(
            record.item,
            CountValue {
                value1: record.value1,
                value2: record.value2,
                value3: record.value3,
                note: record.note,
                locked: record.locked,
            },
        )
    }
}

impl From<InventoryRow> for RowRecord {
    fn from(row: InventoryRow) -> Self {
        Self {
            item: row.item,
            value1: row.values.value1,
            value2: row.values.value2,
            value3: row.values.value3,
            total: row.total,
            note: row.values.note,
            locked: row.values.locked,
        }
    }
}
