//! Domain types shared by the stores, the merge engine, and the report generator.

pub mod item;
pub mod row;
pub mod snapshot;
pub mod user;

pub use item::{Cadence, Item, ItemPatch, ItemStatus, NewItem};
pub use row::{CountValue, InventoryRow, RowPatch, ValueMap};
pub use snapshot::{InventorySnapshot, NewSnapshot, SnapshotPatch, SnapshotStatus};
pub use user::{Role, User};

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}': expected one of {expected}")]
pub struct InvalidEnumValue {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl InvalidEnumValue {
    pub(crate) fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}
