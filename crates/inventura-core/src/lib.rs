//! inventura-core library.
//!
//! Catalog and snapshot stores, the count-value merge engine, and the
//! report generator behind the `inv` CLI.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums at module seams, `anyhow::Result` for
//!   store plumbing.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod confirm;
pub mod db;
pub mod error;
pub mod ids;
pub mod merge;
pub mod model;
pub mod numeric;
pub mod report;

pub use model::{
    Cadence, CountValue, InventoryRow, InventorySnapshot, Item, ItemStatus, RowPatch,
    SnapshotStatus, ValueMap,
};
