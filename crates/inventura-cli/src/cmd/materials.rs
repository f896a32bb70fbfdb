//! `inv materials`: one list across every cadence, de-duplicated on item
//! number (first cadence wins) and sorted.

use super::load_material_rows;
use crate::output::{OutputMode, render_list};
use crate::project::Project;
use clap::Args;
use inventura_core::merge::search_items;
use inventura_core::model::{InventoryRow, Item};
use std::collections::HashSet;
use std::path::Path;

#[derive(Args, Debug)]
pub struct MaterialsArgs {
    /// Match item number, description or unit labels.
    #[arg(short, long)]
    pub search: Option<String>,
}

fn matching(rows: Vec<InventoryRow>, term: Option<&str>) -> Vec<InventoryRow> {
    let Some(term) = term else {
        return rows;
    };
    let items: Vec<Item> = rows.iter().map(|row| row.item().clone()).collect();
    let hits: HashSet<String> = search_items(&items, term)
        .into_iter()
        .map(|item| item.id)
        .collect();
    rows.into_iter().filter(|row| hits.contains(row.id())).collect()
}

pub fn run_materials(args: &MaterialsArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let rows = matching(load_material_rows(&project, output)?, args.search.as_deref());
    if rows.is_empty() && !output.is_json() {
        println!("No materials found.");
        return Ok(());
    }
    render_list(&rows, output)?;
    Ok(())
}
