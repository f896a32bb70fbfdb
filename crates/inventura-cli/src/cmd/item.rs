//! `inv item`: catalog management.
//!
//! Reads are public; writes need a session. `clear` never deletes directly:
//! it hands out a confirmation token for `inv confirm`.

use super::{api_failure, store_api};
use crate::cmd::confirm::render_pending;
use crate::output::{
    CliError, OutputMode, Renderable, fail, pretty_kv, pretty_section, render, render_list,
};
use crate::project::Project;
use clap::{Args, Subcommand};
use inventura_core::confirm::{ConfirmationGate, DestructiveAction};
use inventura_core::db::catalog;
use inventura_core::error::ErrorCode;
use inventura_core::merge::search_items;
use inventura_core::model::{Cadence, Item, ItemPatch, ItemStatus, NewItem};
use std::io::{self, Write};
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    #[command(
        about = "List catalog items",
        after_help = "EXAMPLES:\n    # Daily catalog in insertion order\n    inv item list --cadence daily\n\n    # Every cadence, filtered\n    inv item list --search rukavice --json"
    )]
    List(ItemListArgs),

    #[command(
        about = "Add a catalog item",
        after_help = "EXAMPLES:\n    inv item add --cadence daily --number 1001 --description \"Paper towels\" --units BAL,KUS,KU"
    )]
    Add(ItemAddArgs),

    #[command(
        about = "Edit a catalog item",
        after_help = "EXAMPLES:\n    # By id\n    inv item edit itm-3f2a9c01 --description \"Paper towels XL\"\n\n    # By item number within a cadence\n    inv item edit 1001 --cadence daily --status inactive"
    )]
    Edit(ItemEditArgs),

    #[command(
        about = "Remove a catalog item",
        after_help = "EXAMPLES:\n    inv item remove 1001 --cadence daily"
    )]
    Remove(ItemRemoveArgs),

    #[command(
        about = "Delete every item of one cadence (two confirmations)",
        after_help = "EXAMPLES:\n    inv item clear --cadence weekly\n    inv confirm <token>\n    inv confirm <next-token>"
    )]
    Clear(ItemClearArgs),
}

#[derive(Args, Debug)]
pub struct ItemListArgs {
    /// Catalog to list; all cadences when omitted.
    #[arg(short, long)]
    pub cadence: Option<Cadence>,

    /// Match item number, description or unit labels.
    #[arg(short, long)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct ItemAddArgs {
    #[arg(short, long)]
    pub cadence: Cadence,

    /// Business item number (unique within the cadence).
    #[arg(short, long)]
    pub number: String,

    #[arg(short, long)]
    pub description: String,

    /// The three unit labels, comma separated (e.g. `BAL,KUS,KU`).
    #[arg(short, long, value_delimiter = ',')]
    pub units: Vec<String>,

    #[arg(long, default_value = "active")]
    pub status: ItemStatus,
}

#[derive(Args, Debug)]
pub struct ItemEditArgs {
    /// Item id, or item number together with `--cadence`.
    pub item: String,

    #[arg(short, long)]
    pub cadence: Option<Cadence>,

    #[arg(short, long)]
    pub number: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(short, long, value_delimiter = ',')]
    pub units: Option<Vec<String>>,

    #[arg(long)]
    pub status: Option<ItemStatus>,
}

#[derive(Args, Debug)]
pub struct ItemRemoveArgs {
    /// Item id, or item number together with `--cadence`.
    pub item: String,

    #[arg(short, long)]
    pub cadence: Option<Cadence>,
}

#[derive(Args, Debug)]
pub struct ItemClearArgs {
    #[arg(short, long)]
    pub cadence: Cadence,
}

impl Renderable for Item {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &format!("{}  {}", self.item_number, self.description))?;
        pretty_kv(w, "Id", &self.id)?;
        pretty_kv(w, "Cadence", self.cadence.as_str())?;
        pretty_kv(w, "Units", self.unit_labels.join(" / "))?;
        pretty_kv(w, "Status", self.status.as_str())?;
        writeln!(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self)?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}",
            self.id,
            self.cadence,
            self.item_number,
            self.status,
            self.unit_labels.join("/"),
            self.description
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "CADENCE", "NUMBER", "STATUS", "UNITS", "DESCRIPTION"]
    }
}

fn unit_labels(output: OutputMode, raw: &[String]) -> anyhow::Result<[String; 3]> {
    <[String; 3]>::try_from(raw.to_vec()).map_err(|given| {
        fail(
            output,
            CliError::coded(
                ErrorCode::ValidationFailed,
                format!("exactly three unit labels are required, got {}", given.len()),
            ),
        )
    })
}

/// Resolve an item by id, falling back to its number inside `cadence`.
fn resolve_item(
    project: &Project,
    output: OutputMode,
    key: &str,
    cadence: Option<Cadence>,
) -> anyhow::Result<Item> {
    if let Some(item) = catalog::get_item(&project.conn, key.trim())? {
        return Ok(item);
    }
    if let Some(cadence) = cadence
        && let Some(item) = catalog::find_item(&project.conn, cadence, key)?
    {
        return Ok(item);
    }
    let detail = match cadence {
        Some(cadence) => format!("no {cadence} item with id or number '{key}'"),
        None => format!("no item with id '{key}' (pass --cadence to look up by number)"),
    };
    Err(fail(output, CliError::coded(ErrorCode::ItemNotFound, detail)))
}

pub fn run_item(command: &ItemCommand, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    match command {
        ItemCommand::List(args) => run_list(&project, args, output),
        ItemCommand::Add(args) => run_add(&project, args, output),
        ItemCommand::Edit(args) => run_edit(&project, args, output),
        ItemCommand::Remove(args) => run_remove(&project, args, output),
        ItemCommand::Clear(args) => run_clear(&project, args, output),
    }
}

fn run_list(project: &Project, args: &ItemListArgs, output: OutputMode) -> anyhow::Result<()> {
    let items = store_api(project)
        .list_items(args.cadence)
        .map_err(|err| api_failure(output, err, ErrorCode::ItemNotFound))?;
    let items = match args.search.as_deref() {
        Some(term) => search_items(&items, term),
        None => items,
    };
    if items.is_empty() && !output.is_json() {
        println!("No items found.");
        return Ok(());
    }
    render_list(&items, output)?;
    Ok(())
}

fn run_add(project: &Project, args: &ItemAddArgs, output: OutputMode) -> anyhow::Result<()> {
    let new = NewItem {
        cadence: args.cadence,
        item_number: args.number.clone(),
        description: args.description.clone(),
        unit_labels: unit_labels(output, &args.units)?,
        status: args.status,
    };
    let item = store_api(project)
        .create_item(project.authorization().as_deref(), &new)
        .map_err(|err| api_failure(output, err, ErrorCode::ItemNotFound))?;
    render(output, &item, |item, w| {
        writeln!(w, "✓ Added {} {} ({})", item.cadence, item.item_number, item.id)
    })
}

fn run_edit(project: &Project, args: &ItemEditArgs, output: OutputMode) -> anyhow::Result<()> {
    let patch = ItemPatch {
        item_number: args.number.clone(),
        description: args.description.clone(),
        unit_labels: args
            .units
            .as_deref()
            .map(|raw| unit_labels(output, raw))
            .transpose()?,
        status: args.status,
    };
    if patch.is_empty() {
        return Err(fail(
            output,
            CliError::coded(
                ErrorCode::ValidationFailed,
                "nothing to change: pass --number, --description, --units or --status",
            ),
        ));
    }
    let target = resolve_item(project, output, &args.item, args.cadence)?;
    let item = store_api(project)
        .update_item(project.authorization().as_deref(), &target.id, &patch)
        .map_err(|err| api_failure(output, err, ErrorCode::ItemNotFound))?;
    render(output, &item, |item, w| {
        writeln!(w, "✓ Updated {} {} ({})", item.cadence, item.item_number, item.id)
    })
}

fn run_remove(project: &Project, args: &ItemRemoveArgs, output: OutputMode) -> anyhow::Result<()> {
    let target = resolve_item(project, output, &args.item, args.cadence)?;
    let item = store_api(project)
        .delete_item(project.authorization().as_deref(), &target.id)
        .map_err(|err| api_failure(output, err, ErrorCode::ItemNotFound))?;
    render(output, &item, |item, w| {
        writeln!(w, "✓ Removed {} {} ({})", item.cadence, item.item_number, item.id)
    })
}

fn run_clear(project: &Project, args: &ItemClearArgs, output: OutputMode) -> anyhow::Result<()> {
    store_api(project)
        .me(project.authorization().as_deref())
        .map_err(|err| api_failure(output, err, ErrorCode::NotLoggedIn))?;
    let gate = ConfirmationGate::new(&project.conn, project.config.confirm.ttl_secs);
    let pending = gate.request(DestructiveAction::DeleteAllItems(args.cadence))?;
    render_pending(output, &pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(subcommand)]
        command: ItemCommand,
    }

    #[test]
    fn add_parses_comma_separated_units() {
        let w = Wrapper::parse_from([
            "test", "add", "-c", "weekly", "-n", "42", "-d", "Soap", "-u", "BAL,KUS,KU",
        ]);
        let ItemCommand::Add(args) = w.command else {
            panic!("expected add");
        };
        assert_eq!(args.cadence, Cadence::Weekly);
        assert_eq!(args.units, ["BAL", "KUS", "KU"]);
        assert_eq!(args.status, ItemStatus::Active);
    }

    #[test]
    fn list_cadence_is_optional() {
        let w = Wrapper::parse_from(["test", "list"]);
        assert!(matches!(w.command, ItemCommand::List(ItemListArgs { cadence: None, .. })));
    }

    #[test]
    fn invalid_cadence_is_rejected() {
        assert!(Wrapper::try_parse_from(["test", "clear", "--cadence", "yearly"]).is_err());
    }

    #[test]
    fn unit_labels_require_exactly_three() {
        assert!(unit_labels(OutputMode::Json, &["A".into(), "B".into()]).is_err());
        let labels = unit_labels(OutputMode::Json, &["A".into(), "B".into(), "C".into()]).unwrap();
        assert_eq!(labels, ["A", "B", "C"]);
    }
}
