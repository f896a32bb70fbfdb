//! `inv snapshot`: dated, owner-scoped copies of the count sheet.

use super::{api_failure, load_rows, store_api};
use crate::output::{
    OutputMode, Renderable, pretty_kv, pretty_section, render, render_list, render_success,
    write_list,
};
use crate::project::Project;
use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use inventura_core::error::ErrorCode;
use inventura_core::model::{Cadence, InventorySnapshot, NewSnapshot, SnapshotPatch, SnapshotStatus};
use std::io::{self, Write};
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum SnapshotCommand {
    #[command(
        about = "Save the current count sheet",
        after_help = "EXAMPLES:\n    inv snapshot save --cadence daily\n\n    inv snapshot save --cadence monthly --date 2025-01-31 --status completed"
    )]
    Save(SnapshotSaveArgs),

    #[command(
        about = "List your snapshots, newest first",
        after_help = "EXAMPLES:\n    inv snapshot list\n\n    inv snapshot list --json"
    )]
    List,

    #[command(
        about = "Show one snapshot with its rows",
        after_help = "EXAMPLES:\n    inv snapshot show inv-0a1b2c3d"
    )]
    Show(SnapshotIdArgs),

    #[command(
        about = "Change the workflow status of a snapshot",
        after_help = "EXAMPLES:\n    inv snapshot status inv-0a1b2c3d completed"
    )]
    Status(SnapshotStatusArgs),

    #[command(
        about = "Delete a snapshot",
        after_help = "EXAMPLES:\n    inv snapshot delete inv-0a1b2c3d"
    )]
    Delete(SnapshotIdArgs),
}

#[derive(Args, Debug)]
pub struct SnapshotSaveArgs {
    #[arg(short, long, default_value = "daily")]
    pub cadence: Cadence,

    /// Inventory date (`YYYY-MM-DD`); today when omitted.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long, default_value = "draft")]
    pub status: SnapshotStatus,
}

#[derive(Args, Debug)]
pub struct SnapshotIdArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct SnapshotStatusArgs {
    pub id: String,
    pub status: SnapshotStatus,
}

impl Renderable for InventorySnapshot {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let locked = self.items.iter().filter(|row| row.locked()).count();
        pretty_section(w, &format!("{}  {}", self.id, self.date))?;
        pretty_kv(
            w,
            "Cadence",
            self.cadence.map_or("-", Cadence::as_str),
        )?;
        pretty_kv(w, "Status", self.status.as_str())?;
        pretty_kv(w, "Rows", format!("{} ({locked} locked)", self.items.len()))?;
        if let Some(done) = self.completed_at {
            pretty_kv(w, "Completed", done.to_rfc3339())?;
        }
        writeln!(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self)?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}  {}",
            self.id,
            self.date,
            self.cadence.map_or("-", Cadence::as_str),
            self.status,
            self.items.len()
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "DATE", "CADENCE", "STATUS", "ROWS"]
    }
}

pub fn run_snapshot(
    command: &SnapshotCommand,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let api = store_api(&project);
    let authorization = project.authorization();
    let authorization = authorization.as_deref();
    let not_found = |err| api_failure(output, err, ErrorCode::SnapshotNotFound);

    match command {
        SnapshotCommand::Save(args) => {
            let new = NewSnapshot {
                date: args.date.unwrap_or_else(|| Local::now().date_naive()),
                cadence: Some(args.cadence),
                items: load_rows(&project, args.cadence, output)?,
                status: args.status,
            };
            let saved = api.create_inventory(authorization, &new).map_err(not_found)?;
            render(output, &saved, |s, w| {
                writeln!(
                    w,
                    "✓ Saved {} snapshot {} for {} ({} rows)",
                    args.cadence,
                    s.id,
                    s.date,
                    s.items.len()
                )
            })
        }
        SnapshotCommand::List => {
            let snapshots = api.list_inventories(authorization).map_err(not_found)?;
            if snapshots.is_empty() && !output.is_json() {
                println!("No snapshots saved.");
                return Ok(());
            }
            render_list(&snapshots, output)?;
            Ok(())
        }
        SnapshotCommand::Show(args) => {
            let snapshot = api.get_inventory(authorization, &args.id).map_err(not_found)?;
            render(output, &snapshot, |s, w| {
                s.render_human(w)?;
                write_list(w, &s.items, OutputMode::Pretty)
            })
        }
        SnapshotCommand::Status(args) => {
            let patch = SnapshotPatch {
                status: Some(args.status),
                ..SnapshotPatch::default()
            };
            let updated = api
                .update_inventory(authorization, &args.id, &patch)
                .map_err(not_found)?;
            render(output, &updated, |s, w| {
                writeln!(w, "✓ Snapshot {} is now {}", s.id, s.status)
            })
        }
        SnapshotCommand::Delete(args) => {
            api.delete_inventory(authorization, &args.id)
                .map_err(not_found)?;
            render_success(output, &format!("Deleted snapshot {}", args.id))
        }
    }
}
