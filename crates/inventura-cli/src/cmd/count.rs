//! `inv count`: the count sheet.
//!
//! Rows are rebuilt on every invocation from the catalog and the local value
//! cache. Edits and lock toggles write the whole cadence map back to the
//! cache; nothing here touches the server-side store.

use super::{api_failure, find_row, load_rows, store_api};
use crate::cmd::confirm::render_pending;
use crate::output::{
    CliError, OutputMode, Renderable, fail, pretty_rule, render, write_list,
};
use crate::project::Project;
use clap::{Args, Subcommand};
use inventura_core::cache::ValueStore;
use inventura_core::confirm::{ConfirmationGate, DestructiveAction};
use inventura_core::error::ErrorCode;
use inventura_core::merge::{
    EditOutcome, Progress, RowFilter, capture_values, filter_rows, progress, toggle_lock,
    try_edit,
};
use inventura_core::model::{Cadence, InventoryRow, RowPatch};
use inventura_core::numeric::{format_quantity, parse_quantity};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Subcommand, Debug)]
pub enum CountCommand {
    #[command(
        about = "Show the count sheet",
        after_help = "EXAMPLES:\n    inv count show --cadence daily\n\n    # Rows still to count\n    inv count show --unlocked --search papier"
    )]
    Show(CountShowArgs),

    #[command(
        about = "Enter quantities for one row",
        long_about = "Enter quantities for one row. Each value accepts a `+`-separated sum such as `2+3`; anything unparsable counts as 0.",
        after_help = "EXAMPLES:\n    inv count set 1001 --v1 2+3 --v3 4\n\n    inv count set 1001 --cadence weekly --note \"shelf B\""
    )]
    Set(CountSetArgs),

    #[command(
        about = "Lock or unlock a row",
        after_help = "EXAMPLES:\n    inv count lock 1001\n\n    # Run again to unlock\n    inv count lock 1001"
    )]
    Lock(CountRowArgs),

    #[command(
        about = "Clear every count, note and lock (one confirmation)",
        after_help = "EXAMPLES:\n    inv count reset --cadence daily\n    inv confirm <token>"
    )]
    Reset(CadenceArg),
}

#[derive(Args, Debug)]
pub struct CadenceArg {
    #[arg(short, long, default_value = "daily")]
    pub cadence: Cadence,
}

#[derive(Args, Debug)]
pub struct CountShowArgs {
    #[command(flatten)]
    pub cadence: CadenceArg,

    /// Match item number or description.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only locked rows.
    #[arg(long, conflicts_with = "unlocked")]
    pub locked: bool,

    /// Only rows still open.
    #[arg(long)]
    pub unlocked: bool,
}

#[derive(Args, Debug)]
pub struct CountRowArgs {
    /// Item id or item number.
    pub item: String,

    #[command(flatten)]
    pub cadence: CadenceArg,
}

#[derive(Args, Debug)]
pub struct CountSetArgs {
    #[command(flatten)]
    pub row: CountRowArgs,

    /// Quantity for the first unit.
    #[arg(long = "v1", allow_hyphen_values = true)]
    pub value1: Option<String>,

    /// Quantity for the second unit.
    #[arg(long = "v2", allow_hyphen_values = true)]
    pub value2: Option<String>,

    /// Quantity for the third unit.
    #[arg(long = "v3", allow_hyphen_values = true)]
    pub value3: Option<String>,

    #[arg(long)]
    pub note: Option<String>,
}

impl CountSetArgs {
    fn patch(&self) -> RowPatch {
        RowPatch {
            value1: self.value1.as_deref().map(parse_quantity),
            value2: self.value2.as_deref().map(parse_quantity),
            value3: self.value3.as_deref().map(parse_quantity),
            note: self.note.clone(),
        }
    }
}

impl Renderable for InventoryRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let cells: Vec<String> = self
            .unit_labels()
            .iter()
            .zip(self.slot_values())
            .map(|(label, value)| format!("{label} {:>8}", format_quantity(value)))
            .collect();
        writeln!(
            w,
            "{} {:<10} {:<32} {}  = {:>8}",
            if self.locked() { "🔒" } else { "  " },
            self.item_number(),
            truncate(self.description(), 32),
            cells.join("  "),
            format_quantity(self.total()),
        )?;
        if !self.note().is_empty() {
            writeln!(w, "   {:<10} note: {}", "", self.note())?;
        }
        Ok(())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self)?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let [v1, v2, v3] = self.slot_values().map(format_quantity);
        writeln!(
            w,
            "{}  {}  {v1}  {v2}  {v3}  {}  {}  {}",
            self.id(),
            self.item_number(),
            format_quantity(self.total()),
            if self.locked() { "locked" } else { "open" },
            self.description()
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "NUMBER", "V1", "V2", "V3", "TOTAL", "STATE", "DESCRIPTION"]
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

#[derive(Serialize)]
struct SheetOutput<'a> {
    cadence: Cadence,
    progress: Progress,
    rows: &'a [InventoryRow],
}

pub fn run_count(command: &CountCommand, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    match command {
        CountCommand::Show(args) => run_show(&project, args, output),
        CountCommand::Set(args) => run_set(&project, args, output),
        CountCommand::Lock(args) => run_lock(&project, args, output),
        CountCommand::Reset(args) => run_reset(&project, args, output),
    }
}

fn run_show(project: &Project, args: &CountShowArgs, output: OutputMode) -> anyhow::Result<()> {
    let cadence = args.cadence.cadence;
    let rows = load_rows(project, cadence, output)?;
    let overall = progress(&rows);
    let filter = RowFilter {
        search: args.search.clone(),
        only_locked: args.locked,
        only_unlocked: args.unlocked,
    };
    let visible = filter_rows(&rows, &filter);
    debug!(%cadence, total = rows.len(), visible = visible.len(), "count sheet loaded");

    let payload = SheetOutput {
        cadence,
        progress: overall,
        rows: &visible,
    };
    render(output, &payload, |p, w| {
        if output.is_pretty() {
            writeln!(
                w,
                "{} count sheet: {}/{} locked ({}%)",
                p.cadence.label(),
                p.progress.locked,
                p.progress.total,
                p.progress.percent
            )?;
            pretty_rule(w)?;
        }
        if p.rows.is_empty() {
            return writeln!(w, "No rows.");
        }
        write_list(w, p.rows, output)
    })
}

/// Apply `change` to one row and persist the cadence map.
fn update_row(
    project: &Project,
    output: OutputMode,
    args: &CountRowArgs,
    change: impl FnOnce(&InventoryRow) -> anyhow::Result<InventoryRow>,
) -> anyhow::Result<InventoryRow> {
    let cadence = args.cadence.cadence;
    let mut rows = load_rows(project, cadence, output)?;
    let Some((index, row)) = find_row(&rows, &args.item) else {
        return Err(fail(
            output,
            CliError::coded(
                ErrorCode::ItemNotFound,
                format!("no {cadence} row for '{}'", args.item),
            ),
        ));
    };
    let updated = change(row)?;
    rows[index] = updated.clone();
    project
        .value_store()
        .save(cadence, &capture_values(&rows))
        .map_err(|err| fail(output, CliError::coded(ErrorCode::CacheWriteFailed, err.to_string())))?;
    Ok(updated)
}

fn run_set(project: &Project, args: &CountSetArgs, output: OutputMode) -> anyhow::Result<()> {
    let patch = args.patch();
    if !patch.touches_values() && patch.note.is_none() {
        return Err(fail(
            output,
            CliError::coded(
                ErrorCode::ValidationFailed,
                "nothing to change: pass --v1, --v2, --v3 or --note",
            ),
        ));
    }
    let mut outcome = EditOutcome::Applied;
    let row = update_row(project, output, &args.row, |row| {
        let (next, result) = try_edit(row, &patch);
        outcome = result;
        Ok(next)
    })?;
    let warning = edit_warning(&row, outcome);
    if let Some(message) = &warning {
        warn!(item = row.item_number(), "{message}");
    }
    render(output, &row, |row, w| match &warning {
        Some(message) => writeln!(w, "! {message}"),
        None => writeln!(
            w,
            "✓ {} total {}",
            row.item_number(),
            format_quantity(row.total())
        ),
    })
}

/// Operator-facing note for an edit that left the row unchanged.
fn edit_warning(row: &InventoryRow, outcome: EditOutcome) -> Option<String> {
    let item = row.item_number();
    match outcome {
        EditOutcome::Applied => None,
        EditOutcome::Locked => Some(format!(
            "{item} is locked, values unchanged ({})",
            ErrorCode::RowLocked.hint().unwrap_or_default()
        )),
        EditOutcome::Overflow => Some(format!(
            "{item} unchanged: total would exceed {}",
            format_quantity(f64::MAX)
        )),
    }
}

fn run_lock(project: &Project, args: &CountRowArgs, output: OutputMode) -> anyhow::Result<()> {
    let row = update_row(project, output, args, |row| Ok(toggle_lock(row)))?;
    render(output, &row, |row, w| {
        let state = if row.locked() { "locked" } else { "unlocked" };
        writeln!(w, "✓ {} {state}", row.item_number())
    })
}

fn run_reset(project: &Project, args: &CadenceArg, output: OutputMode) -> anyhow::Result<()> {
    // The reset itself is local; a session keeps the gate tied to an operator.
    store_api(project)
        .me(project.authorization().as_deref())
        .map_err(|err| api_failure(output, err, ErrorCode::NotLoggedIn))?;
    let gate = ConfirmationGate::new(&project.conn, project.config.confirm.ttl_secs);
    let pending = gate.request(DestructiveAction::ResetValues(args.cadence))?;
    render_pending(output, &pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use inventura_core::model::{CountValue, Item, ItemStatus};

    #[derive(Parser)]
    struct Wrapper {
        #[command(subcommand)]
        command: CountCommand,
    }

    #[test]
    fn set_parses_expressions_into_a_patch() {
        let w = Wrapper::parse_from(["test", "set", "1001", "--v1", "2+3", "--v3", "abc"]);
        let CountCommand::Set(args) = w.command else {
            panic!("expected set");
        };
        assert_eq!(args.row.cadence.cadence, Cadence::Daily);
        let patch = args.patch();
        assert!(patch.value1.is_some_and(|v| (v - 5.0).abs() < f64::EPSILON));
        assert!(patch.value2.is_none());
        assert!(patch.value3.is_some_and(|v| v.abs() < f64::EPSILON));
    }

    #[test]
    fn negative_values_are_accepted() {
        let w = Wrapper::parse_from(["test", "set", "1001", "--v2", "-1.5"]);
        let CountCommand::Set(args) = w.command else {
            panic!("expected set");
        };
        assert!(args.patch().value2.is_some_and(|v| (v + 1.5).abs() < f64::EPSILON));
    }

    #[test]
    fn locked_and_unlocked_conflict() {
        assert!(Wrapper::try_parse_from(["test", "show", "--locked", "--unlocked"]).is_err());
    }

    #[test]
    fn unchanged_edits_carry_a_warning() {
        let item = Item {
            id: "i-1".into(),
            cadence: Cadence::Daily,
            item_number: "100".into(),
            description: "Gloves".into(),
            unit_labels: ["BAL".into(), "KUS".into(), "KU".into()],
            status: ItemStatus::Active,
        };
        let row = InventoryRow::new(item, CountValue::default());
        assert!(edit_warning(&row, EditOutcome::Applied).is_none());
        let locked = edit_warning(&row, EditOutcome::Locked).expect("locked warning");
        assert!(locked.starts_with("100 is locked"));
        assert!(locked.contains("inv count lock"));
        let overflow = edit_warning(&row, EditOutcome::Overflow).expect("overflow warning");
        assert!(overflow.contains("would exceed"));
    }

    #[test]
    fn truncate_respects_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
