//! `inv confirm`: second phase of destructive bulk operations.

use super::{api_failure, store_api};
use crate::output::{CliError, OutputMode, fail, pretty_kv, render};
use crate::project::Project;
use clap::Args;
use inventura_core::cache::ValueStore;
use inventura_core::confirm::{ConfirmError, ConfirmationGate, Confirmed, DestructiveAction, PendingConfirmation};
use inventura_core::error::ErrorCode;
use inventura_core::merge::reset_all;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Args, Debug)]
pub struct ConfirmArgs {
    /// Token printed by the command that requested confirmation.
    pub token: String,
}

/// Print a pending confirmation and how to continue.
pub fn render_pending(output: OutputMode, pending: &PendingConfirmation) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct PendingOutput<'a> {
        #[serde(flatten)]
        pending: &'a PendingConfirmation,
        prompt: String,
        next: String,
    }

    let payload = PendingOutput {
        pending,
        prompt: pending.prompt(),
        next: format!("inv confirm {}", pending.token),
    };
    render(output, &payload, |p, w| {
        writeln!(w, "? {}", p.prompt)?;
        pretty_kv(w, "Step", format!("{} / {}", p.pending.step, p.pending.steps))?;
        pretty_kv(w, "Expires", p.pending.expires_at.to_rfc3339())?;
        writeln!(w, "Run `{}` to proceed.", p.next)
    })
}

#[derive(Debug, Serialize)]
struct ExecutedOutput {
    action: DestructiveAction,
    affected: usize,
}

pub fn run_confirm(args: &ConfirmArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let gate = ConfirmationGate::new(&project.conn, project.config.confirm.ttl_secs);
    let confirmed = gate.confirm(&args.token).map_err(|err| match err {
        ConfirmError::UnknownToken(_) | ConfirmError::Expired(_) => fail(
            output,
            CliError::coded(ErrorCode::ConfirmationInvalid, err.to_string()),
        ),
        ConfirmError::Store(inner) => fail(
            output,
            CliError::coded(ErrorCode::StoreUnavailable, format!("{inner:#}")),
        ),
    })?;

    let action = match confirmed {
        Confirmed::NextStep(pending) => return render_pending(output, &pending),
        Confirmed::Execute(action) => action,
    };

    let affected = match action {
        DestructiveAction::DeleteAllItems(cadence) => {
            let removed = store_api(&project)
                .delete_all_items(project.authorization().as_deref(), cadence)
                .map_err(|err| api_failure(output, err, ErrorCode::ItemNotFound))?;
            project.value_store().clear(cadence).map_err(|err| {
                fail(output, CliError::coded(ErrorCode::CacheWriteFailed, err.to_string()))
            })?;
            removed
        }
        DestructiveAction::ResetValues(cadence) => {
            let items = store_api(&project)
                .list_items(Some(cadence))
                .map_err(|err| api_failure(output, err, ErrorCode::ItemNotFound))?;
            let mut store = project.value_store();
            reset_all(&items, &mut store, cadence)
                .map_err(|err| {
                    fail(output, CliError::coded(ErrorCode::CacheWriteFailed, err.to_string()))
                })?
                .len()
        }
    };
    info!(%action, affected, "destructive action executed");

    render(output, &ExecutedOutput { action, affected }, |p, w| match p.action {
        DestructiveAction::DeleteAllItems(cadence) => {
            writeln!(w, "✓ Deleted {} {cadence} item(s)", p.affected)
        }
        DestructiveAction::ResetValues(cadence) => {
            writeln!(w, "✓ Reset {} {cadence} row(s)", p.affected)
        }
    })
}
