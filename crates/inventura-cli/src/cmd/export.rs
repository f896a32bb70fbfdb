//! `inv export csv` / `inv export print`: artifacts for the count sheet or
//! the materials list, written through a directory sink.

use super::{load_material_rows, load_rows};
use crate::output::{CliError, OutputMode, fail, pretty_kv, render};
use crate::project::Project;
use chrono::Local;
use clap::{Args, Subcommand, ValueEnum};
use inventura_core::error::ErrorCode;
use inventura_core::model::{Cadence, InventoryRow};
use inventura_core::report::{
    ArtifactFormat, ArtifactSink, CsvLayout, DirectorySink, DocumentKind, PrintDocument,
    document_file_name, file_name, to_csv,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum ExportCommand {
    #[command(
        about = "Export rows as CSV",
        long_about = "Export the whole, unpaginated row set as UTF-8 CSV with a byte-order mark.",
        after_help = "EXAMPLES:\n    inv export csv --cadence daily\n\n    # Totals, notes and lock state\n    inv export csv --cadence weekly --layout detailed --out exports/\n\n    inv export csv --materials"
    )]
    Csv(CsvArgs),

    #[command(
        about = "Render the paginated print document",
        long_about = "Render the paginated A4 print document as HTML, ready for the browser print dialog.",
        after_help = "EXAMPLES:\n    inv export print --cadence monthly\n\n    inv export print --materials --out /tmp"
    )]
    Print(TargetArgs),
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Count sheet to export (default daily).
    #[arg(short, long, conflicts_with = "materials")]
    pub cadence: Option<Cadence>,

    /// Export the cross-cadence materials list instead.
    #[arg(long)]
    pub materials: bool,

    /// Output directory.
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,
}

impl TargetArgs {
    fn kind(&self) -> DocumentKind {
        if self.materials {
            DocumentKind::MaterialsList
        } else {
            DocumentKind::CountSheet(self.cadence.unwrap_or(Cadence::Daily))
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LayoutArg {
    /// Mirrors the printed columns, placeholders for empty cells.
    Sheet,
    /// Values, total, note and lock state per row.
    Detailed,
}

impl From<LayoutArg> for CsvLayout {
    fn from(layout: LayoutArg) -> Self {
        match layout {
            LayoutArg::Sheet => Self::Sheet,
            LayoutArg::Detailed => Self::Detailed,
        }
    }
}

#[derive(Args, Debug)]
pub struct CsvArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[arg(long, value_enum, default_value_t = LayoutArg::Sheet)]
    pub layout: LayoutArg,
}

#[derive(Debug, Serialize)]
struct ExportOutput {
    document: DocumentKind,
    path: String,
    rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pages: Option<usize>,
}

fn rows_for(project: &Project, kind: DocumentKind, output: OutputMode) -> anyhow::Result<Vec<InventoryRow>> {
    match kind {
        DocumentKind::CountSheet(cadence) => load_rows(project, cadence, output),
        DocumentKind::MaterialsList => load_material_rows(project, output),
    }
}

fn write_failed(output: OutputMode, err: &anyhow::Error) -> anyhow::Error {
    fail(
        output,
        CliError::coded(ErrorCode::ExportWriteFailed, format!("{err:#}")),
    )
}

pub fn run_export(command: &ExportCommand, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let generated_at = Local::now().naive_local();
    let config = &project.config.report;

    let payload = match command {
        ExportCommand::Csv(args) => {
            let kind = args.target.kind();
            let rows = rows_for(&project, kind, output)?;
            let csv = to_csv(kind, &rows, args.layout.into(), generated_at, config);
            let name = file_name(kind, generated_at.date(), ArtifactFormat::Csv);
            let path = DirectorySink::new(&args.target.out)
                .download_file(&name, csv.as_bytes())
                .map_err(|err| write_failed(output, &err))?;
            ExportOutput {
                document: kind,
                path: path.display().to_string(),
                rows: rows.len(),
                pages: None,
            }
        }
        ExportCommand::Print(args) => {
            let kind = args.kind();
            let rows = rows_for(&project, kind, output)?;
            let document = PrintDocument::build(kind, &rows, generated_at, config);
            let name = document_file_name(&document, generated_at.date());
            let path = DirectorySink::new(&args.out)
                .render_document(&document, &name)
                .map_err(|err| write_failed(output, &err))?;
            ExportOutput {
                document: kind,
                path: path.display().to_string(),
                rows: rows.len(),
                pages: Some(document.total_pages()),
            }
        }
    };

    render(output, &payload, |p, w| {
        writeln!(w, "✓ Exported {} ({} rows)", p.document, p.rows)?;
        if let Some(pages) = p.pages {
            pretty_kv(w, "Pages", pages.to_string())?;
        }
        pretty_kv(w, "File", &p.path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(subcommand)]
        command: ExportCommand,
    }

    #[test]
    fn default_target_is_daily_sheet() {
        let w = Wrapper::parse_from(["test", "print"]);
        let ExportCommand::Print(args) = w.command else {
            panic!("expected print");
        };
        assert_eq!(args.kind(), DocumentKind::CountSheet(Cadence::Daily));
        assert_eq!(args.out, PathBuf::from("."));
    }

    #[test]
    fn materials_conflicts_with_cadence() {
        assert!(Wrapper::try_parse_from(["test", "csv", "--materials", "--cadence", "daily"]).is_err());
        let w = Wrapper::parse_from(["test", "csv", "--materials", "--layout", "detailed"]);
        let ExportCommand::Csv(args) = w.command else {
            panic!("expected csv");
        };
        assert_eq!(args.target.kind(), DocumentKind::MaterialsList);
        assert_eq!(CsvLayout::from(args.layout), CsvLayout::Detailed);
    }
}
