use crate::output::{OutputMode, render};
use crate::project::{DB_FILE, VALUES_DIR};
use anyhow::{Context as _, Result};
use clap::Args;
use inventura_core::config::{PROJECT_DIR, default_config_toml};
use inventura_core::db;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force re-initialization even if `.inventura/` already exists.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "inventura.db\ninventura.db-*\nsession\nvalues/\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    project_dir: String,
    database: String,
    schema_version: u32,
}

/// Execute `inv init`. Creates the project skeleton:
///
/// ```text
/// .inventura/
///   config.toml    (default project config)
///   inventura.db   (migrated store)
///   values/        (local value cache)
///   .gitignore     (store, session and cache stay local)
/// ```
///
/// An existing `config.toml` is kept on `--force`; the store is migrated in
/// place, never wiped.
pub fn run_init(args: &InitArgs, output: OutputMode, quiet: bool, project_root: &Path) -> Result<()> {
    let project_dir = project_root.join(PROJECT_DIR);

    if project_dir.exists() && !args.force {
        anyhow::bail!(".inventura/ already exists. Use `inv init --force` to reinitialize.");
    }

    let values_dir = project_dir.join(VALUES_DIR);
    std::fs::create_dir_all(&values_dir)
        .with_context(|| format!("Failed to create {}", values_dir.display()))?;

    let config_path = project_dir.join("config.toml");
    if !config_path.exists() {
        std::fs::write(&config_path, default_config_toml())
            .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
    }

    let gitignore_path = project_dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write .gitignore: {}", gitignore_path.display()))?;

    let db_path = project_dir.join(DB_FILE);
    let conn = db::open_db(&db_path)?;
    let schema_version = db::migrations::current_schema_version(&conn)?;

    let payload = InitOutput {
        project_dir: project_dir.display().to_string(),
        database: db_path.display().to_string(),
        schema_version,
    };

    render(output, &payload, |p, w| {
        writeln!(w, "✓ Initialized .inventura/ project structure.")?;
        if quiet {
            return Ok(());
        }
        writeln!(w)?;
        writeln!(w, "  Store:   {} (schema v{})", p.database, p.schema_version)?;
        writeln!(w, "  Config:  .inventura/config.toml")?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(w, "  Create an operator account:")?;
        writeln!(
            w,
            "    inv register --username counter --email counter@example.com --password <password>"
        )?;
        writeln!(w)?;
        writeln!(w, "  Add your first catalog item:")?;
        writeln!(
            w,
            "    inv item add --cadence daily --number 1001 --description \"Paper towels\" --units BAL,KUS,KU"
        )
    })
}
