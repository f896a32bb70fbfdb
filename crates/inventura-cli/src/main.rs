#![forbid(unsafe_code)]

mod cmd;
mod output;
mod project;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "inv",
    author,
    version,
    about = "inventura: inventory counting with count sheets, snapshots and printable exports",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides --json, FORMAT and the project config).
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize an inventura project",
        long_about = "Initialize an inventura project in the current directory: config, store and value cache.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    inv init\n\n    # Re-run migrations and rewrite .gitignore, keeping config\n    inv init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Session",
        about = "Create an account and log in",
        after_help = "EXAMPLES:\n    inv register --username counter --email counter@example.com --password secret1"
    )]
    Register(cmd::auth::RegisterArgs),

    #[command(
        next_help_heading = "Session",
        about = "Log in and store the session token",
        after_help = "EXAMPLES:\n    inv login --email counter@example.com --password secret1"
    )]
    Login(cmd::auth::LoginArgs),

    #[command(
        next_help_heading = "Session",
        about = "Revoke the stored session",
        after_help = "EXAMPLES:\n    inv logout"
    )]
    Logout,

    #[command(
        next_help_heading = "Session",
        about = "Show the logged-in user",
        after_help = "EXAMPLES:\n    inv whoami\n\n    inv whoami --json"
    )]
    Whoami,

    #[command(next_help_heading = "Catalog", about = "Manage catalog items")]
    Item {
        #[command(subcommand)]
        command: cmd::item::ItemCommand,
    },

    #[command(
        next_help_heading = "Catalog",
        about = "List materials across every cadence",
        long_about = "List materials across every cadence, de-duplicated on item number and sorted.",
        after_help = "EXAMPLES:\n    inv materials\n\n    # Match number, description or unit label\n    inv materials --search KAR --json"
    )]
    Materials(cmd::materials::MaterialsArgs),

    #[command(next_help_heading = "Counting", about = "Work the count sheet")]
    Count {
        #[command(subcommand)]
        command: cmd::count::CountCommand,
    },

    #[command(
        next_help_heading = "Counting",
        about = "Confirm a pending destructive action",
        long_about = "Confirm a pending destructive action with the token printed by `item clear` or `count reset`.",
        after_help = "EXAMPLES:\n    inv confirm 3f9a0c1d2b4e6f70"
    )]
    Confirm(cmd::confirm::ConfirmArgs),

    #[command(next_help_heading = "Reports", about = "Export CSV or print documents")]
    Export {
        #[command(subcommand)]
        command: cmd::export::ExportCommand,
    },

    #[command(next_help_heading = "Reports", about = "Save and manage snapshots")]
    Snapshot {
        #[command(subcommand)]
        command: cmd::snapshot::SnapshotCommand,
    },

    #[command(
        next_help_heading = "Integration",
        about = "Send a raw request through the REST contract",
        after_help = "EXAMPLES:\n    inv api GET /health\n\n    inv api GET \"/api/items?type=daily\"\n\n    inv api POST /api/items --data '{\"cadence\":\"daily\",\"itemNumber\":\"1001\",\"description\":\"Soap\",\"unitLabels\":[\"BAL\",\"KUS\",\"KU\"]}'"
    )]
    Api(cmd::api::ApiArgs),

    #[command(
        next_help_heading = "Integration",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    inv completions bash\n\n    # Generate zsh completions\n    inv completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env("INVENTURA_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if quiet {
            "error"
        } else if verbose || env::var("DEBUG").is_ok() {
            "inventura=debug,info"
        } else {
            "inventura=info,warn"
        })
    });

    let format = env::var("INVENTURA_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let project_root = env::current_dir()?;
    let output = output::resolve_output_mode(cli.format, cli.json, &project_root);
    debug!(?output, "output mode resolved");

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, output, cli.quiet, &project_root),
        Commands::Register(ref args) => cmd::auth::run_register(args, output, &project_root),
        Commands::Login(ref args) => cmd::auth::run_login(args, output, &project_root),
        Commands::Logout => cmd::auth::run_logout(output, &project_root),
        Commands::Whoami => cmd::auth::run_whoami(output, &project_root),
        Commands::Item { ref command } => cmd::item::run_item(command, output, &project_root),
        Commands::Materials(ref args) => {
            cmd::materials::run_materials(args, output, &project_root)
        }
        Commands::Count { ref command } => cmd::count::run_count(command, output, &project_root),
        Commands::Confirm(ref args) => cmd::confirm::run_confirm(args, output, &project_root),
        Commands::Export { ref command } => {
            cmd::export::run_export(command, output, &project_root)
        }
        Commands::Snapshot { ref command } => {
            cmd::snapshot::run_snapshot(command, output, &project_root)
        }
        Commands::Api(ref args) => cmd::api::run_api(args, output, &project_root),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args, &mut command)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventura_core::model::Cadence;

    #[test]
    fn json_flag_parses_before_and_after_subcommand() {
        let cli = Cli::parse_from(["inv", "--json", "whoami"]);
        assert!(cli.json);
        let cli = Cli::parse_from(["inv", "materials", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn format_flag_is_global() {
        let cli = Cli::parse_from(["inv", "snapshot", "list", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
        assert!(Cli::try_parse_from(["inv", "whoami", "--format", "yaml"]).is_err());
    }

    #[test]
    fn quiet_and_verbose_flags_parsed() {
        let cli = Cli::parse_from(["inv", "-q", "init"]);
        assert!(cli.quiet);
        let cli = Cli::parse_from(["inv", "init", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn count_set_parses_nested() {
        let cli = Cli::parse_from(["inv", "count", "set", "1001", "-c", "weekly", "--v1", "2+3"]);
        let Commands::Count {
            command: cmd::count::CountCommand::Set(args),
        } = cli.command
        else {
            panic!("expected count set");
        };
        assert_eq!(args.row.cadence.cadence, Cadence::Weekly);
        assert_eq!(args.value1.as_deref(), Some("2+3"));
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["inv", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["inv", "init"],
            vec!["inv", "register", "--username", "u1x", "--email", "a@b.c", "--password", "p"],
            vec!["inv", "login", "--email", "a@b.c", "--password", "p"],
            vec!["inv", "logout"],
            vec!["inv", "whoami"],
            vec!["inv", "item", "list"],
            vec!["inv", "item", "add", "-c", "daily", "-n", "1", "-d", "x", "-u", "A,B,C"],
            vec!["inv", "item", "edit", "itm-1", "--description", "y"],
            vec!["inv", "item", "remove", "itm-1"],
            vec!["inv", "item", "clear", "--cadence", "daily"],
            vec!["inv", "materials"],
            vec!["inv", "count", "show"],
            vec!["inv", "count", "set", "1", "--v2", "3"],
            vec!["inv", "count", "lock", "1"],
            vec!["inv", "count", "reset"],
            vec!["inv", "confirm", "abc"],
            vec!["inv", "export", "csv", "--cadence", "monthly"],
            vec!["inv", "export", "print", "--materials"],
            vec!["inv", "snapshot", "save"],
            vec!["inv", "snapshot", "list"],
            vec!["inv", "snapshot", "show", "inv-1"],
            vec!["inv", "snapshot", "status", "inv-1", "completed"],
            vec!["inv", "snapshot", "delete", "inv-1"],
            vec!["inv", "api", "GET", "/health"],
            vec!["inv", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
