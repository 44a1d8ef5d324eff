#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use notelog_core::config::{OutputFormat, load_config, resolve_output};
use notelog_core::tenant::TenantRegistry;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Env var naming the tenant when `--user` is not given.
const USER_ENV: &str = "NOTELOG_USER";

#[derive(Parser)]
#[command(name = "notelog", version, about = "Multi-tenant note store on an append-only log")]
#[command(
    after_help = "EXAMPLES:\n    # Merge a client bundle into alice's log\n    notelog --user alice@example.com merge bundle.zip\n\n    # List alice's notes as JSON\n    notelog --user alice@example.com --json notes"
)]
struct Cli {
    /// Path to a config file (overrides NOTELOG_CONFIG and the user config dir).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Tenant id, usually an email address (defaults to NOTELOG_USER).
    #[arg(long, short = 'u', global = true)]
    user: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        next_help_heading = "Sync",
        about = "Merge an uploaded bundle into the tenant's log",
        long_about = "Replay the records of a zip bundle (index.txt + data.bin) into the \
                      tenant's log, renaming or ignoring notes whose names collide with \
                      existing ones. Auxiliary files under files/ are written next to the log.",
        after_help = "EXAMPLES:\n    notelog -u alice@example.com merge bundle.zip"
    )]
    Merge(cmd::merge::MergeArgs),

    #[command(
        next_help_heading = "Sync",
        about = "Export the tenant's log as a bundle",
        after_help = "EXAMPLES:\n    notelog -u alice@example.com export backup.zip"
    )]
    Export(cmd::log::ExportArgs),

    #[command(
        next_help_heading = "Notes",
        about = "List live notes",
        after_help = "EXAMPLES:\n    notelog -u alice@example.com notes\n    notelog -u alice@example.com notes --since 42 --json"
    )]
    Notes(cmd::notes::NotesArgs),

    #[command(
        next_help_heading = "Notes",
        about = "Print the content of one or more versions",
        long_about = "Print the bytes of one content version, or with several version ids \
                      write a zip holding one entry per version to --out."
    )]
    Content(cmd::notes::ContentArgs),

    #[command(next_help_heading = "Notes", about = "Create a note")]
    Create(cmd::notes::CreateArgs),

    #[command(
        next_help_heading = "Notes",
        about = "Change a note's metadata",
        after_help = "EXAMPLES:\n    notelog -u alice@example.com meta k3j9x2ab --name groceries --starred true"
    )]
    Meta(cmd::notes::MetaArgs),

    #[command(next_help_heading = "Notes", about = "Delete a note")]
    Delete(cmd::notes::DeleteArgs),

    #[command(
        next_help_heading = "Notes",
        about = "Store a new content version of a note",
        long_about = "Read content from --file, or from stdin when --file is absent, and \
                      append it as the note's new current version."
    )]
    Put(cmd::notes::PutArgs),

    #[command(next_help_heading = "Files", about = "Write or overwrite an auxiliary file")]
    WriteFile(cmd::files::WriteFileArgs),

    #[command(next_help_heading = "Files", about = "Print an auxiliary file")]
    ReadFile(cmd::files::ReadFileArgs),

    #[command(next_help_heading = "Files", about = "List auxiliary files")]
    Files,

    #[command(
        next_help_heading = "Maintenance",
        about = "Check the tenant's log for structural errors"
    )]
    Validate,

    #[command(
        next_help_heading = "Maintenance",
        about = "Create the default notes a new account starts with"
    )]
    Provision,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("NOTELOG_LOG").unwrap_or_else(|_| {
        if std::env::var_os("DEBUG").is_some() {
            EnvFilter::new("notelog=debug,notelog_core=debug,info")
        } else {
            EnvFilter::new("notelog=info,notelog_core=info,warn")
        }
    });

    let json = std::env::var("NOTELOG_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

impl Cli {
    fn tenant_id(&self) -> anyhow::Result<String> {
        self.user
            .clone()
            .or_else(|| std::env::var(USER_ENV).ok())
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("no tenant given; pass --user or set {USER_ENV}"))
    }
}

fn run(cli: &Cli, registry: &TenantRegistry, output: OutputFormat) -> anyhow::Result<()> {
    let tenant = registry.tenant(&cli.tenant_id()?)?;
    debug!(tenant = tenant.id(), "dispatching command");

    match cli.command {
        Commands::Merge(ref args) => cmd::merge::run_merge(args, registry, &tenant, output),
        Commands::Export(ref args) => cmd::log::run_export(args, &tenant, output),
        Commands::Notes(ref args) => cmd::notes::run_notes(args, &tenant, output),
        Commands::Content(ref args) => cmd::notes::run_content(args, &tenant, output),
        Commands::Create(ref args) => cmd::notes::run_create(args, &tenant, output),
        Commands::Meta(ref args) => cmd::notes::run_meta(args, &tenant, output),
        Commands::Delete(ref args) => cmd::notes::run_delete(args, &tenant, output),
        Commands::Put(ref args) => cmd::notes::run_put(args, &tenant, output),
        Commands::WriteFile(ref args) => cmd::files::run_write_file(args, &tenant, output),
        Commands::ReadFile(ref args) => cmd::files::run_read_file(args, &tenant),
        Commands::Files => cmd::files::run_files(&tenant, output),
        Commands::Validate => cmd::log::run_validate(&tenant, output),
        Commands::Provision => cmd::log::run_provision(registry, &tenant, output),
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).map(|config| {
        let output = resolve_output(cli.json, &config);
        (TenantRegistry::new(config), output)
    });
    let (registry, output) = match result {
        Ok(pair) => pair,
        Err(err) => {
            let mode = if cli.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };
            let _ = output::render_error(mode, &output::CliError::from(&err));
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &registry, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = output::render_error(output, &output::CliError::from(&err));
            ExitCode::FAILURE
        }
    }
}
