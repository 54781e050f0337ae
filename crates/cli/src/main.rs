//! contextd CLI: manual ops (spec.md §6) plus the auxiliary HTTP server.
//!
//! Every subcommand that touches tenant-scoped data requires an explicit
//! `--tenant`/`--project` pair (optionally `--team`), except where the
//! config's `default_tenant` fills the gap for single-user setups.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;
mod config;
mod embeddings_setup;
mod http_api;
mod server_security;

use config::Config;

#[derive(Parser)]
#[command(name = "contextd")]
#[command(about = "Local-first context engine for AI coding agents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: only warnings/errors on stderr
    #[arg(long, global = true)]
    quiet: bool,

    /// Tenant id (default: config default_tenant)
    #[arg(long, global = true)]
    tenant: Option<String>,

    /// Team id (optional)
    #[arg(long, global = true)]
    team: Option<String>,

    /// Project id (default: config default_tenant, or derived from cwd)
    #[arg(long, global = true)]
    project: Option<String>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Path to the config file (default: ~/.contextd/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the local embedding runtime
    Init(InitArgs),
    /// Run the ingest scrubber over a file (or stdin with '-')
    Scrub(ScrubArgs),
    /// Read-only health diagnostics (collection integrity)
    Health,
    /// Read-only status snapshot (checkpoint/memory counts)
    Status,
    /// Manage checkpoints
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },
    /// Admin metadata recovery operations
    Metadata {
        #[command(subcommand)]
        action: MetadataAction,
    },
    /// Integrate contextd as an MCP server with an agent host
    Mcp {
        #[command(subcommand)]
        action: McpAction,
    },
    /// Emit a one-line status summary for a terminal prompt
    Statusline {
        #[command(subcommand)]
        action: StatuslineAction,
    },
    /// Run the auxiliary HTTP API
    Serve(ServeArgs),
}

#[derive(Args)]
struct InitArgs {
    /// Re-run initialization even if the runtime already appears set up
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct ScrubArgs {
    /// File to scrub, or '-' for stdin
    input: String,
}

#[derive(Subcommand)]
enum CheckpointAction {
    Save(commands::checkpoint::SaveArgs),
    List(commands::checkpoint::ListArgs),
    Resume(commands::checkpoint::ResumeArgs),
}

#[derive(Subcommand)]
enum MetadataAction {
    Health,
    List,
    Recover { name: String },
    Quarantine {
        #[command(subcommand)]
        action: QuarantineAction,
    },
}

#[derive(Subcommand)]
enum QuarantineAction {
    List,
    Restore { hash: String },
}

#[derive(Subcommand)]
enum McpAction {
    Install,
    Uninstall,
    Status,
}

#[derive(Subcommand)]
enum StatuslineAction {
    Run,
    Install,
    Uninstall,
    Test,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind the HTTP API to
    #[arg(long, default_value = "127.0.0.1:8765")]
    bind: String,
    /// Allow binding to a non-loopback address
    #[arg(long)]
    public: bool,
    /// Bearer token required on every request (falls back to CONTEXTD_AUTH_TOKEN)
    #[arg(long)]
    auth_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.filter_module("ort", log::LevelFilter::Off);
    builder.target(env_logger::Target::Stderr).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(tenant_id) = &cli.tenant {
        config.default_tenant.tenant_id = Some(tenant_id.clone());
    }
    if let Some(team_id) = &cli.team {
        config.default_tenant.team_id = Some(team_id.clone());
    }
    if let Some(project_id) = &cli.project {
        config.default_tenant.project_id = Some(project_id.clone());
    }

    let result = match cli.command {
        Commands::Init(args) => commands::init::run(&config, args.force).await,
        Commands::Scrub(args) => commands::scrub::run(&args.input).await,
        Commands::Health => commands::health::run(&config).await,
        Commands::Status => commands::status::run(&config).await,
        Commands::Checkpoint { action } => match action {
            CheckpointAction::Save(args) => commands::checkpoint::save(&config, args).await,
            CheckpointAction::List(args) => commands::checkpoint::list(&config, args).await,
            CheckpointAction::Resume(args) => commands::checkpoint::resume(&config, args).await,
        },
        Commands::Metadata { action } => match action {
            MetadataAction::Health => commands::metadata::health(&config).await,
            MetadataAction::List => commands::metadata::list(&config).await,
            MetadataAction::Recover { name } => commands::metadata::recover(&config, &name).await,
            MetadataAction::Quarantine { action } => match action {
                QuarantineAction::List => commands::metadata::quarantine_list(&config).await,
                QuarantineAction::Restore { hash } => commands::metadata::quarantine_restore(&config, &hash).await,
            },
        },
        Commands::Mcp { action } => match action {
            McpAction::Install => commands::mcp::install().await,
            McpAction::Uninstall => commands::mcp::uninstall().await,
            McpAction::Status => commands::mcp::status().await,
        },
        Commands::Statusline { action } => match action {
            StatuslineAction::Run => commands::statusline::run(&config).await,
            StatuslineAction::Install => commands::statusline::install().await,
            StatuslineAction::Uninstall => commands::statusline::uninstall().await,
            StatuslineAction::Test => commands::statusline::test(&config).await,
        },
        Commands::Serve(args) => commands::serve::run(config, args.bind, args.public, args.auth_token).await,
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
    Ok(())
}
