mod commands;
mod output;
mod session;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dokkuflow")]
#[command(about = "Declarative Dokku configuration over SSH", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Manifest path (default: discovered from the current directory)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding `.dokkuflow/state.json` (default: the manifest's directory)
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Dokku host (overrides provider block and DOKKU_SSH_HOST)
    #[arg(long, global = true)]
    pub ssh_host: Option<String>,

    #[arg(long, global = true)]
    pub ssh_port: Option<u16>,

    #[arg(long, global = true)]
    pub ssh_user: Option<String>,

    /// Private key: path, file:<path>, env:<VAR>, $VAR or raw:<pem>
    #[arg(long, global = true)]
    pub ssh_cert: Option<String>,

    /// Log every remote command (redacted) at ERROR level
    #[arg(long, global = true)]
    pub log_ssh_commands: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the manifest without contacting the host
    Validate,
    /// Show the host's Dokku version and capabilities
    Probe,
    /// Show the changes apply would make
    Plan {
        /// Skip reading the tracked resources from the host first
        #[arg(long)]
        no_refresh: bool,
    },
    /// Reconcile the host with the manifest
    Apply {
        /// Apply without asking for confirmation
        #[arg(short = 'y', long)]
        auto_approve: bool,
        /// Skip reading the tracked resources from the host first
        #[arg(long)]
        no_refresh: bool,
    },
    /// Update the state file from the host
    Refresh,
    /// Delete every tracked resource from the host
    Destroy {
        /// Destroy without asking for confirmation
        #[arg(short = 'y', long)]
        auto_approve: bool,
    },
    /// Print version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let ok = match cli.command {
        Commands::Version => {
            println!("dokkuflow {}", env!("CARGO_PKG_VERSION"));
            true
        }
        Commands::Validate => commands::validate::handle(&cli.global).await?,
        Commands::Probe => commands::probe::handle(&cli.global).await?,
        Commands::Plan { no_refresh } => commands::plan::handle(&cli.global, !no_refresh).await?,
        Commands::Apply {
            auto_approve,
            no_refresh,
        } => commands::apply::handle(&cli.global, auto_approve, !no_refresh).await?,
        Commands::Refresh => commands::refresh::handle(&cli.global).await?,
        Commands::Destroy { auto_approve } => {
            commands::destroy::handle(&cli.global, auto_approve).await?
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
