mod cmd;
mod output;
mod root;
mod workspace;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stride",
    about = "Convert stride command templates for coding agents and report sprint state",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .stride/ or .git/)
    #[arg(long, global = true, env = "STRIDE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Config file (default: .stride/config.yaml under the root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a command template into an agent's native format
    Convert {
        /// Path to the canonical template
        template: PathBuf,

        /// Target agent key (see `stride agents`)
        #[arg(long, conflicts_with = "format")]
        agent: Option<String>,

        /// Target format name (see `stride formats`)
        #[arg(long)]
        format: Option<String>,

        /// Command name (default: template file stem)
        #[arg(long)]
        command: Option<String>,

        /// Convert for every agent and list destinations
        #[arg(long, conflicts_with_all = ["agent", "format"])]
        all: bool,
    },

    /// List supported agents
    Agents {
        /// Only agents using this format
        #[arg(long)]
        format: Option<String>,
    },

    /// List output formats
    Formats,

    /// Summarize every sprint
    Status {
        /// Only sprints in this state (uninitialized, proposed, active, completed)
        #[arg(long)]
        state: Option<String>,
    },

    /// Aggregate metrics across all sprints
    Metrics,

    /// Show the full report for one sprint
    Show {
        /// Sprint id (directory name under .stride/sprints)
        sprint: String,
    },

    /// Check sprint documents against their expected structure
    Validate {
        /// Sprint id (omit to validate all sprints)
        sprint: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Convert {
            template,
            agent,
            format,
            command,
            all,
        } => cmd::convert::run(
            &root,
            config,
            cmd::convert::ConvertArgs {
                template: &template,
                agent: agent.as_deref(),
                format: format.as_deref(),
                command: command.as_deref(),
                all,
            },
            cli.json,
        ),
        Commands::Agents { format } => cmd::agents::run(format.as_deref(), cli.json),
        Commands::Formats => cmd::formats::run(cli.json),
        Commands::Status { state } => {
            cmd::status::run(&root, config, state.as_deref(), cli.json)
        }
        Commands::Metrics => cmd::metrics::run(&root, config, cli.json),
        Commands::Show { sprint } => cmd::show::run(&root, config, &sprint, cli.json),
        Commands::Validate { sprint } => {
            cmd::validate::run(&root, config, sprint.as_deref(), cli.json)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
