mod cmd;
mod output;
mod root;
mod terminal;

use clap::{Parser, Subcommand};
use cmd::{
    app::AppSubcommand, env::EnvSubcommand, pipeline::PipelineSubcommand,
    workload::WorkloadSubcommand,
};
use copilot_core::types::WorkloadKind;
use copilot_core::CopilotError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "copilot",
    about = "Tear down containerized applications and read the logs of their services and jobs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from copilot/.workspace or .git/)
    #[arg(long, global = true, env = "COPILOT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage applications
    App {
        #[command(subcommand)]
        subcommand: AppSubcommand,
    },

    /// Manage environments
    Env {
        #[command(subcommand)]
        subcommand: EnvSubcommand,
    },

    /// Manage long-running services
    Svc {
        #[command(subcommand)]
        subcommand: WorkloadSubcommand,
    },

    /// Manage scheduled jobs
    Job {
        #[command(subcommand)]
        subcommand: WorkloadSubcommand,
    },

    /// Manage the application's release pipeline
    Pipeline {
        #[command(subcommand)]
        subcommand: PipelineSubcommand,
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

    let result = match cli.command {
        Commands::App { subcommand } => cmd::app::run(&root, subcommand, cli.json),
        Commands::Env { subcommand } => cmd::env::run(&root, subcommand, cli.json),
        Commands::Svc { subcommand } => {
            cmd::workload::run(&root, WorkloadKind::Service, subcommand, cli.json)
        }
        Commands::Job { subcommand } => {
            cmd::workload::run(&root, WorkloadKind::Job, subcommand, cli.json)
        }
        Commands::Pipeline { subcommand } => cmd::pipeline::run(&root, subcommand),
    };

    if let Err(e) = result {
        if e.downcast_ref::<CopilotError>()
            .is_some_and(|err| err.is_cancelled())
        {
            eprintln!("Operation cancelled.");
            return;
        }
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
