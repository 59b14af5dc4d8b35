use crate::cmd::logs::{self, LogsArgs};
use crate::cmd::{app_or_workspace, connect};
use crate::terminal::{TerminalProgress, TerminalPrompter};
use anyhow::Context;
use clap::Subcommand;
use copilot_core::types::WorkloadKind;
use copilot_core::workload_delete::{DeleteWorkload, DeleteWorkloadOpts};
use copilot_core::CopilotError;
use std::path::Path;

/// Subcommands shared by `svc` and `job`.
#[derive(Subcommand)]
pub enum WorkloadSubcommand {
    /// Delete the workload from every environment and remove its images
    Delete {
        /// Workload name
        #[arg(long, short = 'n')]
        name: String,
        /// Application name (default: the workspace's application)
        #[arg(long, short = 'a')]
        app: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show the workload's task logs
    Logs(LogsArgs),
}

pub fn run(
    root: &Path,
    kind: WorkloadKind,
    subcmd: WorkloadSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        WorkloadSubcommand::Delete { name, app, yes } => delete(root, kind, name, app, yes),
        WorkloadSubcommand::Logs(args) => logs::run(root, kind, args, json),
    }
}

fn delete(
    root: &Path,
    kind: WorkloadKind,
    name: String,
    app: Option<String>,
    yes: bool,
) -> anyhow::Result<()> {
    let opts = DeleteWorkloadOpts {
        app: app_or_workspace(root, app)?,
        name,
        kind,
        skip_confirmation: yes,
    };
    if opts.app.is_empty() {
        return Err(CopilotError::MissingApplication.into());
    }

    let aws = connect()?;
    let prompter = TerminalPrompter;
    let progress = TerminalProgress;
    let cmd = DeleteWorkload::new(aws.platform(), &prompter, &progress);

    let workload = cmd.validate(&opts)?;
    cmd.ask(&workload, opts.skip_confirmation)?;
    cmd.execute(&workload)
        .with_context(|| format!("delete {kind} {}", workload.name))?;

    println!(
        "Deleted {kind} {} from application {}.",
        workload.name, workload.app
    );
    Ok(())
}
