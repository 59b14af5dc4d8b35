use crate::cmd::{app_or_workspace, connect};
use crate::output::{print_json, print_table};
use crate::terminal::{TerminalProgress, TerminalPrompter};
use anyhow::Context;
use clap::Subcommand;
use copilot_core::app_delete::{DeleteApp, DeleteAppDeps, DeleteAppOpts};
use copilot_core::env_delete::DeleteEnv;
use copilot_core::pipeline_delete::DeletePipeline;
use copilot_core::workload_delete::DeleteWorkload;
use copilot_core::workspace::LocalWorkspace;
use std::path::Path;

#[derive(Subcommand)]
pub enum AppSubcommand {
    /// Delete an application with all of its environments, services, jobs and pipeline
    Delete {
        /// Application name (default: the workspace's application)
        #[arg(long, short = 'n')]
        name: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List applications in the account
    Ls,
}

pub fn run(root: &Path, subcmd: AppSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        AppSubcommand::Delete { name, yes } => delete(root, name, yes),
        AppSubcommand::Ls => list(json),
    }
}

fn delete(root: &Path, name: Option<String>, yes: bool) -> anyhow::Result<()> {
    let opts = DeleteAppOpts {
        name: app_or_workspace(root, name)?,
        skip_confirmation: yes,
    };
    opts.validate()?;
    let name = opts.name.clone();

    let aws = connect()?;
    let platform = aws.platform();
    let workspace = LocalWorkspace::new(root);
    let prompter = TerminalPrompter;
    let progress = TerminalProgress;

    let workloads = DeleteWorkload::new(platform, &prompter, &progress);
    let environments = DeleteEnv::new(platform, &prompter, &progress);
    let pipeline = DeletePipeline::new(platform, &workspace, &prompter, &progress);

    let mut cmd = DeleteApp::new(
        opts,
        DeleteAppDeps {
            platform,
            workloads: &workloads,
            environments: &environments,
            pipeline: &pipeline,
            workspace: &workspace,
            prompter: &prompter,
            progress: &progress,
        },
    );
    cmd.validate()?;
    cmd.ask()?;
    cmd.execute()
        .with_context(|| format!("delete application {name}"))?;

    println!("Deleted application {name}.");
    Ok(())
}

fn list(json: bool) -> anyhow::Result<()> {
    let aws = connect()?;
    let apps = aws
        .platform()
        .store
        .list_applications()
        .context("list applications")?;

    if json {
        return print_json(&apps);
    }
    if apps.is_empty() {
        println!("No applications.");
        return Ok(());
    }
    let rows = apps
        .into_iter()
        .map(|a| vec![a.name, a.account_id, a.domain.unwrap_or_else(|| "-".to_string())])
        .collect();
    print_table(&["NAME", "ACCOUNT", "DOMAIN"], rows);
    Ok(())
}
