use crate::cmd::{app_or_workspace, connect};
use crate::output::{print_json, print_table};
use crate::terminal::{TerminalProgress, TerminalPrompter};
use anyhow::Context;
use clap::Subcommand;
use copilot_core::env_delete::{DeleteEnv, EnvironmentDeleter};
use copilot_core::CopilotError;
use std::path::Path;

#[derive(Subcommand)]
pub enum EnvSubcommand {
    /// Delete an environment that no longer runs any service or job
    Delete {
        /// Environment name
        #[arg(long, short = 'n')]
        name: String,
        /// Application name (default: the workspace's application)
        #[arg(long, short = 'a')]
        app: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List environments of an application
    Ls {
        /// Application name (default: the workspace's application)
        #[arg(long, short = 'a')]
        app: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: EnvSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        EnvSubcommand::Delete { name, app, yes } => delete(root, &name, app, yes),
        EnvSubcommand::Ls { app } => list(root, app, json),
    }
}

fn delete(root: &Path, name: &str, app: Option<String>, yes: bool) -> anyhow::Result<()> {
    let app = app_or_workspace(root, app)?;
    if app.is_empty() {
        return Err(CopilotError::MissingApplication.into());
    }

    let aws = connect()?;
    let prompter = TerminalPrompter;
    let progress = TerminalProgress;
    let cmd = DeleteEnv::new(aws.platform(), &prompter, &progress);

    let env = cmd.validate(&app, name)?;
    cmd.ask(&env, yes)?;
    cmd.execute(&env)
        .with_context(|| format!("delete environment {name}"))?;

    println!("Deleted environment {name} from application {app}.");
    Ok(())
}

fn list(root: &Path, app: Option<String>, json: bool) -> anyhow::Result<()> {
    let app = app_or_workspace(root, app)?;
    if app.is_empty() {
        return Err(CopilotError::MissingApplication.into());
    }

    let aws = connect()?;
    let envs = aws
        .platform()
        .store
        .list_environments(&app)
        .with_context(|| format!("list environments of application {app}"))?;

    if json {
        return print_json(&envs);
    }
    if envs.is_empty() {
        println!("No environments in application {app}.");
        return Ok(());
    }
    let rows = envs
        .into_iter()
        .map(|e| {
            vec![
                e.name,
                e.region,
                e.account_id,
                if e.prod { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["NAME", "REGION", "ACCOUNT", "PROD"], rows);
    Ok(())
}
