use crate::cmd::{connect, workspace_app};
use crate::terminal::{TerminalProgress, TerminalPrompter};
use clap::Subcommand;
use copilot_core::pipeline_delete::{DeletePipeline, PipelineDeleteFlags, PipelineDeleter};
use copilot_core::workspace::LocalWorkspace;
use copilot_core::CopilotError;
use std::path::Path;

#[derive(Subcommand)]
pub enum PipelineSubcommand {
    /// Delete the pipeline described by the workspace's pipeline manifest
    Delete {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
        /// Also delete the secret holding the source provider access token
        #[arg(long)]
        delete_secret: bool,
    },
}

pub fn run(root: &Path, subcmd: PipelineSubcommand) -> anyhow::Result<()> {
    match subcmd {
        PipelineSubcommand::Delete { yes, delete_secret } => delete(root, yes, delete_secret),
    }
}

fn delete(root: &Path, yes: bool, delete_secret: bool) -> anyhow::Result<()> {
    let Some(app) = workspace_app(root)? else {
        return Err(CopilotError::MissingApplication.into());
    };

    let aws = connect()?;
    let workspace = LocalWorkspace::new(root);
    let prompter = TerminalPrompter;
    let progress = TerminalProgress;
    let cmd = DeletePipeline::new(aws.platform(), &workspace, &prompter, &progress);

    cmd.delete_pipeline(
        &app,
        PipelineDeleteFlags {
            skip_confirmation: yes,
            delete_secret,
        },
    )?;

    println!("Deleted the pipeline of application {app}.");
    Ok(())
}
