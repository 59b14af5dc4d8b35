//! `pipeline delete`: remove the workspace pipeline and its source secret.

use crate::error::{ignore_absent, CopilotError, Result, ResultExt};
use crate::platform::Platform;
use crate::prompt::{confirm_or_cancel, with_progress, Progress, Prompter};
use crate::workspace::{PipelineManifest, Workspace};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineDeleteFlags {
    pub skip_confirmation: bool,
    /// Also delete the secret holding the source provider token.
    pub delete_secret: bool,
}

pub trait PipelineDeleter {
    /// Fails with `NoPipelineInWorkspace` when the workspace holds no
    /// pipeline for `app`.
    fn delete_pipeline(&self, app: &str, flags: PipelineDeleteFlags) -> Result<()>;
}

pub struct DeletePipeline<'a> {
    platform: Platform<'a>,
    workspace: &'a dyn Workspace,
    prompter: &'a dyn Prompter,
    progress: &'a dyn Progress,
}

impl<'a> DeletePipeline<'a> {
    pub fn new(
        platform: Platform<'a>,
        workspace: &'a dyn Workspace,
        prompter: &'a dyn Prompter,
        progress: &'a dyn Progress,
    ) -> Self {
        Self {
            platform,
            workspace,
            prompter,
            progress,
        }
    }

    /// The pipeline manifest, if the workspace belongs to `app` and has one.
    pub fn manifest(&self, app: &str) -> Result<Option<PipelineManifest>> {
        match self.workspace.summary()? {
            Some(summary) if summary.application == app => self.workspace.pipeline(),
            Some(summary) => {
                debug!(workspace_app = %summary.application, app, "workspace belongs to another application");
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

impl PipelineDeleter for DeletePipeline<'_> {
    fn delete_pipeline(&self, app: &str, flags: PipelineDeleteFlags) -> Result<()> {
        let manifest = self
            .manifest(app)?
            .ok_or(CopilotError::NoPipelineInWorkspace)?;
        confirm_or_cancel(
            self.prompter,
            flags.skip_confirmation,
            &format!(
                "Are you sure you want to delete pipeline {} from application {app}?",
                manifest.name
            ),
        )?;
        info!(app, pipeline = %manifest.name, "deleting pipeline");

        let session = self.platform.sessions.default_session()?;
        if flags.delete_secret {
            if let Some(secret) = manifest.access_token_secret() {
                with_progress(
                    self.progress,
                    &format!("Deleting secret {secret}."),
                    &format!("Deleted secret {secret}."),
                    &format!("Failed to delete secret {secret}."),
                    || self.platform.secrets.delete_secret(&session, secret),
                )
                .with_context(|| format!("delete secret {secret}"))?;
            }
        }

        with_progress(
            self.progress,
            &format!("Deleting pipeline {}.", manifest.name),
            &format!("Deleted pipeline {}.", manifest.name),
            &format!("Failed to delete pipeline {}.", manifest.name),
            || ignore_absent(self.platform.deployer.delete_pipeline(&session, &manifest.name)),
        )
        .with_context(|| format!("delete pipeline {}", manifest.name))?;
        Ok(())
    }
}
