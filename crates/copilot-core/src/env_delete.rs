//! `env delete`: remove an environment once no workloads remain in it.

use crate::error::{ignore_absent, CopilotError, Result, ResultExt};
use crate::platform::Platform;
use crate::prompt::{confirm_or_cancel, with_progress, Progress, Prompter};
use crate::types::Environment;
use tracing::info;

pub trait EnvironmentDeleter {
    fn ask(&self, env: &Environment, skip_confirmation: bool) -> Result<()>;
    fn execute(&self, env: &Environment) -> Result<()>;
}

pub struct DeleteEnv<'a> {
    platform: Platform<'a>,
    prompter: &'a dyn Prompter,
    progress: &'a dyn Progress,
}

impl<'a> DeleteEnv<'a> {
    pub fn new(platform: Platform<'a>, prompter: &'a dyn Prompter, progress: &'a dyn Progress) -> Self {
        Self {
            platform,
            prompter,
            progress,
        }
    }

    pub fn validate(&self, app: &str, env: &str) -> Result<Environment> {
        if app.is_empty() {
            return Err(CopilotError::MissingApplication);
        }
        self.platform.store.get_environment(app, env)
    }
}

impl EnvironmentDeleter for DeleteEnv<'_> {
    fn ask(&self, env: &Environment, skip_confirmation: bool) -> Result<()> {
        let mut message = format!(
            "Are you sure you want to delete environment {} from application {}?",
            env.name, env.app
        );
        if env.prod {
            message.push_str(" It is a production environment.");
        }
        confirm_or_cancel(self.prompter, skip_confirmation, &message)
    }

    fn execute(&self, env: &Environment) -> Result<()> {
        info!(app = %env.app, env = %env.name, "deleting environment");
        let session = self
            .platform
            .sessions
            .from_role(&env.manager_role_arn, &env.region)
            .with_context(|| format!("assume role for environment {}", env.name))?;

        let resources = self
            .platform
            .tagger
            .workload_resources(&session, &env.app, &env.name)
            .with_context(|| format!("find workloads running in environment {}", env.name))?;
        if !resources.is_empty() {
            return Err(CopilotError::EnvironmentHasResources {
                env: env.name.clone(),
                resources,
            });
        }

        with_progress(
            self.progress,
            &format!("Deleting environment {}.", env.name),
            &format!("Deleted environment {}.", env.name),
            &format!("Failed to delete environment {}.", env.name),
            || ignore_absent(self.platform.deployer.delete_environment(&session, &env.app, &env.name)),
        )
        .with_context(|| format!("delete environment stack {}-{}", env.app, env.name))?;

        self.platform
            .store
            .delete_environment(&env.app, &env.name)
            .with_context(|| format!("delete environment {} configuration", env.name))
    }
}
