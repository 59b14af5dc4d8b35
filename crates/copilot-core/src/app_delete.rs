//! `app delete`: tear down an application and everything under it.
//!
//! Deletion runs in a fixed order so that nothing is removed while something
//! else still depends on it:
//!
//! 1. services, 2. jobs, 3. ad-hoc tasks, 4. environments,
//! 5. regional buckets, 6. pipeline, 7. application stack,
//! 8. application record, 9. workspace marker.
//!
//! Every step tolerates work a previous, interrupted run already did, so
//! re-running after a failure picks up where it stopped.

use crate::env_delete::EnvironmentDeleter;
use crate::error::{ignore_absent, CopilotError, Result, ResultExt};
use crate::pipeline_delete::{PipelineDeleteFlags, PipelineDeleter};
use crate::platform::Platform;
use crate::prompt::{confirm_or_cancel, with_progress, Progress, Prompter};
use crate::types::{Environment, WorkloadKind};
use crate::workload_delete::WorkloadDeleter;
use crate::workspace::Workspace;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct DeleteAppOpts {
    pub name: String,
    pub skip_confirmation: bool,
}

impl DeleteAppOpts {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CopilotError::MissingApplication);
        }
        Ok(())
    }
}

/// Collaborators of [`DeleteApp`].
#[derive(Clone, Copy)]
pub struct DeleteAppDeps<'a> {
    pub platform: Platform<'a>,
    pub workloads: &'a dyn WorkloadDeleter,
    pub environments: &'a dyn EnvironmentDeleter,
    pub pipeline: &'a dyn PipelineDeleter,
    pub workspace: &'a dyn Workspace,
    pub prompter: &'a dyn Prompter,
    pub progress: &'a dyn Progress,
}

pub struct DeleteApp<'a> {
    opts: DeleteAppOpts,
    deps: DeleteAppDeps<'a>,
    envs: Option<Vec<Environment>>,
}

impl<'a> DeleteApp<'a> {
    pub fn new(opts: DeleteAppOpts, deps: DeleteAppDeps<'a>) -> Self {
        Self {
            opts,
            deps,
            envs: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.opts.validate()
    }

    pub fn ask(&self) -> Result<()> {
        confirm_or_cancel(
            self.deps.prompter,
            self.opts.skip_confirmation,
            &format!(
                "Are you sure you want to delete application {}?",
                self.opts.name
            ),
        )
    }

    pub fn execute(&mut self) -> Result<()> {
        let app = self.opts.name.clone();
        info!(app = %app, "deleting application");

        self.delete_workloads(WorkloadKind::Service)?;
        self.delete_workloads(WorkloadKind::Job)?;
        self.delete_tasks()?;
        self.delete_environments()?;
        self.empty_buckets()?;
        self.delete_pipeline()?;
        self.delete_app_resources()?;
        self.delete_app_config()?;
        self.delete_workspace_file()?;

        info!(app = %app, "application deleted");
        Ok(())
    }

    /// Environments of the application, listed once per run.
    fn environments(&mut self) -> Result<&[Environment]> {
        let envs = match self.envs.take() {
            Some(envs) => envs,
            None => self
                .deps
                .platform
                .store
                .list_environments(&self.opts.name)
                .with_context(|| format!("list environments of application {}", self.opts.name))?,
        };
        Ok(self.envs.insert(envs).as_slice())
    }

    fn delete_workloads(&self, kind: WorkloadKind) -> Result<()> {
        let app = &self.opts.name;
        let workloads = self
            .deps
            .platform
            .store
            .list_workloads(app, kind)
            .with_context(|| format!("list {kind}s of application {app}"))?;
        for workload in &workloads {
            info!(app = %app, workload = %workload.name, kind = %kind, "deleting workload");
            self.deps
                .workloads
                .delete_workload(workload, true)
                .with_context(|| format!("delete {kind} {}", workload.name))?;
        }
        Ok(())
    }

    fn delete_tasks(&mut self) -> Result<()> {
        let deps = self.deps;
        let app = self.opts.name.clone();
        for env in self.environments()? {
            let session = deps
                .platform
                .sessions
                .from_role(&env.manager_role_arn, &env.region)
                .with_context(|| format!("assume role for environment {}", env.name))?;
            let tasks = deps
                .platform
                .deployer
                .list_task_stacks(&session, &app, &env.name)
                .with_context(|| format!("list tasks in environment {}", env.name))?;

            for task in &tasks {
                let repo = task.ecr_repo_name();
                with_progress(
                    deps.progress,
                    &format!("Deleting task {} from environment {}.", task.name, env.name),
                    &format!("Deleted task {} from environment {}.", task.name, env.name),
                    &format!("Failed to delete task {} from environment {}.", task.name, env.name),
                    || {
                        deps.platform
                            .images
                            .clear_repository(&session, &repo)
                            .with_context(|| format!("empty repository {repo}"))?;
                        ignore_absent(deps.platform.deployer.delete_task(&session, task))
                            .with_context(|| format!("delete task stack {}", task.stack_name()))
                    },
                )?;
            }
        }
        Ok(())
    }

    fn delete_environments(&mut self) -> Result<()> {
        let deps = self.deps;
        for env in self.environments()? {
            deps.environments
                .ask(env, true)
                .and_then(|()| deps.environments.execute(env))
                .with_context(|| format!("delete environment {}", env.name))?;
        }
        Ok(())
    }

    fn empty_buckets(&self) -> Result<()> {
        let deps = self.deps;
        let name = &self.opts.name;
        let app = match deps.platform.store.get_application(name) {
            Ok(app) => app,
            Err(e) if e.is_application_not_found() => {
                warn!(app = %name, "application record already deleted, skipping bucket cleanup");
                return Ok(());
            }
            Err(e) => return Err(e).with_context(|| format!("get application {name}")),
        };

        let session = deps.platform.sessions.default_session()?;
        let regions = deps
            .platform
            .deployer
            .regional_app_resources(&session, &app)
            .with_context(|| format!("get regional resources of application {name}"))?;

        for resources in &regions {
            let regional = deps
                .platform
                .sessions
                .with_region(&resources.region)
                .with_context(|| format!("create session for region {}", resources.region))?;
            with_progress(
                deps.progress,
                &format!("Cleaning up bucket {} in region {}.", resources.bucket, resources.region),
                &format!("Cleaned up bucket {} in region {}.", resources.bucket, resources.region),
                &format!(
                    "Failed to clean up bucket {} in region {}.",
                    resources.bucket, resources.region
                ),
                || deps.platform.buckets.empty_bucket(&regional, &resources.bucket),
            )
            .with_context(|| format!("empty bucket {}", resources.bucket))?;
        }
        Ok(())
    }

    fn delete_pipeline(&self) -> Result<()> {
        let flags = PipelineDeleteFlags {
            skip_confirmation: true,
            delete_secret: true,
        };
        match self.deps.pipeline.delete_pipeline(&self.opts.name, flags) {
            Err(e) if e.is_no_pipeline() => {
                info!(app = %self.opts.name, "no pipeline in workspace");
                Ok(())
            }
            result => result.with_context(|| "delete pipeline"),
        }
    }

    fn delete_app_resources(&self) -> Result<()> {
        let deps = self.deps;
        let name = &self.opts.name;
        let session = deps.platform.sessions.default_session()?;
        with_progress(
            deps.progress,
            "Deleting application resources.",
            "Deleted application resources.",
            "Failed to delete application resources.",
            || ignore_absent(deps.platform.deployer.delete_app(&session, name)),
        )
        .with_context(|| format!("delete resources of application {name}"))?;
        Ok(())
    }

    fn delete_app_config(&self) -> Result<()> {
        let deps = self.deps;
        let name = &self.opts.name;
        with_progress(
            deps.progress,
            "Deleting application configuration.",
            "Deleted application configuration.",
            "Failed to delete application configuration.",
            || match deps.platform.store.delete_application(name) {
                Err(e) if e.is_application_not_found() => Ok(()),
                result => result,
            },
        )
        .with_context(|| format!("delete configuration of application {name}"))
    }

    fn delete_workspace_file(&self) -> Result<()> {
        let deps = self.deps;
        let name = &self.opts.name;
        let summary = deps
            .workspace
            .summary()
            .with_context(|| "read workspace summary")?;
        if let Some(summary) = summary {
            if summary.application != *name {
                warn!(
                    app = %name,
                    workspace_app = %summary.application,
                    "workspace belongs to another application, keeping it"
                );
                return Ok(());
            }
        }
        with_progress(
            deps.progress,
            "Deleting local workspace file.",
            "Deleted local workspace file.",
            "Failed to delete local workspace file.",
            || deps.workspace.delete_workspace_file(),
        )
        .with_context(|| "delete local workspace file")
    }
}
