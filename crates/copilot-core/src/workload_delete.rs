//! `svc delete` / `job delete`: tear down a workload in every environment.

use crate::error::{ignore_absent, CopilotError, Result, ResultExt};
use crate::platform::Platform;
use crate::prompt::{confirm_or_cancel, with_progress, Progress, Prompter};
use crate::types::{Workload, WorkloadKind};
use tracing::{info, warn};

/// Delete one workload and everything it owns.
pub trait WorkloadDeleter {
    fn delete_workload(&self, workload: &Workload, skip_confirmation: bool) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct DeleteWorkloadOpts {
    pub app: String,
    pub name: String,
    pub kind: WorkloadKind,
    pub skip_confirmation: bool,
}

/// Image repository holding a workload's container images.
pub fn workload_repo_name(app: &str, name: &str) -> String {
    format!("{app}/{name}")
}

pub struct DeleteWorkload<'a> {
    platform: Platform<'a>,
    prompter: &'a dyn Prompter,
    progress: &'a dyn Progress,
}

impl<'a> DeleteWorkload<'a> {
    pub fn new(platform: Platform<'a>, prompter: &'a dyn Prompter, progress: &'a dyn Progress) -> Self {
        Self {
            platform,
            prompter,
            progress,
        }
    }

    /// Resolve the workload record named by `opts`.
    pub fn validate(&self, opts: &DeleteWorkloadOpts) -> Result<Workload> {
        if opts.app.is_empty() {
            return Err(CopilotError::MissingApplication);
        }
        self.platform
            .store
            .get_workload(&opts.app, &opts.name, opts.kind)
    }

    pub fn ask(&self, workload: &Workload, skip_confirmation: bool) -> Result<()> {
        confirm_or_cancel(
            self.prompter,
            skip_confirmation,
            &format!(
                "Are you sure you want to delete {} {} from application {}?",
                workload.kind, workload.name, workload.app
            ),
        )
    }

    pub fn execute(&self, workload: &Workload) -> Result<()> {
        let Workload { app, name, kind, .. } = workload;
        info!(app = %app, workload = %name, kind = %kind, "deleting workload");

        let envs = self
            .platform
            .store
            .list_environments(app)
            .with_context(|| format!("list environments of application {app}"))?;
        for env in &envs {
            let session = self
                .platform
                .sessions
                .from_role(&env.manager_role_arn, &env.region)
                .with_context(|| format!("assume role for environment {}", env.name))?;
            with_progress(
                self.progress,
                &format!("Deleting {kind} {name} from environment {}.", env.name),
                &format!("Deleted {kind} {name} from environment {}.", env.name),
                &format!("Failed to delete {kind} {name} from environment {}.", env.name),
                || ignore_absent(self.platform.deployer.delete_workload(&session, app, &env.name, name)),
            )
            .with_context(|| format!("delete {kind} {name} from environment {}", env.name))?;
        }

        self.clear_repositories(workload)?;

        with_progress(
            self.progress,
            &format!("Deleting {kind} {name} configuration."),
            &format!("Deleted {kind} {name} configuration."),
            &format!("Failed to delete {kind} {name} configuration."),
            || self.platform.store.delete_workload(app, name, *kind),
        )
        .with_context(|| format!("delete {kind} {name} configuration"))
    }

    fn clear_repositories(&self, workload: &Workload) -> Result<()> {
        let application = match self.platform.store.get_application(&workload.app) {
            Ok(a) => a,
            Err(e) if e.is_application_not_found() => {
                warn!(app = %workload.app, "application record missing, skipping image cleanup");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let session = self.platform.sessions.default_session()?;
        let regions = self
            .platform
            .deployer
            .regional_app_resources(&session, &application)
            .with_context(|| format!("get regional resources of application {}", workload.app))?;

        let repo = workload_repo_name(&workload.app, &workload.name);
        for resources in &regions {
            let regional = self.platform.sessions.with_region(&resources.region)?;
            self.platform
                .images
                .clear_repository(&regional, &repo)
                .with_context(|| format!("empty repository {repo} in {}", resources.region))?;
        }
        Ok(())
    }
}

impl WorkloadDeleter for DeleteWorkload<'_> {
    fn delete_workload(&self, workload: &Workload, skip_confirmation: bool) -> Result<()> {
        self.ask(workload, skip_confirmation)?;
        self.execute(workload)
    }
}
