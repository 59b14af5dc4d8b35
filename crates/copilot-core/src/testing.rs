//! In-memory fakes for every collaborator, recording calls in order.

use crate::app_delete::DeleteAppDeps;
use crate::env_delete::EnvironmentDeleter;
use crate::error::{CopilotError, Result};
use crate::logs::{Checkpoint, LogPage, LogQuery, LogQueryService};
use crate::pipeline_delete::{PipelineDeleteFlags, PipelineDeleter};
use crate::platform::{
    BucketEmptier, Deployer, ImageRemover, Platform, ResourceTagger, SecretRemover, Session,
    SessionProvider,
};
use crate::prompt::{Progress, Prompter};
use crate::store::ConfigStore;
use crate::types::{Application, Environment, RegionalResources, TaskStack, Workload, WorkloadKind};
use crate::workload_delete::WorkloadDeleter;
use crate::workspace::{PipelineManifest, PipelineSource, PipelineSourceProperties, Workspace, WorkspaceSummary};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Calls(RefCell<Vec<String>>);

impl Calls {
    pub fn record(&self, call: impl Into<String>) {
        self.0.borrow_mut().push(call.into());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn position(&self, call: &str) -> usize {
        self.all()
            .iter()
            .position(|c| c == call)
            .unwrap_or_else(|| panic!("call not recorded: {call}\n{:#?}", self.all()))
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.all().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

// ---------------------------------------------------------------------------
// FakeCloud
// ---------------------------------------------------------------------------

pub fn app(name: &str) -> Application {
    Application {
        name: name.to_string(),
        account_id: "123456789012".to_string(),
        domain: None,
    }
}

pub fn env(app: &str, name: &str, region: &str) -> Environment {
    Environment {
        app: app.to_string(),
        name: name.to_string(),
        region: region.to_string(),
        account_id: "123456789012".to_string(),
        manager_role_arn: format!("arn:aws:iam::123456789012:role/{app}-{name}-EnvManagerRole"),
        execution_role_arn: format!("arn:aws:iam::123456789012:role/{app}-{name}-CFNExecutionRole"),
        prod: false,
    }
}

pub fn workload(app: &str, name: &str, kind: WorkloadKind) -> Workload {
    Workload {
        app: app.to_string(),
        name: name.to_string(),
        kind,
        workload_type: match kind {
            WorkloadKind::Service => "Load Balanced Web Service".to_string(),
            WorkloadKind::Job => "Scheduled Job".to_string(),
        },
    }
}

/// A single-account cloud holding config records, stacks and log groups.
pub struct FakeCloud<'c> {
    calls: &'c Calls,
    pub apps: RefCell<Vec<Application>>,
    pub envs: RefCell<Vec<Environment>>,
    pub workloads: RefCell<Vec<Workload>>,
    pub tasks: RefCell<Vec<TaskStack>>,
    pub regions: RefCell<Vec<RegionalResources>>,
    pub stacks: RefCell<BTreeSet<String>>,
    pub log_groups: RefCell<BTreeSet<String>>,
    pub pages: RefCell<VecDeque<LogPage>>,
    pub fail_once: RefCell<Option<String>>,
}

impl<'c> FakeCloud<'c> {
    pub fn empty(calls: &'c Calls) -> Self {
        Self {
            calls,
            apps: RefCell::default(),
            envs: RefCell::default(),
            workloads: RefCell::default(),
            tasks: RefCell::default(),
            regions: RefCell::default(),
            stacks: RefCell::default(),
            log_groups: RefCell::default(),
            pages: RefCell::default(),
            fail_once: RefCell::default(),
        }
    }

    /// "my-app" with services web and worker deployed to test and prod.
    pub fn my_app(calls: &'c Calls) -> Self {
        let cloud = Self::empty(calls);
        cloud.apps.borrow_mut().push(app("my-app"));
        cloud.envs.borrow_mut().extend([
            env("my-app", "test", "us-west-2"),
            env("my-app", "prod", "us-east-1"),
        ]);
        cloud.workloads.borrow_mut().extend([
            workload("my-app", "web", WorkloadKind::Service),
            workload("my-app", "worker", WorkloadKind::Service),
        ]);
        cloud.regions.borrow_mut().extend([
            RegionalResources {
                region: "us-west-2".to_string(),
                bucket: "my-app-us-west-2-pipeline".to_string(),
            },
            RegionalResources {
                region: "us-east-1".to_string(),
                bucket: "my-app-us-east-1-pipeline".to_string(),
            },
        ]);
        cloud.stacks.borrow_mut().extend(
            [
                "my-app-infrastructure",
                "my-app-test",
                "my-app-prod",
                "my-app-test-web",
                "my-app-test-worker",
                "my-app-prod-web",
                "my-app-prod-worker",
            ]
            .map(String::from),
        );
        cloud
    }

    pub fn add_task(&self, env: &str, name: &str) {
        let task = TaskStack {
            name: name.to_string(),
            app: "my-app".to_string(),
            env: env.to_string(),
        };
        self.stacks.borrow_mut().insert(task.stack_name());
        self.tasks.borrow_mut().push(task);
    }

    pub fn fail_once(&self, call: &str) {
        *self.fail_once.borrow_mut() = Some(call.to_string());
    }

    pub fn platform(&self) -> Platform<'_> {
        Platform {
            store: self,
            sessions: self,
            deployer: self,
            buckets: self,
            images: self,
            tagger: self,
            secrets: self,
            logs: self,
        }
    }

    fn call(&self, call: String) -> Result<()> {
        self.calls.record(call.clone());
        let mut fail = self.fail_once.borrow_mut();
        if fail.as_deref() == Some(call.as_str()) {
            *fail = None;
            return Err(CopilotError::remote(format!("injected failure: {call}")));
        }
        Ok(())
    }

    fn delete_stack(&self, call: String, stack: String) -> Result<()> {
        self.call(call)?;
        if self.stacks.borrow_mut().remove(&stack) {
            Ok(())
        } else {
            Err(CopilotError::StackNotFound(stack))
        }
    }
}

impl ConfigStore for FakeCloud<'_> {
    fn list_applications(&self) -> Result<Vec<Application>> {
        Ok(self.apps.borrow().clone())
    }

    fn get_application(&self, app: &str) -> Result<Application> {
        self.apps
            .borrow()
            .iter()
            .find(|a| a.name == app)
            .cloned()
            .ok_or_else(|| CopilotError::ApplicationNotFound(app.to_string()))
    }

    fn delete_application(&self, app: &str) -> Result<()> {
        self.call(format!("store delete-app {app}"))?;
        self.apps.borrow_mut().retain(|a| a.name != app);
        Ok(())
    }

    fn list_environments(&self, app: &str) -> Result<Vec<Environment>> {
        self.call(format!("store list-envs {app}"))?;
        Ok(self
            .envs
            .borrow()
            .iter()
            .filter(|e| e.app == app)
            .cloned()
            .collect())
    }

    fn get_environment(&self, app: &str, env: &str) -> Result<Environment> {
        self.envs
            .borrow()
            .iter()
            .find(|e| e.app == app && e.name == env)
            .cloned()
            .ok_or_else(|| CopilotError::EnvironmentNotFound {
                app: app.to_string(),
                env: env.to_string(),
            })
    }

    fn delete_environment(&self, app: &str, env: &str) -> Result<()> {
        self.call(format!("store delete-env {app} {env}"))?;
        self.envs
            .borrow_mut()
            .retain(|e| !(e.app == app && e.name == env));
        Ok(())
    }

    fn list_services(&self, app: &str) -> Result<Vec<Workload>> {
        Ok(self
            .workloads
            .borrow()
            .iter()
            .filter(|w| w.app == app && w.kind == WorkloadKind::Service)
            .cloned()
            .collect())
    }

    fn list_jobs(&self, app: &str) -> Result<Vec<Workload>> {
        Ok(self
            .workloads
            .borrow()
            .iter()
            .filter(|w| w.app == app && w.kind == WorkloadKind::Job)
            .cloned()
            .collect())
    }

    fn get_workload(&self, app: &str, name: &str, kind: WorkloadKind) -> Result<Workload> {
        self.workloads
            .borrow()
            .iter()
            .find(|w| w.app == app && w.name == name && w.kind == kind)
            .cloned()
            .ok_or_else(|| CopilotError::WorkloadNotFound {
                app: app.to_string(),
                name: name.to_string(),
            })
    }

    fn delete_workload(&self, app: &str, name: &str, _kind: WorkloadKind) -> Result<()> {
        self.call(format!("store delete-workload {app} {name}"))?;
        self.workloads
            .borrow_mut()
            .retain(|w| !(w.app == app && w.name == name));
        Ok(())
    }
}

impl SessionProvider for FakeCloud<'_> {
    fn default_session(&self) -> Result<Session> {
        Ok(Session::new("us-west-2"))
    }

    fn with_region(&self, region: &str) -> Result<Session> {
        Ok(Session::new(region))
    }

    fn from_role(&self, role_arn: &str, region: &str) -> Result<Session> {
        Ok(Session::with_role(region, role_arn))
    }
}

impl Deployer for FakeCloud<'_> {
    fn regional_app_resources(
        &self,
        _session: &Session,
        app: &Application,
    ) -> Result<Vec<RegionalResources>> {
        self.call(format!("deploy regional-resources {}", app.name))?;
        Ok(self.regions.borrow().clone())
    }

    fn list_task_stacks(&self, session: &Session, app: &str, env: &str) -> Result<Vec<TaskStack>> {
        assert!(session.role_arn.is_some(), "tasks must be listed with the env role");
        self.call(format!("deploy list-tasks {env}"))?;
        Ok(self
            .tasks
            .borrow()
            .iter()
            .filter(|t| t.app == app && t.env == env)
            .cloned()
            .collect())
    }

    fn delete_task(&self, _session: &Session, task: &TaskStack) -> Result<()> {
        self.delete_stack(
            format!("deploy delete-task {} {}", task.env, task.name),
            task.stack_name(),
        )?;
        self.tasks.borrow_mut().retain(|t| t != task);
        Ok(())
    }

    fn delete_workload(&self, _session: &Session, app: &str, env: &str, name: &str) -> Result<()> {
        self.delete_stack(
            format!("deploy delete-workload {env} {name}"),
            format!("{app}-{env}-{name}"),
        )
    }

    fn delete_environment(&self, _session: &Session, app: &str, env: &str) -> Result<()> {
        self.delete_stack(format!("deploy delete-env {env}"), format!("{app}-{env}"))
    }

    fn delete_pipeline(&self, _session: &Session, name: &str) -> Result<()> {
        self.delete_stack(format!("deploy delete-pipeline {name}"), name.to_string())
    }

    fn delete_app(&self, _session: &Session, app: &str) -> Result<()> {
        self.delete_stack(
            format!("deploy delete-app {app}"),
            format!("{app}-infrastructure"),
        )
    }
}

impl BucketEmptier for FakeCloud<'_> {
    fn empty_bucket(&self, session: &Session, bucket: &str) -> Result<()> {
        self.call(format!("empty-bucket {} {bucket}", session.region))
    }
}

impl ImageRemover for FakeCloud<'_> {
    fn clear_repository(&self, _session: &Session, repo: &str) -> Result<()> {
        self.call(format!("clear-repo {repo}"))
    }
}

impl ResourceTagger for FakeCloud<'_> {
    fn workload_resources(&self, _session: &Session, app: &str, env: &str) -> Result<Vec<String>> {
        self.call(format!("tagged {env}"))?;
        let prefix = format!("{app}-{env}-");
        Ok(self
            .stacks
            .borrow()
            .iter()
            .filter(|s| s.starts_with(&prefix))
            .map(|s| format!("arn:aws:cloudformation:us-west-2:123456789012:stack/{s}/1"))
            .collect())
    }
}

impl SecretRemover for FakeCloud<'_> {
    fn delete_secret(&self, _session: &Session, secret: &str) -> Result<()> {
        self.call(format!("delete-secret {secret}"))
    }
}

impl LogQueryService for FakeCloud<'_> {
    fn log_group_exists(&self, session: &Session, group: &str) -> Result<bool> {
        assert!(session.role_arn.is_some(), "log groups are probed with the env role");
        self.call(format!("log-group-exists {group}"))?;
        Ok(self.log_groups.borrow().contains(group))
    }

    fn task_log_events(
        &self,
        _session: &Session,
        group: &str,
        checkpoint: &Checkpoint,
        _query: &LogQuery,
    ) -> Result<LogPage> {
        self.call(format!("log-events {group} checkpoint={}", checkpoint.len()))?;
        Ok(self.pages.borrow_mut().pop_front().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Nested deletion routines
// ---------------------------------------------------------------------------

/// Stand-ins for the per-resource routines that only record how they were called.
pub struct RecordingDeleters<'c> {
    calls: &'c Calls,
    pub pipeline_result: RefCell<Option<CopilotError>>,
}

impl<'c> RecordingDeleters<'c> {
    pub fn new(calls: &'c Calls) -> Self {
        Self {
            calls,
            pipeline_result: RefCell::new(None),
        }
    }

    pub fn without_pipeline(self) -> Self {
        *self.pipeline_result.borrow_mut() = Some(CopilotError::NoPipelineInWorkspace);
        self
    }
}

impl WorkloadDeleter for RecordingDeleters<'_> {
    fn delete_workload(&self, workload: &Workload, skip_confirmation: bool) -> Result<()> {
        self.calls.record(format!(
            "delete-{} {} skip={skip_confirmation}",
            workload.kind, workload.name
        ));
        Ok(())
    }
}

impl EnvironmentDeleter for RecordingDeleters<'_> {
    fn ask(&self, env: &Environment, skip_confirmation: bool) -> Result<()> {
        self.calls
            .record(format!("env-ask {} skip={skip_confirmation}", env.name));
        Ok(())
    }

    fn execute(&self, env: &Environment) -> Result<()> {
        self.calls.record(format!("env-delete {}", env.name));
        Ok(())
    }
}

impl PipelineDeleter for RecordingDeleters<'_> {
    fn delete_pipeline(&self, app: &str, flags: PipelineDeleteFlags) -> Result<()> {
        self.calls.record(format!(
            "delete-pipeline {app} skip={} secret={}",
            flags.skip_confirmation, flags.delete_secret
        ));
        match self.pipeline_result.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Workspace, prompter, progress
// ---------------------------------------------------------------------------

pub struct FakeWorkspace<'c> {
    calls: &'c Calls,
    pub summary: RefCell<Option<WorkspaceSummary>>,
    pub pipeline: RefCell<Option<PipelineManifest>>,
    unreadable: Cell<bool>,
}

impl<'c> FakeWorkspace<'c> {
    pub fn for_app(calls: &'c Calls, app: &str) -> Self {
        Self {
            calls,
            summary: RefCell::new(Some(WorkspaceSummary {
                application: app.to_string(),
            })),
            pipeline: RefCell::new(None),
            unreadable: Cell::new(false),
        }
    }

    /// Reading the summary fails.
    pub fn unreadable(self) -> Self {
        self.unreadable.set(true);
        self
    }

    pub fn with_pipeline(self, name: &str, secret: Option<&str>) -> Self {
        *self.pipeline.borrow_mut() = Some(PipelineManifest {
            name: name.to_string(),
            source: Some(PipelineSource {
                provider: "GitHub".to_string(),
                properties: PipelineSourceProperties {
                    repository: Some("https://github.com/acme/frontend".to_string()),
                    branch: Some("main".to_string()),
                    access_token_secret: secret.map(String::from),
                },
            }),
        });
        self
    }
}

impl Workspace for FakeWorkspace<'_> {
    fn summary(&self) -> Result<Option<WorkspaceSummary>> {
        if self.unreadable.get() {
            return Err(CopilotError::Io(std::io::Error::other("permission denied")));
        }
        Ok(self.summary.borrow().clone())
    }

    fn pipeline(&self) -> Result<Option<PipelineManifest>> {
        Ok(self.pipeline.borrow().clone())
    }

    fn delete_workspace_file(&self) -> Result<()> {
        self.calls.record("delete-workspace-file");
        *self.summary.borrow_mut() = None;
        Ok(())
    }
}

pub struct FakePrompter<'c> {
    calls: &'c Calls,
    confirm: Cell<bool>,
    select_index: Cell<usize>,
}

impl<'c> FakePrompter<'c> {
    pub fn new(calls: &'c Calls) -> Self {
        Self {
            calls,
            confirm: Cell::new(true),
            select_index: Cell::new(0),
        }
    }

    pub fn confirming(self, answer: bool) -> Self {
        self.confirm.set(answer);
        self
    }

    pub fn selecting(self, index: usize) -> Self {
        self.select_index.set(index);
        self
    }
}

impl Prompter for FakePrompter<'_> {
    fn confirm(&self, message: &str) -> Result<bool> {
        self.calls.record(format!("confirm {message}"));
        Ok(self.confirm.get())
    }

    fn select(&self, message: &str, options: &[String]) -> Result<String> {
        self.calls
            .record(format!("select {message} [{}]", options.join(", ")));
        Ok(options[self.select_index.get()].clone())
    }
}

#[derive(Default)]
pub struct RecordingProgress(RefCell<Vec<String>>);

impl RecordingProgress {
    pub fn lines(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl Progress for RecordingProgress {
    fn start(&self, message: &str) {
        self.0.borrow_mut().push(format!("start {message}"));
    }

    fn stop(&self, message: &str) {
        self.0.borrow_mut().push(format!("stop {message}"));
    }
}

/// Orchestrator dependencies where the nested routines only record calls.
pub fn recording_deps<'a>(
    cloud: &'a FakeCloud<'_>,
    deleters: &'a RecordingDeleters<'_>,
    workspace: &'a FakeWorkspace<'_>,
    prompter: &'a FakePrompter<'_>,
    progress: &'a RecordingProgress,
) -> DeleteAppDeps<'a> {
    DeleteAppDeps {
        platform: cloud.platform(),
        workloads: deleters,
        environments: deleters,
        pipeline: deleters,
        workspace,
        prompter,
        progress,
    }
}
