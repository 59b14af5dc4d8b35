//! `svc logs` / `job logs`: locate a deployed workload and stream its task
//! logs, optionally following new events.

use crate::error::{CopilotError, Result, ResultExt};
use crate::logs::{log_group_name, task_stream_prefix, write_events, Checkpoint, LogQuery, OutputFormat};
use crate::platform::{Platform, Session};
use crate::prompt::Prompter;
use crate::types::{Environment, Workload, WorkloadKind};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 10_000;
/// Events shown when no window or limit is given and not following.
pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

#[derive(Debug, Clone, Default)]
pub struct LogsOpts {
    pub app: Option<String>,
    pub name: Option<String>,
    pub env: Option<String>,
    pub kind: WorkloadKind,
    pub follow: bool,
    pub since: Option<Duration>,
    /// RFC 3339.
    pub start_time: Option<String>,
    /// RFC 3339.
    pub end_time: Option<String>,
    pub limit: Option<u32>,
    pub task_ids: Vec<String>,
    pub format: OutputFormat,
}

impl LogsOpts {
    fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref().filter(|s| !s.is_empty())
    }

    fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref().filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.since.is_some() && self.start_time().is_some() {
            return Err(CopilotError::SinceWithStartTime);
        }
        if self.follow && self.end_time().is_some() {
            return Err(CopilotError::FollowWithEndTime);
        }
        if let Some(since) = self.since {
            if since <= Duration::zero() {
                return Err(CopilotError::NonPositiveSince);
            }
            since_start(Utc::now(), since)?;
        }
        if let Some(limit) = self.limit {
            if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
                return Err(CopilotError::LimitOutOfRange(limit));
            }
        }
        if let Some(start) = self.start_time() {
            parse_timestamp("--start-time", start)?;
        }
        if let Some(end) = self.end_time() {
            parse_timestamp("--end-time", end)?;
        }
        Ok(())
    }

    /// The query window relative to `now`.
    pub fn log_query(&self, now: DateTime<Utc>) -> Result<LogQuery> {
        let start_time = match (self.since, self.start_time()) {
            (Some(since), _) => Some(since_start(now, since)?),
            (None, Some(start)) => Some(parse_timestamp("--start-time", start)?),
            (None, None) => None,
        };
        let end_time = self
            .end_time()
            .map(|end| parse_timestamp("--end-time", end))
            .transpose()?;
        let limit = match self.limit {
            Some(limit) => Some(limit),
            None if !self.follow && start_time.is_none() && end_time.is_none() => Some(DEFAULT_LIMIT),
            None => None,
        };
        let workload = self.name.as_deref().unwrap_or_default();
        Ok(LogQuery {
            start_time,
            end_time,
            limit,
            stream_prefixes: self
                .task_ids
                .iter()
                .map(|id| task_stream_prefix(workload, id))
                .collect(),
        })
    }
}

fn parse_timestamp(flag: &'static str, value: &str) -> Result<i64> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.timestamp_millis())
        .map_err(|source| CopilotError::InvalidTimestamp {
            flag,
            value: value.to_string(),
            source,
        })
}

/// Epoch millis of `now - since`, with `since` rounded to whole seconds.
fn since_start(now: DateTime<Utc>, since: Duration) -> Result<i64> {
    round_to_second(since)
        .and_then(|d| now.checked_sub_signed(d))
        .map(|t| t.timestamp_millis())
        .ok_or(CopilotError::SinceOutOfRange)
}

/// Round half away from zero to whole seconds.
fn round_to_second(d: Duration) -> Option<Duration> {
    let ms = d.num_milliseconds();
    let secs = if ms >= 0 {
        ms.checked_add(500)? / 1000
    } else {
        ms.checked_sub(500)? / 1000
    };
    Duration::try_seconds(secs)
}

/// The deployed workload whose logs will be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub env: Environment,
    pub workload: Workload,
}

impl LogTarget {
    pub fn log_group(&self) -> String {
        log_group_name(&self.workload.app, &self.env.name, &self.workload.name)
    }

    fn label(&self) -> String {
        format!("{} ({})", self.workload.name, self.env.name)
    }
}

// ---------------------------------------------------------------------------
// WorkloadLogs
// ---------------------------------------------------------------------------

pub struct WorkloadLogs<'a> {
    opts: LogsOpts,
    platform: Platform<'a>,
    prompter: &'a dyn Prompter,
    sessions: HashMap<String, Session>,
    target: Option<LogTarget>,
    poll_interval: std::time::Duration,
    sleep: Box<dyn Fn(std::time::Duration) + 'a>,
    cancel: Arc<AtomicBool>,
}

impl<'a> WorkloadLogs<'a> {
    pub fn new(opts: LogsOpts, platform: Platform<'a>, prompter: &'a dyn Prompter) -> Self {
        Self {
            opts,
            platform,
            prompter,
            sessions: HashMap::new(),
            target: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            sleep: Box::new(std::thread::sleep),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_poll_interval(mut self, interval: std::time::Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_sleep(mut self, sleep: impl Fn(std::time::Duration) + 'a) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    /// Stop following once `cancel` is set.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn target(&self) -> Option<&LogTarget> {
        self.target.as_ref()
    }

    pub fn validate(&self) -> Result<()> {
        self.opts.validate()
    }

    /// Resolve the application, workload and environment to read from.
    pub fn ask(&mut self) -> Result<()> {
        let app = self.ask_app()?;
        let workloads = match self.opts.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => vec![self.platform.store.get_workload(&app, name, self.opts.kind)?],
            None => self
                .platform
                .store
                .list_workloads(&app, self.opts.kind)
                .with_context(|| format!("list {}s of application {app}", self.opts.kind))?,
        };
        let envs = match self.opts.env.as_deref().filter(|e| !e.is_empty()) {
            Some(env) => vec![self.platform.store.get_environment(&app, env)?],
            None => self
                .platform
                .store
                .list_environments(&app)
                .with_context(|| format!("list environments of application {app}"))?,
        };

        let mut deployed = Vec::new();
        for workload in &workloads {
            for env in &envs {
                let session = self.session_for(env)?;
                let group = log_group_name(&app, &env.name, &workload.name);
                let exists = self
                    .platform
                    .logs
                    .log_group_exists(&session, &group)
                    .with_context(|| format!("check log group {group}"))?;
                debug!(group = %group, exists, "probed log group");
                if exists {
                    deployed.push(LogTarget {
                        env: env.clone(),
                        workload: workload.clone(),
                    });
                }
            }
        }

        let target = match deployed.len() {
            0 => return Err(CopilotError::NoDeployedWorkloads(app)),
            1 => deployed.remove(0),
            _ => {
                let labels: Vec<String> = deployed.iter().map(LogTarget::label).collect();
                let choice = self.prompter.select(
                    &format!("Which deployed {} would you like to show logs of?", self.opts.kind),
                    &labels,
                )?;
                let index = labels
                    .iter()
                    .position(|l| *l == choice)
                    .ok_or(CopilotError::TargetNotSelected)?;
                deployed.swap_remove(index)
            }
        };
        info!(workload = %target.workload.name, env = %target.env.name, "selected workload");
        self.target = Some(target);
        Ok(())
    }

    fn ask_app(&mut self) -> Result<String> {
        if let Some(app) = self.opts.app.as_deref().filter(|a| !a.is_empty()) {
            return Ok(self.platform.store.get_application(app)?.name);
        }
        let apps = self
            .platform
            .store
            .list_applications()
            .with_context(|| "list applications")?;
        let names: Vec<String> = apps.into_iter().map(|a| a.name).collect();
        let app = match names.as_slice() {
            [] => return Err(CopilotError::NoApplications),
            [only] => only.clone(),
            _ => self.prompter.select(
                &format!("Which application does your {} belong to?", self.opts.kind),
                &names,
            )?,
        };
        self.opts.app = Some(app.clone());
        Ok(app)
    }

    /// Role-assumed session for `env`, created once per environment.
    fn session_for(&mut self, env: &Environment) -> Result<Session> {
        if let Some(session) = self.sessions.get(&env.name) {
            return Ok(session.clone());
        }
        let session = self
            .platform
            .sessions
            .from_role(&env.manager_role_arn, &env.region)
            .with_context(|| format!("assume role for environment {}", env.name))?;
        self.sessions.insert(env.name.clone(), session.clone());
        Ok(session)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Write the selected workload's events to `out`, polling for more while
    /// following.
    pub fn execute(&mut self, out: &mut dyn Write) -> Result<()> {
        let target = self.target.clone().ok_or(CopilotError::TargetNotSelected)?;
        let session = self.session_for(&target.env)?;
        let group = target.log_group();
        let mut query = self.opts.log_query(Utc::now())?;
        // Stream prefixes are built from the workload name, which may only be
        // known after selection.
        query.stream_prefixes = self
            .opts
            .task_ids
            .iter()
            .map(|id| task_stream_prefix(&target.workload.name, id))
            .collect();

        let mut checkpoint = Checkpoint::new();
        loop {
            if self.cancelled() {
                return Ok(());
            }
            let page = self
                .platform
                .logs
                .task_log_events(&session, &group, &checkpoint, &query)
                .with_context(|| format!("get log events of log group {group}"))?;
            write_events(out, &page.events, self.opts.format)?;

            if !self.opts.follow {
                return Ok(());
            }
            let Some(next) = page.checkpoint else {
                return Ok(());
            };
            checkpoint = next;
            (self.sleep)(self.poll_interval);
            if self.cancelled() {
                return Ok(());
            }
        }
    }
}
