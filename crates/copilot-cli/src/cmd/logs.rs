use crate::cmd::{connect, workspace_app};
use crate::terminal::TerminalPrompter;
use anyhow::Context;
use clap::Args;
use copilot_core::duration::parse_duration;
use copilot_core::logs::OutputFormat;
use copilot_core::types::WorkloadKind;
use copilot_core::workload_logs::{LogsOpts, WorkloadLogs};
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

#[derive(Args)]
pub struct LogsArgs {
    /// Workload name (prompted for when omitted)
    #[arg(long, short = 'n')]
    pub name: Option<String>,
    /// Application name (default: the workspace's application)
    #[arg(long, short = 'a')]
    pub app: Option<String>,
    /// Environment name (prompted for when omitted)
    #[arg(long, short = 'e')]
    pub env: Option<String>,
    /// Keep polling for new events
    #[arg(long)]
    pub follow: bool,
    /// Only show events newer than this, e.g. 30s, 5m or 1h30m
    #[arg(long, value_parser = parse_duration, allow_hyphen_values = true)]
    pub since: Option<chrono::Duration>,
    /// Only show events at or after this RFC 3339 timestamp
    #[arg(long)]
    pub start_time: Option<String>,
    /// Only show events at or before this RFC 3339 timestamp
    #[arg(long)]
    pub end_time: Option<String>,
    /// Most recent events to show per fetch (1-10000)
    #[arg(long)]
    pub limit: Option<u32>,
    /// Only show logs of these task IDs (repeatable or comma separated)
    #[arg(long = "tasks", value_delimiter = ',')]
    pub task_ids: Vec<String>,
}

impl LogsArgs {
    fn into_opts(self, kind: WorkloadKind, json: bool) -> LogsOpts {
        LogsOpts {
            app: self.app,
            name: self.name,
            env: self.env,
            kind,
            follow: self.follow,
            since: self.since,
            start_time: self.start_time,
            end_time: self.end_time,
            limit: self.limit,
            task_ids: self.task_ids,
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            },
        }
    }
}

pub fn run(root: &Path, kind: WorkloadKind, args: LogsArgs, json: bool) -> anyhow::Result<()> {
    let mut opts = args.into_opts(kind, json);
    opts.validate()?;
    if opts.app.as_deref().map_or(true, str::is_empty) {
        opts.app = workspace_app(root)?;
    }

    let follow = opts.follow;
    let aws = connect()?;
    let prompter = TerminalPrompter;
    let mut cmd = WorkloadLogs::new(opts, aws.platform(), &prompter);
    if follow {
        let cancel = Arc::new(AtomicBool::new(false));
        cancel_on(tokio::signal::ctrl_c(), cancel.clone()).context("install Ctrl-C handler")?;
        cmd = cmd.with_cancel(cancel);
    }
    cmd.validate()?;
    cmd.ask()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cmd.execute(&mut out).with_context(|| format!("read {kind} logs"))?;
    Ok(())
}

/// Set `cancel` once `signal` resolves, watching on a background thread.
fn cancel_on<F>(signal: F, cancel: Arc<AtomicBool>) -> std::io::Result<JoinHandle<()>>
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(std::thread::spawn(move || {
        if runtime.block_on(signal).is_ok() {
            tracing::debug!("interrupted, stopping after the current poll");
            cancel.store(true, Ordering::SeqCst);
        }
    }))
}
