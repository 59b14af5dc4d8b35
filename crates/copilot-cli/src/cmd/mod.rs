pub mod app;
pub mod env;
pub mod logs;
pub mod pipeline;
pub mod workload;

use anyhow::Context;
use copilot_aws::AwsClients;
use copilot_core::workspace::{LocalWorkspace, Workspace};
use std::path::Path;

/// Application the workspace at `root` belongs to, if any.
pub fn workspace_app(root: &Path) -> anyhow::Result<Option<String>> {
    let summary = LocalWorkspace::new(root)
        .summary()
        .context("read workspace summary")?;
    Ok(summary.map(|s| s.application))
}

/// The application named on the command line, else the workspace's.
/// Empty means neither was available.
pub fn app_or_workspace(root: &Path, app: Option<String>) -> anyhow::Result<String> {
    match app.filter(|a| !a.is_empty()) {
        Some(app) => Ok(app),
        None => Ok(workspace_app(root)?.unwrap_or_default()),
    }
}

pub fn connect() -> anyhow::Result<AwsClients> {
    AwsClients::from_env().context("load AWS configuration")
}
