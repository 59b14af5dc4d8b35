//! Operator interaction: confirmations, selections and progress lines.

use crate::error::{CopilotError, Result};

pub trait Prompter {
    fn confirm(&self, message: &str) -> Result<bool>;
    /// Pick one of `options`, returning the chosen entry.
    fn select(&self, message: &str, options: &[String]) -> Result<String>;
}

/// Start/stop reporting around a remote call.
pub trait Progress {
    fn start(&self, message: &str);
    fn stop(&self, message: &str);
}

/// Ask for confirmation unless `skip` is set; a "no" is `OperationCancelled`.
pub fn confirm_or_cancel(prompter: &dyn Prompter, skip: bool, message: &str) -> Result<()> {
    if skip {
        return Ok(());
    }
    if prompter.confirm(message)? {
        Ok(())
    } else {
        Err(CopilotError::OperationCancelled)
    }
}

/// Run `action` between `start` and `stop`, stopping with `ok` or `failed`.
pub fn with_progress<T>(
    progress: &dyn Progress,
    start: &str,
    ok: &str,
    failed: &str,
    action: impl FnOnce() -> Result<T>,
) -> Result<T> {
    progress.start(start);
    match action() {
        Ok(v) => {
            progress.stop(ok);
            Ok(v)
        }
        Err(e) => {
            progress.stop(failed);
            Err(e)
        }
    }
}
