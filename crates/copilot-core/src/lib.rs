pub mod app_delete;
pub mod duration;
pub mod env_delete;
pub mod error;
pub mod io;
pub mod logs;
pub mod paths;
pub mod pipeline_delete;
pub mod platform;
pub mod prompt;
pub mod store;
pub mod types;
pub mod workload_delete;
pub mod workload_logs;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{CopilotError, Result, ResultExt};
