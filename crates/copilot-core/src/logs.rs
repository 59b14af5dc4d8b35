//! Log events, the log-query contract and event formatting.

use crate::error::Result;
use crate::platform::Session;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

const LOG_GROUP_PREFIX: &str = "/copilot";
const LOG_STREAM_PREFIX: &str = "copilot";

/// Log group holding the task logs of `workload` in `env`.
pub fn log_group_name(app: &str, env: &str, workload: &str) -> String {
    format!("{LOG_GROUP_PREFIX}/{app}-{env}-{workload}")
}

/// Stream name prefix selecting one task's logs: `copilot/{workload}/{task_id}`.
pub fn task_stream_prefix(workload: &str, task_id: &str) -> String {
    format!("{LOG_STREAM_PREFIX}/{workload}/{task_id}")
}

/// Task ID encoded as the last segment of a stream name.
pub fn task_id_from_stream(stream: &str) -> &str {
    stream.rsplit('/').next().unwrap_or(stream)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(rename = "taskID")]
    pub task_id: String,
    #[serde(rename = "ingestionTime")]
    pub ingestion_time: i64,
    pub message: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl LogEvent {
    pub fn human_string(&self) -> String {
        format!("{} {}\n", self.task_id, self.message)
    }

    pub fn json_string(&self) -> Result<String> {
        Ok(format!("{}\n", serde_json::to_string(self)?))
    }
}

/// Per-stream consumption marker: stream name → timestamp of the last event read.
pub type Checkpoint = BTreeMap<String, i64>;

/// Bounds for one page fetch. Times are epoch milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
    /// Only read streams whose names start with one of these.
    pub stream_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPage {
    pub events: Vec<LogEvent>,
    /// `None` once the source has nothing more to offer.
    pub checkpoint: Option<Checkpoint>,
}

pub trait LogQueryService {
    fn log_group_exists(&self, session: &Session, group: &str) -> Result<bool>;
    fn task_log_events(
        &self,
        session: &Session,
        group: &str,
        checkpoint: &Checkpoint,
        query: &LogQuery,
    ) -> Result<LogPage>;
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

pub fn write_events(out: &mut dyn Write, events: &[LogEvent], format: OutputFormat) -> Result<()> {
    for event in events {
        let line = match format {
            OutputFormat::Human => event.human_string(),
            OutputFormat::Json => event.json_string()?,
        };
        out.write_all(line.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello() -> LogEvent {
        LogEvent {
            task_id: "123".to_string(),
            ingestion_time: 1_600_000_000_500,
            message: "hello".to_string(),
            timestamp: 1_600_000_000_000,
        }
    }

    #[test]
    fn human_line() {
        let mut out = Vec::new();
        write_events(&mut out, &[hello()], OutputFormat::Human).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "123 hello\n");
    }

    #[test]
    fn json_line_keeps_field_order() {
        let mut out = Vec::new();
        write_events(&mut out, &[hello()], OutputFormat::Json).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"taskID\":\"123\",\"ingestionTime\":1600000000500,\"message\":\"hello\",\"timestamp\":1600000000000}\n"
        );
    }

    #[test]
    fn group_and_stream_names() {
        assert_eq!(log_group_name("my-app", "test", "web"), "/copilot/my-app-test-web");
        assert_eq!(task_stream_prefix("web", "abc123"), "copilot/web/abc123");
        assert_eq!(task_id_from_stream("copilot/web/abc123"), "abc123");
        assert_eq!(task_id_from_stream("plain"), "plain");
    }
}
