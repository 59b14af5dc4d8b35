//! `LogQueryService` on CloudWatch Logs.

use crate::error::AwsError;
use crate::session::AwsClients;
use aws_sdk_cloudwatchlogs::types::{OrderBy, OutputLogEvent};
use aws_sdk_cloudwatchlogs::Client as LogsClient;
use copilot_core::logs::{task_id_from_stream, Checkpoint, LogEvent, LogPage, LogQuery, LogQueryService};
use copilot_core::platform::Session;
use copilot_core::Result;
use tracing::debug;

/// Most recently active streams read when no task filter is given.
const MAX_STREAMS: i32 = 50;

async fn log_group_exists(client: &LogsClient, group: &str) -> std::result::Result<bool, AwsError> {
    let resp = client
        .describe_log_groups()
        .log_group_name_prefix(group)
        .send()
        .await
        .map_err(AwsError::service("logs", "DescribeLogGroups"))?;
    Ok(resp
        .log_groups
        .unwrap_or_default()
        .iter()
        .any(|g| g.log_group_name.as_deref() == Some(group)))
}

async fn log_streams(
    client: &LogsClient,
    group: &str,
    prefixes: &[String],
) -> std::result::Result<Vec<String>, AwsError> {
    let mut names = Vec::new();
    if prefixes.is_empty() {
        let resp = client
            .describe_log_streams()
            .log_group_name(group)
            .order_by(OrderBy::LastEventTime)
            .descending(true)
            .limit(MAX_STREAMS)
            .send()
            .await
            .map_err(AwsError::service("logs", "DescribeLogStreams"))?;
        names.extend(
            resp.log_streams
                .unwrap_or_default()
                .into_iter()
                .filter_map(|s| s.log_stream_name),
        );
        return Ok(names);
    }
    for prefix in prefixes {
        let resp = client
            .describe_log_streams()
            .log_group_name(group)
            .log_stream_name_prefix(prefix)
            .send()
            .await
            .map_err(AwsError::service("logs", "DescribeLogStreams"))?;
        names.extend(
            resp.log_streams
                .unwrap_or_default()
                .into_iter()
                .filter_map(|s| s.log_stream_name),
        );
    }
    Ok(names)
}

async fn fetch_page(
    client: &LogsClient,
    group: &str,
    checkpoint: &Checkpoint,
    query: &LogQuery,
) -> std::result::Result<LogPage, AwsError> {
    let streams = log_streams(client, group, &query.stream_prefixes).await?;
    let mut fetched = Vec::with_capacity(streams.len());
    for stream in streams {
        let start = checkpoint.get(&stream).map(|t| t + 1).or(query.start_time);
        let resp = client
            .get_log_events()
            .log_group_name(group)
            .log_stream_name(&stream)
            .set_start_time(start)
            .set_end_time(query.end_time)
            .set_limit(query.limit.map(|l| l as i32))
            .start_from_head(start.is_some())
            .send()
            .await
            .map_err(AwsError::service("logs", "GetLogEvents"))?;
        fetched.push((stream, resp.events.unwrap_or_default()));
    }
    Ok(collect_page(fetched, checkpoint, query.limit))
}

/// Merge per-stream events in timestamp order, keeping the newest `limit`,
/// and advance each stream's checkpoint to its latest event.
fn collect_page(
    fetched: Vec<(String, Vec<OutputLogEvent>)>,
    checkpoint: &Checkpoint,
    limit: Option<u32>,
) -> LogPage {
    let mut next = checkpoint.clone();
    let mut events = Vec::new();
    for (stream, raw) in fetched {
        let task_id = task_id_from_stream(&stream).to_string();
        for event in raw {
            let (Some(timestamp), Some(message)) = (event.timestamp, event.message) else {
                continue;
            };
            let latest = next.entry(stream.clone()).or_insert(timestamp);
            *latest = (*latest).max(timestamp);
            events.push(LogEvent {
                task_id: task_id.clone(),
                ingestion_time: event.ingestion_time.unwrap_or(timestamp),
                message: message.trim_end_matches('\n').to_string(),
                timestamp,
            });
        }
    }
    events.sort_by_key(|e| e.timestamp);
    if let Some(limit) = limit.map(|l| l as usize) {
        if events.len() > limit {
            events.drain(..events.len() - limit);
        }
    }
    LogPage {
        events,
        checkpoint: Some(next),
    }
}

impl LogQueryService for AwsClients {
    fn log_group_exists(&self, session: &Session, group: &str) -> Result<bool> {
        let client = LogsClient::new(&self.config(session));
        let exists = self.block_on(log_group_exists(&client, group))?;
        debug!(group, exists, "log group lookup");
        Ok(exists)
    }

    fn task_log_events(
        &self,
        session: &Session,
        group: &str,
        checkpoint: &Checkpoint,
        query: &LogQuery,
    ) -> Result<LogPage> {
        let client = LogsClient::new(&self.config(session));
        Ok(self.block_on(fetch_page(&client, group, checkpoint, query))?)
    }
}
