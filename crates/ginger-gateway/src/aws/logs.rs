//! CloudWatch Logs adapter

use super::errors::classify;
use crate::error::Result;
use crate::logs::{LogEvent, LogsGateway};
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::Client;

pub struct CloudWatchLogs {
    client: Client,
}

impl CloudWatchLogs {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogsGateway for CloudWatchLogs {
    async fn filter_events(
        &self,
        group: &str,
        filter: Option<&str>,
        start_time: i64,
    ) -> Result<Vec<LogEvent>> {
        let mut events = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let out = self
                .client
                .filter_log_events()
                .log_group_name(group)
                .start_time(start_time)
                .set_filter_pattern(filter.map(str::to_string))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| classify("logs", "filter_log_events", group, e))?;

            events.extend(out.events().iter().map(|e| {
                LogEvent::new(
                    e.event_id().unwrap_or_default(),
                    e.timestamp().unwrap_or_default(),
                    e.message().unwrap_or_default().trim_end(),
                )
            }));

            match out.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}
