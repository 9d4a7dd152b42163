//! Function log tailing
//!
//! Polls the logs gateway on a fixed interval until the cancellation
//! channel flips. Events are handed to a sink oldest first, each exactly
//! once.

use crate::error::{DeployError, Result};
use ginger_gateway::logs::function_log_group;
use ginger_gateway::{LogEvent, LogsGateway};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

/// Default interval between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct LogTailer {
    logs: Arc<dyn LogsGateway>,
    interval: Duration,
}

impl LogTailer {
    pub fn new(logs: Arc<dyn LogsGateway>) -> Self {
        Self {
            logs,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Tail `function`'s log group from `start_time` (epoch millis) until
    /// `cancel` is set to `true` or its sender is dropped.
    ///
    /// A group that does not exist yet reads as empty. Transient failures
    /// are retried on the next tick. Returns the number of delivered events.
    #[instrument(skip(self, cancel, sink))]
    pub async fn tail<F>(
        &self,
        function: &str,
        filter: Option<&str>,
        start_time: i64,
        mut cancel: watch::Receiver<bool>,
        mut sink: F,
    ) -> Result<u64>
    where
        F: FnMut(&LogEvent) + Send,
    {
        let group = function_log_group(function);
        let mut ticker = tokio::time::interval(self.interval);
        let mut cursor = start_time;
        let mut seen_at_cursor: Vec<String> = Vec::new();
        let mut delivered = 0u64;

        loop {
            if *cancel.borrow() {
                break;
            }
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let events = match self.logs.filter_events(&group, filter, cursor).await {
                        Ok(events) => events,
                        Err(e) if e.is_not_found() => {
                            debug!(group = %group, "Log group does not exist yet");
                            continue;
                        }
                        Err(e) if e.is_transient() => {
                            warn!(group = %group, error = %e, "Log poll failed, retrying");
                            continue;
                        }
                        Err(e) => {
                            return Err(DeployError::remote(format!("logs {}", group), e));
                        }
                    };

                    for event in events {
                        // The query is inclusive, so events at the cursor repeat
                        if event.timestamp < cursor
                            || (event.timestamp == cursor
                                && seen_at_cursor.contains(&event.event_id))
                        {
                            continue;
                        }
                        if event.timestamp > cursor {
                            cursor = event.timestamp;
                            seen_at_cursor.clear();
                        }
                        seen_at_cursor.push(event.event_id.clone());
                        sink(&event);
                        delivered += 1;
                    }
                }
            }
        }

        debug!(delivered, "Log tail stopped");
        Ok(delivered)
    }
}
