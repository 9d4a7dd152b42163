//! Function log retrieval

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// One log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    /// Provider-assigned id, unique within the group
    pub event_id: String,
    /// Milliseconds since the epoch
    pub timestamp: i64,
    pub message: String,
}

impl LogEvent {
    pub fn new(event_id: impl Into<String>, timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            timestamp,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait LogsGateway: Send + Sync {
    /// Events in `group` at or after `start_time`, oldest first
    async fn filter_events(
        &self,
        group: &str,
        filter: Option<&str>,
        start_time: i64,
    ) -> Result<Vec<LogEvent>>;
}

/// Log group a function writes to
pub fn function_log_group(function: &str) -> String {
    format!("/aws/lambda/{}", function)
}
