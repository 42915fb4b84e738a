//! Audit sinks notified after each committed assignment

use rota_telemetry::{append_jsonl, UsageRecord};
use std::path::PathBuf;
use tracing::warn;

/// Receives usage records. Fire-and-forget: a sink never fails an assignment.
pub trait UsageSink: Send + Sync {
    /// Sink name (used in log lines)
    fn name(&self) -> &str;

    fn record(&self, record: &UsageRecord);
}

/// Appends usage records to a JSONL file
#[derive(Debug, Clone)]
pub struct JsonlUsageLog {
    path: PathBuf,
}

impl JsonlUsageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UsageSink for JsonlUsageLog {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn record(&self, record: &UsageRecord) {
        if let Err(err) = append_jsonl(&self.path, record) {
            warn!(path = %self.path.display(), %err, "failed to append usage record");
        }
    }
}
