// Structured success/failure records emitted by the agent

use crate::message::TokenUsage;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Mutex;
use std::time::Instant;
use tracing::Level;

/// Message attached to success records
pub const SUCCESS_MESSAGE: &str = "Successfully processed request";

/// Message attached to failure records
pub const FAILURE_MESSAGE: &str = "Error occurred during processing";

/// Generated text or error message carried by a record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    Result(String),
    ErrorMessage(String),
}

/// One log record per finished `complete` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRecord {
    pub agent_name: String,
    /// Seconds elapsed since the call started
    pub process_time: f64,
    /// Unix time in seconds
    pub timestamp: f64,
    #[serde(flatten)]
    pub outcome: RecordOutcome,
    pub token_usage: TokenUsage,
    /// Hex SHA-256 of the result text followed by the timestamp
    pub id: String,
}

impl CompletionRecord {
    pub fn success(
        agent_name: impl Into<String>,
        started: Instant,
        text: impl Into<String>,
        token_usage: TokenUsage,
    ) -> Self {
        Self::build(agent_name.into(), started, RecordOutcome::Result(text.into()), token_usage)
    }

    pub fn failure(
        agent_name: impl Into<String>,
        started: Instant,
        error_message: impl Into<String>,
        token_usage: TokenUsage,
    ) -> Self {
        Self::build(
            agent_name.into(),
            started,
            RecordOutcome::ErrorMessage(error_message.into()),
            token_usage,
        )
    }

    fn build(
        agent_name: String,
        started: Instant,
        outcome: RecordOutcome,
        token_usage: TokenUsage,
    ) -> Self {
        let process_time = started.elapsed().as_secs_f64();
        let timestamp = chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        let result = match &outcome {
            RecordOutcome::Result(text) => text.as_str(),
            RecordOutcome::ErrorMessage(_) => "",
        };
        let id = record_id(result, timestamp);

        Self {
            agent_name,
            process_time,
            timestamp,
            outcome,
            token_usage,
            id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RecordOutcome::Result(_))
    }
}

/// Deterministic id for a record's result text and timestamp
pub fn record_id(result: &str, timestamp: f64) -> String {
    let digest = Sha256::digest(format!("{}{}", result, timestamp).as_bytes());
    format!("{:x}", digest)
}

/// Destination for completion records
pub trait RecordSink: Send + Sync {
    fn emit(&self, level: Level, message: &str, record: &CompletionRecord);
}

/// Emits records as `tracing` events with the record attached as JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl RecordSink for TracingSink {
    fn emit(&self, level: Level, message: &str, record: &CompletionRecord) {
        let json = serde_json::to_string(record).unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize completion record: {}", e);
            String::new()
        });

        if level == Level::ERROR {
            tracing::error!(agent = %record.agent_name, id = %record.id, record = %json, "{}", message);
        } else if level == Level::WARN {
            tracing::warn!(agent = %record.agent_name, id = %record.id, record = %json, "{}", message);
        } else {
            tracing::info!(agent = %record.agent_name, id = %record.id, record = %json, "{}", message);
        }
    }
}

/// Collects records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(Level, CompletionRecord)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, CompletionRecord)> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, level: Level, _message: &str, record: &CompletionRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((level, record.clone()));
    }
}
