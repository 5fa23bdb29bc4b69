// ABOUTME: Task status, per-dispatch records and run report aggregation
// ABOUTME: Defines what a settled task tree reports back to its caller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::error::TaskError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Idle,
    Running,
    Success,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Error)
    }
}

/// One handler dispatch as it happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_type: String,
    pub status: TaskStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    pub result: Option<Value>,
    pub error: Option<TaskError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: TaskStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    pub result: Option<Value>,
    pub error: Option<TaskError>,
    pub tasks: Vec<TaskRecord>,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_tasks: usize,
    pub successful_tasks: usize,
    pub failed_tasks: usize,
}

impl TaskRecord {
    pub fn is_successful(&self) -> bool {
        self.status == TaskStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Error
    }
}

impl RunSummary {
    pub fn from_records(records: &[TaskRecord]) -> Self {
        Self {
            total_tasks: records.len(),
            successful_tasks: records.iter().filter(|r| r.is_successful()).count(),
            failed_tasks: records.iter().filter(|r| r.is_failed()).count(),
        }
    }
}

/// Elapsed wall time between two instants, zero when the clock went backwards.
pub(crate) fn elapsed(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<Duration> {
    match (start, end) {
        (Some(start), Some(end)) => Some((end - start).to_std().unwrap_or(Duration::ZERO)),
        _ => None,
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Idle => write!(f, "idle"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Error => write!(f, "error"),
        }
    }
}
