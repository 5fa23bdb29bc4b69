// ABOUTME: Single task node bound to one descriptor key
// ABOUTME: Tracks the idle -> running -> success|error state machine around one dispatch

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use super::context::Context;
use super::error::{Outcome, TaskError};
use super::registry::HandlerRegistry;
use super::result::{elapsed, TaskRecord, TaskStatus};

#[derive(Debug, Clone)]
pub struct TaskNode {
    task_type: String,
    descriptor: Value,
    status: TaskStatus,
    result: Option<Value>,
    error: Option<Arc<TaskError>>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl TaskNode {
    pub fn new(task_type: impl Into<String>, descriptor: Value) -> Self {
        Self {
            task_type: task_type.into(),
            descriptor,
            status: TaskStatus::Idle,
            result: None,
            error: None,
            start_time: None,
            end_time: None,
        }
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    pub fn descriptor(&self) -> &Value {
        &self.descriptor
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&Arc<TaskError>> {
        self.error.as_ref()
    }

    /// Dispatch this node's handler once; later calls return the stored outcome.
    pub async fn run(&mut self, registry: &HandlerRegistry, context: Context) -> Outcome {
        if let Some(outcome) = self.settled() {
            return outcome;
        }

        self.status = TaskStatus::Running;
        self.start_time = Some(Utc::now());
        info!("Running task '{}'", self.task_type);

        let outcome = registry
            .dispatch(&self.task_type, self.descriptor.clone(), context)
            .await;
        self.end_time = Some(Utc::now());

        match outcome {
            Ok(value) => {
                info!("Task '{}' succeeded", self.task_type);
                self.status = TaskStatus::Success;
                self.result = Some(value.clone());
                Ok(value)
            }
            Err(task_error) => {
                error!("Task '{}' failed: {}", self.task_type, task_error);
                let task_error = Arc::new(task_error);
                self.status = TaskStatus::Error;
                self.error = Some(Arc::clone(&task_error));
                Err(task_error)
            }
        }
    }

    fn settled(&self) -> Option<Outcome> {
        match self.status {
            TaskStatus::Success => Some(Ok(self.result.clone().unwrap_or(Value::Null))),
            TaskStatus::Error => self.error.clone().map(Err),
            TaskStatus::Idle | TaskStatus::Running => None,
        }
    }

    pub fn record(&self) -> TaskRecord {
        TaskRecord {
            task_type: self.task_type.clone(),
            status: self.status,
            start_time: self.start_time,
            end_time: self.end_time,
            duration: elapsed(self.start_time, self.end_time),
            result: self.result.clone(),
            error: self.error.as_deref().cloned(),
        }
    }
}
