// ABOUTME: Task tree runner walking a descriptor and its `after` continuations
// ABOUTME: Dispatches recognized keys in order and threads results through the context

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::context::Context;
use super::error::{Outcome, TaskError};
use super::node::TaskNode;
use super::result::{elapsed, RunReport, RunSummary, TaskRecord, TaskStatus};

/// Reserved descriptor key holding continuations.
pub const AFTER_KEY: &str = "after";

/// A descriptor bound to a context, ready to run.
///
/// Built by [`super::Automator::task`]. Running it dispatches every key that
/// names a registered handler, stores each result in the context under the
/// key, then runs the continuations one after another.
#[derive(Debug)]
pub struct Task {
    descriptor: Value,
    context: Context,
    status: TaskStatus,
    outcome: Option<Outcome>,
    records: Vec<TaskRecord>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(descriptor: Value, context: Context) -> Self {
        Self {
            descriptor,
            context,
            status: TaskStatus::Idle,
            outcome: None,
            records: Vec::new(),
            start_time: None,
            end_time: None,
        }
    }

    pub fn descriptor(&self) -> &Value {
        &self.descriptor
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn into_context(self) -> Context {
        self.context
    }

    pub fn result(&self) -> Option<&Value> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().ok())
    }

    pub fn error(&self) -> Option<&Arc<TaskError>> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().err())
    }

    /// Every dispatch performed so far, continuations included, in run order.
    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            status: self.status,
            start_time: self.start_time,
            end_time: self.end_time,
            duration: elapsed(self.start_time, self.end_time),
            result: self.result().cloned(),
            error: self.error().map(|e| e.as_ref().clone()),
            tasks: self.records.clone(),
            summary: RunSummary::from_records(&self.records),
        }
    }

    /// Run the tree. A settled task replays its outcome without dispatching.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Outcome {
        if let Some(outcome) = &self.outcome {
            debug!("Task already settled, replaying outcome");
            return outcome.clone();
        }

        self.status = TaskStatus::Running;
        self.start_time = Some(Utc::now());

        let outcome = self.execute().await;

        self.end_time = Some(Utc::now());
        self.status = match &outcome {
            Ok(_) => TaskStatus::Success,
            Err(_) => TaskStatus::Error,
        };
        self.outcome = Some(outcome.clone());

        info!(
            "Task tree finished with status {} after {} dispatches",
            self.status,
            self.records.len()
        );

        outcome
    }

    async fn execute(&mut self) -> Outcome {
        let entries = match &self.descriptor {
            Value::Object(entries) => entries.clone(),
            Value::Null => Map::new(),
            other => {
                return Err(Arc::new(TaskError::invalid_descriptor(format!(
                    "descriptor must be an object, got {}",
                    json_kind(other)
                ))))
            }
        };

        let registry = Arc::clone(self.context.automator().registry());
        let mut results = Map::new();

        for (task_type, sub_descriptor) in &entries {
            if task_type == AFTER_KEY {
                continue;
            }
            if !registry.contains(task_type) {
                debug!("No handler for key '{}', skipping", task_type);
                continue;
            }

            let mut node = TaskNode::new(task_type.clone(), sub_descriptor.clone());
            let outcome = node.run(&registry, self.context.clone()).await;
            self.records.push(node.record());
            let value = outcome?;

            let follow_ups = registry
                .follow_ups(task_type, sub_descriptor, &value)
                .map_err(Arc::new)?;

            self.context.insert(task_type.clone(), value.clone());
            results.insert(task_type.clone(), value);

            self.run_sequence(follow_ups).await?;
            if let Some(after) = sub_descriptor.get(AFTER_KEY) {
                self.run_continuations(after).await?;
            }
        }

        if let Some(after) = entries.get(AFTER_KEY) {
            self.run_continuations(after).await?;
        }

        Ok(Value::Object(results))
    }

    async fn run_continuations(&mut self, after: &Value) -> Result<(), Arc<TaskError>> {
        let descriptors = continuations(after)?;
        self.run_sequence(descriptors).await
    }

    /// Run each descriptor to completion before starting the next one.
    fn run_sequence(&mut self, descriptors: Vec<Value>) -> BoxFuture<'_, Result<(), Arc<TaskError>>> {
        async move {
            for (index, descriptor) in descriptors.into_iter().enumerate() {
                debug!("Running continuation {}", index);

                let mut child = Task::new(descriptor, self.context.clone());
                let outcome = child.run().await;
                self.records.append(&mut child.records);

                if let Err(task_error) = outcome {
                    warn!("Continuation {} failed, stopping", index);
                    return Err(task_error);
                }

                self.context = child.context;
            }

            Ok(())
        }
        .boxed()
    }
}

/// Normalize an `after` value into the list of descriptors it names.
pub fn continuations(after: &Value) -> Result<Vec<Value>, Arc<TaskError>> {
    match after {
        Value::Null => Ok(Vec::new()),
        Value::Object(_) => Ok(vec![after.clone()]),
        Value::Array(items) => Ok(items.clone()),
        other => Err(Arc::new(TaskError::invalid_descriptor(format!(
            "'after' must be a descriptor or a list of descriptors, got {}",
            json_kind(other)
        )))),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Automator, ErrorType};
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_descriptor_succeeds() {
        let automator = Automator::empty();
        let mut task = automator.task(json!({}));

        assert_eq!(task.status(), TaskStatus::Idle);
        let result = task.run().await.unwrap();

        assert_eq!(result, json!({}));
        assert_eq!(task.status(), TaskStatus::Success);
        assert!(task.records().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_keys_are_skipped() {
        let automator = Automator::empty();
        let mut task = automator.task(json!({ "unknown": { "x": 1 }, "after": [] }));

        assert!(task.run().await.is_ok());
        assert_eq!(task.status(), TaskStatus::Success);
    }

    #[tokio::test]
    async fn test_non_object_descriptor_fails() {
        let automator = Automator::empty();
        let mut task = automator.task(json!([1, 2]));

        let error = task.run().await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::InvalidDescriptor);
        assert_eq!(task.status(), TaskStatus::Error);
    }

    #[tokio::test]
    async fn test_result_is_stored_in_context() {
        let automator = Automator::empty();
        automator
            .registry()
            .register_sync("collab", |_, _| Ok(json!({ "id": 7 })));

        let mut task = automator.task(json!({ "collab": { "title": "t" } }));
        let result = task.run().await.unwrap();

        assert_eq!(result, json!({ "collab": { "id": 7 } }));
        assert_eq!(task.context().get("collab"), Some(&json!({ "id": 7 })));
    }

    #[test]
    fn test_continuations_normalization() {
        assert!(continuations(&json!(null)).unwrap().is_empty());
        assert_eq!(continuations(&json!({ "nav": {} })).unwrap().len(), 1);
        assert_eq!(continuations(&json!([{}, {}])).unwrap().len(), 2);
        assert!(continuations(&json!("nav")).is_err());
    }

    #[tokio::test]
    async fn test_report_reflects_failure() {
        let automator = Automator::empty();
        automator
            .registry()
            .register_sync("storage", |_, _| Err(TaskError::not_found("no root")));

        let mut task = automator.task(json!({ "storage": { "entities": {} } }));
        assert!(task.run().await.is_err());

        let report = task.report();
        assert_eq!(report.status, TaskStatus::Error);
        assert_eq!(report.summary.failed_tasks, 1);
        assert_eq!(report.error.unwrap().code, 404);
    }
}
