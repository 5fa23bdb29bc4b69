// ABOUTME: Handler registry mapping task type names to asynchronous handlers
// ABOUTME: Normalizes plain returns, errors and panics into one dispatch outcome

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use super::context::Context;
use super::error::{Result, TaskError};

/// Implementation of one task type.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, descriptor: Value, context: Context) -> Result<Value>;

    /// Static check used by descriptor validation before anything runs.
    fn validate_descriptor(&self, _descriptor: &Value) -> Result<()> {
        Ok(())
    }

    /// Descriptors the runner executes once this handler has succeeded,
    /// ahead of any `after` continuation.
    fn follow_ups(&self, _descriptor: &Value, _result: &Value) -> Result<Vec<Value>> {
        Ok(Vec::new())
    }
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> TaskHandler for FnHandler<F>
where
    F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn handle(&self, descriptor: Value, context: Context) -> Result<Value> {
        (self.0)(descriptor, context).await
    }
}

struct SyncHandler<F>(F);

#[async_trait]
impl<F> TaskHandler for SyncHandler<F>
where
    F: Fn(Value, &Context) -> Result<Value> + Send + Sync + 'static,
{
    async fn handle(&self, descriptor: Value, context: Context) -> Result<Value> {
        (self.0)(descriptor, &context)
    }
}

/// Process-wide table of task handlers.
///
/// Built once at startup and shared through [`super::Automator`]. Registering
/// a type that already exists replaces the previous handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn TaskHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, task_type: impl Into<String>, handler: impl TaskHandler + 'static) {
        self.register_arc(task_type, Arc::new(handler));
    }

    pub fn register_arc(&self, task_type: impl Into<String>, handler: Arc<dyn TaskHandler>) {
        let task_type = task_type.into();
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if handlers.insert(task_type.clone(), handler).is_some() {
            debug!("Handler for '{}' overridden", task_type);
        } else {
            debug!("Handler for '{}' registered", task_type);
        }
    }

    /// Register an async closure as a handler.
    pub fn register_fn<F, Fut>(&self, task_type: impl Into<String>, handler: F)
    where
        F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.register(task_type, FnHandler(handler));
    }

    /// Register a plain function; its return value is an already-settled result.
    pub fn register_sync<F>(&self, task_type: impl Into<String>, handler: F)
    where
        F: Fn(Value, &Context) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(task_type, SyncHandler(handler));
    }

    pub fn unregister(&self, task_type: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(task_type)
    }

    pub fn get(&self, task_type: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(task_type)
            .cloned()
    }

    pub fn contains(&self, task_type: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(task_type)
    }

    /// Snapshot of the current mapping.
    pub fn handlers(&self) -> HashMap<String, Arc<dyn TaskHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn task_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        types.sort();
        types
    }

    /// Run the handler registered for `task_type`.
    pub async fn dispatch(&self, task_type: &str, descriptor: Value, context: Context) -> Result<Value> {
        // The lock is released before the handler runs so handlers may register or dispatch.
        let handler = self
            .get(task_type)
            .ok_or_else(|| TaskError::unknown_task_type(task_type))?;

        match AssertUnwindSafe(handler.handle(descriptor, context))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(TaskError::handler_panicked(task_type, &panic_message(&*panic))),
        }
    }

    pub fn follow_ups(&self, task_type: &str, descriptor: &Value, result: &Value) -> Result<Vec<Value>> {
        match self.get(task_type) {
            Some(handler) => handler.follow_ups(descriptor, result),
            None => Ok(Vec::new()),
        }
    }

    pub fn validate_descriptor(&self, task_type: &str, descriptor: &Value) -> Result<()> {
        match self.get(task_type) {
            Some(handler) => handler.validate_descriptor(descriptor),
            None => Err(TaskError::unknown_task_type(task_type)),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("task_types", &self.task_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Automator, ErrorType};
    use serde_json::json;

    #[tokio::test]
    async fn test_dispatch_unknown_type() {
        let automator = Automator::empty();
        let error = automator
            .registry()
            .dispatch("missing", json!({}), automator.context())
            .await
            .unwrap_err();

        assert_eq!(error.error_type, ErrorType::UnknownTaskType);
    }

    #[tokio::test]
    async fn test_sync_return_is_resolved_result() {
        let automator = Automator::empty();
        automator
            .registry()
            .register_sync("echo", |descriptor, _context| Ok(descriptor));

        let result = automator
            .registry()
            .dispatch("echo", json!({ "a": 1 }), automator.context())
            .await
            .unwrap();

        assert_eq!(result, json!({ "a": 1 }));
    }

    #[tokio::test]
    async fn test_sync_error_and_async_error_take_same_path() {
        let automator = Automator::empty();
        let registry = automator.registry();
        registry.register_sync("sync_fail", |_, _| Err(TaskError::new("Boom", "sync")));
        registry.register_fn("async_fail", |_, _| async { Err(TaskError::new("Boom", "async")) });

        let sync_error = registry
            .dispatch("sync_fail", json!({}), automator.context())
            .await
            .unwrap_err();
        let async_error = registry
            .dispatch("async_fail", json!({}), automator.context())
            .await
            .unwrap_err();

        assert_eq!(sync_error.error_type, async_error.error_type);
        assert_eq!(sync_error.message, "sync");
        assert_eq!(async_error.message, "async");
    }

    #[tokio::test]
    async fn test_panicking_handler_becomes_error() {
        let automator = Automator::empty();
        automator
            .registry()
            .register_sync("explode", |_, _| panic!("kaboom"));

        let error = automator
            .registry()
            .dispatch("explode", json!({}), automator.context())
            .await
            .unwrap_err();

        assert_eq!(error.error_type, ErrorType::HandlerPanicked);
        assert!(error.message.contains("kaboom"));
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let automator = Automator::empty();
        let registry = automator.registry();
        registry.register_sync("pick", |_, _| Ok(json!("first")));
        registry.register_sync("pick", |_, _| Ok(json!("second")));

        let result = registry
            .dispatch("pick", json!({}), automator.context())
            .await
            .unwrap();

        assert_eq!(result, json!("second"));
        assert_eq!(registry.task_types(), vec!["pick"]);
    }

    #[test]
    fn test_introspection_and_unregister() {
        let registry = HandlerRegistry::new();
        registry.register_sync("b", |_, _| Ok(Value::Null));
        registry.register_sync("a", |_, _| Ok(Value::Null));

        assert_eq!(registry.task_types(), vec!["a", "b"]);
        assert_eq!(registry.handlers().len(), 2);
        assert!(registry.unregister("a").is_some());
        assert!(!registry.contains("a"));
        assert!(registry.get("b").is_some());
    }
}
