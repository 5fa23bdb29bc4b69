// ABOUTME: Entry point of the engine, owning the shared handler registry
// ABOUTME: Builds root tasks and fresh contexts for independent top-level runs

use serde_json::Value;
use std::sync::Arc;

use super::context::Context;
use super::error::Outcome;
use super::registry::HandlerRegistry;
use super::task::Task;
use crate::services::Services;
use crate::tasks;

/// Cheap handle to a handler registry; clone it wherever tasks are built.
#[derive(Clone, Debug)]
pub struct Automator {
    registry: Arc<HandlerRegistry>,
}

impl Automator {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// Automator with no handlers registered.
    pub fn empty() -> Self {
        Self::new(Arc::new(HandlerRegistry::new()))
    }

    /// Automator with the built-in collab, nav, storage, overview and
    /// jupyterNotebook handlers wired to `services`.
    pub fn with_services(services: Services) -> Self {
        let registry = HandlerRegistry::new();
        tasks::register_builtin_tasks(&registry, &services);
        Self::new(Arc::new(registry))
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn context(&self) -> Context {
        Context::new(self.clone())
    }

    /// Build a root task with a fresh context. Nothing runs until [`Task::run`].
    pub fn task(&self, descriptor: Value) -> Task {
        Task::new(descriptor, self.context())
    }

    pub fn task_with_context(&self, descriptor: Value, context: Context) -> Task {
        Task::new(descriptor, context)
    }

    pub async fn run(&self, descriptor: Value) -> Outcome {
        self.task(descriptor).run().await
    }
}
