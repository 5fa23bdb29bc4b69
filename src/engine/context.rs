// ABOUTME: Execution context threaded through one task tree
// ABOUTME: Accumulates named results so later tasks can reference resources created earlier

use serde_json::{Map, Value};

use super::automator::Automator;
use super::task::Task;

/// Named results gathered during a single top-level run.
///
/// Cloning yields an independent scope: writes made on a clone are not seen
/// by the original until the runner folds them back in.
#[derive(Clone)]
pub struct Context {
    values: Map<String, Value>,
    automator: Automator,
}

impl Context {
    pub fn new(automator: Automator) -> Self {
        Self {
            values: Map::new(),
            automator,
        }
    }

    pub fn from_values(automator: Automator, values: Map<String, Value>) -> Self {
        Self { values, automator }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Copy of this context extended with one more entry, for a child scope.
    pub fn with(&self, key: impl Into<String>, value: Value) -> Self {
        let mut child = self.clone();
        child.insert(key, value);
        child
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    pub fn automator(&self) -> &Automator {
        &self.automator
    }

    /// Build a child task that runs in a scope derived from this context.
    pub fn task(&self, descriptor: Value) -> Task {
        Task::new(descriptor, self.clone())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("values", &self.values)
            .finish()
    }
}
