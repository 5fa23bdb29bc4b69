// ABOUTME: Built-in task handlers for provisioning a collab
// ABOUTME: Registers collab, nav, storage, overview and jupyterNotebook with a registry

pub mod collab;
pub mod jupyter;
pub mod nav;
pub mod overview;
pub mod storage;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::engine::{Context, HandlerRegistry, Result, TaskError};
use crate::services::{Entity, Services};

pub const COLLAB: &str = "collab";
pub const NAV: &str = "nav";
pub const STORAGE: &str = "storage";
pub const OVERVIEW: &str = "overview";
pub const JUPYTER_NOTEBOOK: &str = "jupyterNotebook";

pub fn register_builtin_tasks(registry: &HandlerRegistry, services: &Services) {
    registry.register(COLLAB, collab::CollabTask::new(services.collab.clone()));
    registry.register(
        NAV,
        nav::NavTask::new(
            services.nav.clone(),
            services.apps.clone(),
            services.storage.clone(),
        ),
    );
    registry.register(STORAGE, storage::StorageTask::new(services.storage.clone()));
    registry.register(
        OVERVIEW,
        overview::OverviewTask::new(
            services.nav.clone(),
            services.apps.clone(),
            services.storage.clone(),
        ),
    );
    registry.register(JUPYTER_NOTEBOOK, jupyter::JupyterNotebookTask);
}

pub(crate) fn parse_descriptor<T: DeserializeOwned>(task_type: &str, descriptor: &Value) -> Result<T> {
    serde_json::from_value(descriptor.clone()).map_err(|e| {
        TaskError::invalid_descriptor(format!("Invalid {} descriptor: {}", task_type, e))
    })
}

pub(crate) fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| TaskError::new("SerializationError", e.to_string()))
}

/// Collab id from `descriptor.collab` (an id or an object with `id`), falling
/// back to the collab created earlier in the run.
pub(crate) fn resolve_collab_id(descriptor: &Value, context: &Context) -> Result<i64> {
    descriptor
        .get(COLLAB)
        .and_then(collab_id)
        .or_else(|| context.get(COLLAB).and_then(collab_id))
        .ok_or_else(|| TaskError::missing_parameter(COLLAB))
}

fn collab_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(id) => id.as_i64(),
        Value::Object(collab) => collab.get("id").and_then(Value::as_i64),
        _ => None,
    }
}

/// Entity copied under `name` by a storage task earlier in the run.
pub(crate) fn context_entity(context: &Context, name: &str) -> Result<Entity> {
    let value = context
        .get(STORAGE)
        .and_then(|entities| entities.get(name))
        .ok_or_else(|| {
            TaskError::not_found(format!("Entity '{}' was not created by a storage task", name))
        })?;

    parse_descriptor(STORAGE, value)
}
