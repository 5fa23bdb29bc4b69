// ABOUTME: Collab task creating the container and its initial navigation
// ABOUTME: Nested `nav` entries become follow-up tasks that the runner executes once the collab exists

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::{parse_descriptor, to_value, COLLAB, NAV};
use crate::engine::registry::TaskHandler;
use crate::engine::task::json_kind;
use crate::engine::{ensure_parameters, Context, Result, TaskError};
use crate::services::{CollabService, NewCollab};

pub struct CollabTask {
    collabs: Arc<dyn CollabService>,
}

#[derive(Debug, Deserialize)]
struct CollabDescriptor {
    title: String,
    #[serde(default, alias = "description")]
    content: String,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    nav: Option<Value>,
}

impl CollabTask {
    pub fn new(collabs: Arc<dyn CollabService>) -> Self {
        Self { collabs }
    }
}

/// The `nav` field as a list of nav descriptors, each an object.
fn nav_entries(descriptor: &Value) -> Result<Vec<Value>> {
    let entries = match descriptor.get(NAV) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items.clone(),
        Some(entry) => vec![entry.clone()],
    };

    for entry in &entries {
        if !entry.is_object() {
            return Err(TaskError::invalid_descriptor(format!(
                "collab nav entries must be objects, got {}",
                json_kind(entry)
            )));
        }
    }
    Ok(entries)
}

#[async_trait]
impl TaskHandler for CollabTask {
    async fn handle(&self, descriptor: Value, _context: Context) -> Result<Value> {
        ensure_parameters(&descriptor, &["title"])?;
        let parsed: CollabDescriptor = parse_descriptor(COLLAB, &descriptor)?;
        nav_entries(&descriptor)?;

        info!("Creating collab '{}'", parsed.title);
        let collab = self
            .collabs
            .create(&NewCollab {
                title: parsed.title,
                content: parsed.content,
                private: parsed.private,
            })
            .await?;

        to_value(&collab)
    }

    fn validate_descriptor(&self, descriptor: &Value) -> Result<()> {
        ensure_parameters(descriptor, &["title"])?;
        for entry in nav_entries(descriptor)? {
            ensure_parameters(&entry, &["app", "name"])?;
        }
        Ok(())
    }

    /// One `nav` task per entry, pointed at the collab just created.
    fn follow_ups(&self, descriptor: &Value, result: &Value) -> Result<Vec<Value>> {
        let collab_id = result.get("id").cloned().unwrap_or(Value::Null);

        Ok(nav_entries(descriptor)?
            .into_iter()
            .map(|mut entry| {
                if let Some(fields) = entry.as_object_mut() {
                    fields.entry(COLLAB).or_insert_with(|| collab_id.clone());
                }
                json!({ NAV: entry })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> CollabTask {
        struct Unused;

        #[async_trait]
        impl CollabService for Unused {
            async fn create(&self, _collab: &NewCollab) -> Result<crate::services::Collab> {
                Err(TaskError::new("Unexpected", "create should not be called"))
            }
        }

        CollabTask::new(Arc::new(Unused))
    }

    #[test]
    fn test_follow_ups_carry_collab_id() {
        let descriptor = json!({
            "title": "t",
            "nav": [
                {"app": "Wiki", "name": "Home"},
                {"app": "Files", "name": "Storage", "collab": 5}
            ]
        });

        let follow_ups = task().follow_ups(&descriptor, &json!({"id": 11})).unwrap();

        assert_eq!(
            follow_ups,
            vec![
                json!({"nav": {"app": "Wiki", "name": "Home", "collab": 11}}),
                json!({"nav": {"app": "Files", "name": "Storage", "collab": 5}})
            ]
        );
    }

    #[test]
    fn test_single_nav_object_is_one_follow_up() {
        let descriptor = json!({"title": "t", "nav": {"app": "Wiki", "name": "Home"}});

        let follow_ups = task().follow_ups(&descriptor, &json!({"id": 3})).unwrap();
        assert_eq!(follow_ups.len(), 1);
        assert_eq!(follow_ups[0]["nav"]["collab"], 3);
    }

    #[test]
    fn test_rejects_non_object_nav_entries() {
        let error = task()
            .validate_descriptor(&json!({"title": "t", "nav": ["Home"]}))
            .unwrap_err();

        assert_eq!(error.error_type, crate::engine::ErrorType::InvalidDescriptor);
    }
}
