// ABOUTME: Storage task copying existing entities into a collab's storage
// ABOUTME: Result maps each descriptor name to the copied entity

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

use super::{parse_descriptor, resolve_collab_id, to_value, STORAGE};
use crate::engine::registry::TaskHandler;
use crate::engine::{ensure_parameters, Context, Result};
use crate::services::{EntityLocator, StorageService};

pub struct StorageTask {
    storage: Arc<dyn StorageService>,
}

#[derive(Debug, Deserialize)]
struct StorageDescriptor {
    /// Name under which the copy is exposed, mapped to the source UUID.
    entities: IndexMap<String, String>,
}

impl StorageTask {
    pub fn new(storage: Arc<dyn StorageService>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl TaskHandler for StorageTask {
    async fn handle(&self, descriptor: Value, context: Context) -> Result<Value> {
        ensure_parameters(&descriptor, &["entities"])?;
        let parsed: StorageDescriptor = parse_descriptor(STORAGE, &descriptor)?;
        let collab_id = resolve_collab_id(&descriptor, &context)?;

        let root = self
            .storage
            .get_entity(&EntityLocator::Collab(collab_id))
            .await?;

        let mut copied = Map::new();
        for (name, source_uuid) in parsed.entities {
            info!("Copying {} into {} as '{}'", source_uuid, root.name, name);
            let entity = self.storage.copy(&source_uuid, &root.uuid).await?;
            copied.insert(name, to_value(&entity)?);
        }

        Ok(Value::Object(copied))
    }

    fn validate_descriptor(&self, descriptor: &Value) -> Result<()> {
        ensure_parameters(descriptor, &["entities"])?;
        parse_descriptor::<StorageDescriptor>(STORAGE, descriptor).map(|_| ())
    }
}
