// ABOUTME: Nav task adding an application entry to a collab's navigation tree
// ABOUTME: Optionally links a previously copied storage entity to the new entry

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{context_entity, parse_descriptor, resolve_collab_id, to_value, NAV};
use crate::engine::registry::TaskHandler;
use crate::engine::{ensure_parameters, Context, Result};
use crate::services::{AppService, NavNode, NavService, StorageService};

pub struct NavTask {
    nav: Arc<dyn NavService>,
    apps: Arc<dyn AppService>,
    storage: Arc<dyn StorageService>,
}

#[derive(Debug, Deserialize)]
struct NavDescriptor {
    app: String,
    name: String,
    #[serde(default)]
    entity: Option<String>,
    #[serde(default)]
    order_index: Option<i64>,
}

impl NavTask {
    pub fn new(
        nav: Arc<dyn NavService>,
        apps: Arc<dyn AppService>,
        storage: Arc<dyn StorageService>,
    ) -> Self {
        Self { nav, apps, storage }
    }
}

#[async_trait]
impl TaskHandler for NavTask {
    async fn handle(&self, descriptor: Value, context: Context) -> Result<Value> {
        ensure_parameters(&descriptor, &["app", "name"])?;
        let parsed: NavDescriptor = parse_descriptor(NAV, &descriptor)?;
        let collab_id = resolve_collab_id(&descriptor, &context)?;
        let entity = match &parsed.entity {
            Some(name) => Some(context_entity(&context, name)?),
            None => None,
        };

        let app = self.apps.find_one(&parsed.app).await?;
        let root = self.nav.get_root(collab_id).await?;

        info!("Adding '{}' ({}) to collab {}", parsed.name, app.title, collab_id);
        let node = NavNode {
            id: None,
            name: parsed.name,
            collab_id,
            app_id: Some(app.id),
            parent_id: root.id,
            context: Some(Uuid::new_v4().to_string()),
            order_index: parsed.order_index,
            content: None,
            children: Vec::new(),
        };
        let created = self.nav.add_node(collab_id, &node).await?;

        if let Some(entity) = entity {
            self.storage.set_context_metadata(&entity, &created).await?;
        }

        to_value(&created)
    }

    fn validate_descriptor(&self, descriptor: &Value) -> Result<()> {
        ensure_parameters(descriptor, &["app", "name"])
    }
}
