// ABOUTME: Overview task configuring a collab's landing page
// ABOUTME: Points the overview entry at an application or at a copied entity's content

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::{context_entity, parse_descriptor, resolve_collab_id, to_value, OVERVIEW};
use crate::engine::registry::TaskHandler;
use crate::engine::{ensure_any_parameter, Context, Result, TaskError};
use crate::services::{AppService, NavService, StorageService};

pub struct OverviewTask {
    nav: Arc<dyn NavService>,
    apps: Arc<dyn AppService>,
    storage: Arc<dyn StorageService>,
}

#[derive(Debug, Deserialize)]
struct OverviewDescriptor {
    #[serde(default)]
    app: Option<String>,
    #[serde(default)]
    entity: Option<String>,
}

impl OverviewTask {
    pub fn new(
        nav: Arc<dyn NavService>,
        apps: Arc<dyn AppService>,
        storage: Arc<dyn StorageService>,
    ) -> Self {
        Self { nav, apps, storage }
    }
}

#[async_trait]
impl TaskHandler for OverviewTask {
    async fn handle(&self, descriptor: Value, context: Context) -> Result<Value> {
        ensure_any_parameter(&descriptor, &["app", "entity"])?;
        let parsed: OverviewDescriptor = parse_descriptor(OVERVIEW, &descriptor)?;
        let collab_id = resolve_collab_id(&descriptor, &context)?;
        let entity = match &parsed.entity {
            Some(name) => Some(context_entity(&context, name)?),
            None => None,
        };

        let root = self.nav.get_root(collab_id).await?;
        // The landing page is the first child of the navigation root.
        let mut overview = root
            .children
            .into_iter()
            .enumerate()
            .min_by_key(|(position, node)| (node.order_index.unwrap_or(i64::MAX), *position))
            .map(|(_, node)| node)
            .ok_or_else(|| TaskError::not_found(format!("Collab {} has no overview page", collab_id)))?;

        if let Some(title) = &parsed.app {
            let app = self.apps.find_one(title).await?;
            info!("Setting overview of collab {} to {}", collab_id, app.title);
            overview.app_id = Some(app.id);
        }
        if let Some(entity) = &entity {
            info!("Setting overview of collab {} from {}", collab_id, entity.name);
            overview.content = Some(self.storage.get_content(&entity.uuid).await?);
        }

        let saved = self.nav.save_node(collab_id, &overview).await?;

        if let Some(entity) = &entity {
            self.storage.set_context_metadata(entity, &saved).await?;
        }

        to_value(&saved)
    }

    fn validate_descriptor(&self, descriptor: &Value) -> Result<()> {
        ensure_any_parameter(descriptor, &["app", "entity"])
    }
}
