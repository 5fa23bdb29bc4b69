// ABOUTME: Collaborator interfaces consumed by the built-in task handlers
// ABOUTME: Collab, navigation, storage and application lookup services plus shared types

pub mod error;
pub mod rest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::Result;

pub use error::ErrorFormatter;
pub use rest::{RestConfig, RestServices};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collab {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCollab {
    pub title: String,
    pub content: String,
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub collab_id: i64,
    #[serde(default)]
    pub app_id: Option<i64>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    /// Stable identifier linking storage entities to this item.
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub order_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub entity_type: String,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityLocator {
    Uuid(String),
    /// Storage root of a collab.
    Collab(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub id: i64,
    pub title: String,
}

#[async_trait]
pub trait CollabService: Send + Sync {
    async fn create(&self, collab: &NewCollab) -> Result<Collab>;
}

#[async_trait]
pub trait NavService: Send + Sync {
    async fn get_root(&self, collab_id: i64) -> Result<NavNode>;
    async fn add_node(&self, collab_id: i64, node: &NavNode) -> Result<NavNode>;
    async fn save_node(&self, collab_id: i64, node: &NavNode) -> Result<NavNode>;
}

#[async_trait]
pub trait StorageService: Send + Sync {
    async fn get_entity(&self, locator: &EntityLocator) -> Result<Entity>;
    async fn copy(&self, source_uuid: &str, destination_uuid: &str) -> Result<Entity>;
    async fn get_content(&self, uuid: &str) -> Result<String>;
    async fn set_context_metadata(&self, entity: &Entity, node: &NavNode) -> Result<()>;
}

#[async_trait]
pub trait AppService: Send + Sync {
    /// Exactly one application whose title matches.
    async fn find_one(&self, title: &str) -> Result<App>;
}

/// One implementation of every collaborator, handed to the built-in handlers.
#[derive(Clone)]
pub struct Services {
    pub collab: Arc<dyn CollabService>,
    pub nav: Arc<dyn NavService>,
    pub storage: Arc<dyn StorageService>,
    pub apps: Arc<dyn AppService>,
}

impl Services {
    pub fn from_rest(rest: Arc<RestServices>) -> Self {
        Self {
            collab: rest.clone(),
            nav: rest.clone(),
            storage: rest.clone(),
            apps: rest,
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
