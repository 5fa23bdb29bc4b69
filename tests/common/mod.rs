// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides spy handlers, in-memory collaborators and descriptor file helpers

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::fs;

use collab_automator::engine::{Context, HandlerRegistry, Result, TaskError};
use collab_automator::services::{
    App, AppService, Collab, CollabService, Entity, EntityLocator, NavNode, NavService, NewCollab,
    Services, StorageService,
};

/// Records every invocation of a handler: its descriptor, the context it saw
/// and the order it was called in across all spies sharing a journal.
#[derive(Clone)]
pub struct Spy {
    name: String,
    response: Value,
    calls: Arc<Mutex<Vec<(Value, Value)>>>,
    journal: Arc<Mutex<Vec<String>>>,
}

impl Spy {
    pub fn new(name: &str, response: Value, journal: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            response,
            calls: Arc::new(Mutex::new(Vec::new())),
            journal: journal.clone(),
        }
    }

    pub fn register(&self, registry: &HandlerRegistry) {
        let spy = self.clone();
        registry.register_fn(self.name.clone(), move |descriptor, context: Context| {
            let spy = spy.clone();
            async move {
                // Yield so ordering assertions would catch overlapping runs.
                tokio::task::yield_now().await;
                spy.journal.lock().unwrap().push(spy.name.clone());
                spy.calls
                    .lock()
                    .unwrap()
                    .push((descriptor, context.to_value()));
                Ok(spy.response.clone())
            }
        });
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn descriptor(&self, index: usize) -> Value {
        self.calls.lock().unwrap()[index].0.clone()
    }

    pub fn context(&self, index: usize) -> Value {
        self.calls.lock().unwrap()[index].1.clone()
    }
}

pub fn journal() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

/// In-memory stand-in for every collaborator service.
#[derive(Default)]
pub struct MockServices {
    pub calls: AtomicUsize,
    pub apps: Mutex<Vec<App>>,
    pub nav_children: Mutex<Vec<NavNode>>,
    pub added_nodes: Mutex<Vec<NavNode>>,
    pub saved_nodes: Mutex<Vec<NavNode>>,
    pub copies: Mutex<Vec<(String, String)>>,
    pub metadata: Mutex<Vec<(String, Option<String>)>>,
    pub created: Mutex<Vec<NewCollab>>,
}

impl MockServices {
    pub fn new() -> Arc<Self> {
        let mock = Self::default();
        *mock.apps.lock().unwrap() = vec![
            App {
                id: 7,
                title: "Test".to_string(),
            },
            App {
                id: 8,
                title: "Overview".to_string(),
            },
        ];
        Arc::new(mock)
    }

    pub fn services(self: &Arc<Self>) -> Services {
        Services {
            collab: self.clone(),
            nav: self.clone(),
            storage: self.clone(),
            apps: self.clone(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CollabService for MockServices {
    async fn create(&self, collab: &NewCollab) -> Result<Collab> {
        self.touch();
        self.created.lock().unwrap().push(collab.clone());
        Ok(Collab {
            id: 11,
            title: collab.title.clone(),
            content: collab.content.clone(),
            private: collab.private,
        })
    }
}

#[async_trait]
impl NavService for MockServices {
    async fn get_root(&self, collab_id: i64) -> Result<NavNode> {
        self.touch();
        Ok(NavNode {
            id: Some(100),
            name: "root".to_string(),
            collab_id,
            app_id: None,
            parent_id: None,
            context: None,
            order_index: None,
            content: None,
            children: self.nav_children.lock().unwrap().clone(),
        })
    }

    async fn add_node(&self, collab_id: i64, node: &NavNode) -> Result<NavNode> {
        self.touch();
        let mut added = self.added_nodes.lock().unwrap();
        let mut created = node.clone();
        created.id = Some(200 + added.len() as i64);
        created.collab_id = collab_id;
        added.push(created.clone());
        Ok(created)
    }

    async fn save_node(&self, _collab_id: i64, node: &NavNode) -> Result<NavNode> {
        self.touch();
        self.saved_nodes.lock().unwrap().push(node.clone());
        Ok(node.clone())
    }
}

#[async_trait]
impl StorageService for MockServices {
    async fn get_entity(&self, locator: &EntityLocator) -> Result<Entity> {
        self.touch();
        let uuid = match locator {
            EntityLocator::Uuid(uuid) => uuid.clone(),
            EntityLocator::Collab(id) => format!("project-{}", id),
        };
        Ok(Entity {
            uuid: uuid.clone(),
            name: uuid,
            entity_type: "folder".to_string(),
            parent: None,
        })
    }

    async fn copy(&self, source_uuid: &str, destination_uuid: &str) -> Result<Entity> {
        self.touch();
        self.copies
            .lock()
            .unwrap()
            .push((source_uuid.to_string(), destination_uuid.to_string()));
        Ok(Entity {
            uuid: format!("copy-of-{}", source_uuid),
            name: source_uuid.to_string(),
            entity_type: "file".to_string(),
            parent: Some(destination_uuid.to_string()),
        })
    }

    async fn get_content(&self, uuid: &str) -> Result<String> {
        self.touch();
        Ok(format!("<h1>{}</h1>", uuid))
    }

    async fn set_context_metadata(&self, entity: &Entity, node: &NavNode) -> Result<()> {
        self.touch();
        self.metadata
            .lock()
            .unwrap()
            .push((entity.uuid.clone(), node.context.clone()));
        Ok(())
    }
}

#[async_trait]
impl AppService for MockServices {
    async fn find_one(&self, title: &str) -> Result<App> {
        self.touch();
        let matches: Vec<App> = self
            .apps
            .lock()
            .unwrap()
            .iter()
            .filter(|app| app.title == title)
            .cloned()
            .collect();
        match matches.len() {
            0 => Err(TaskError::not_found(format!("No application titled '{}'", title))),
            1 => Ok(matches[0].clone()),
            _ => Err(TaskError::too_many_results(format!(
                "More than one application titled '{}'",
                title
            ))),
        }
    }
}

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub async fn write_descriptor(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, content).await.unwrap();
        path
    }
}
