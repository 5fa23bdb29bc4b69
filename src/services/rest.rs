// ABOUTME: REST-backed implementation of every collaborator service
// ABOUTME: Talks to the collab and document APIs with reqwest and a bearer token

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::ErrorFormatter;
use super::{
    App, AppService, Collab, CollabService, Entity, EntityLocator, NavNode, NavService, NewCollab,
    StorageService,
};
use crate::engine::{Result, TaskError};

#[derive(Debug, Clone)]
pub struct RestConfig {
    pub collab_api_url: Url,
    pub document_api_url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    Collab,
    Document,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

pub struct RestServices {
    client: Client,
    config: RestConfig,
}

impl RestServices {
    pub fn new(config: RestConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ErrorFormatter::from_transport(&e))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// Absolute URL of `path` under the base URL of `api`.
    pub fn endpoint(&self, api: Api, path: &str) -> Result<Url> {
        let base = match api {
            Api::Collab => &self.config.collab_api_url,
            Api::Document => &self.config.document_api_url,
        };
        join(base, path)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ErrorFormatter::from_transport(&e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ErrorFormatter::from_status(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ErrorFormatter::from_transport(&e))
    }

    /// Collect every page of a paginated listing by following `next` links.
    async fn get_all<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(url);

        while let Some(url) = next.take() {
            debug!("Fetching page {}", url);
            let page: Page<T> = self.send_json(self.request(Method::GET, url.clone())).await?;
            items.extend(page.results);

            visited.insert(url.clone());
            next = next_page(&url, page.next.as_deref(), &visited)?;
        }

        Ok(items)
    }
}

/// Resolve a `next` link against the current page. A page already fetched ends the listing.
fn next_page(current: &Url, link: Option<&str>, visited: &HashSet<Url>) -> Result<Option<Url>> {
    let Some(link) = link else {
        return Ok(None);
    };
    let next = current.join(link).map_err(|e| configuration_error(link, e))?;
    if visited.contains(&next) {
        debug!("Pagination loops back to {}, stopping", next);
        return Ok(None);
    }
    Ok(Some(next))
}

fn join(base: &Url, path: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
        .map_err(|e| configuration_error(path, e))
}

fn configuration_error(path: &str, error: url::ParseError) -> TaskError {
    TaskError::new("ConfigurationError", format!("Invalid URL '{}': {}", path, error))
}

#[async_trait]
impl CollabService for RestServices {
    async fn create(&self, collab: &NewCollab) -> Result<Collab> {
        let url = self.endpoint(Api::Collab, "collab/")?;
        self.send_json(self.request(Method::POST, url).json(collab)).await
    }
}

#[async_trait]
impl NavService for RestServices {
    async fn get_root(&self, collab_id: i64) -> Result<NavNode> {
        let url = self.endpoint(Api::Collab, &format!("collab/{}/nav/root/", collab_id))?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn add_node(&self, collab_id: i64, node: &NavNode) -> Result<NavNode> {
        let url = self.endpoint(Api::Collab, &format!("collab/{}/nav/", collab_id))?;
        self.send_json(self.request(Method::POST, url).json(node)).await
    }

    async fn save_node(&self, collab_id: i64, node: &NavNode) -> Result<NavNode> {
        let node_id = node
            .id
            .ok_or_else(|| TaskError::invalid_descriptor("cannot save a navigation item without id"))?;
        let url = self.endpoint(Api::Collab, &format!("collab/{}/nav/{}/", collab_id, node_id))?;
        self.send_json(self.request(Method::PUT, url).json(node)).await
    }
}

#[async_trait]
impl StorageService for RestServices {
    async fn get_entity(&self, locator: &EntityLocator) -> Result<Entity> {
        match locator {
            EntityLocator::Uuid(uuid) => {
                let url = self.endpoint(Api::Document, &format!("entity/{}/", uuid))?;
                self.send_json(self.request(Method::GET, url)).await
            }
            EntityLocator::Collab(collab_id) => {
                let mut url = self.endpoint(Api::Document, "project/")?;
                url.query_pairs_mut()
                    .append_pair("collab_id", &collab_id.to_string());
                self.get_all::<Entity>(url)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        TaskError::not_found(format!("No storage project for collab {}", collab_id))
                    })
            }
        }
    }

    async fn copy(&self, source_uuid: &str, destination_uuid: &str) -> Result<Entity> {
        let url = self.endpoint(Api::Document, &format!("file/{}/copy/", source_uuid))?;
        let body = serde_json::json!({ "parent": destination_uuid });
        self.send_json(self.request(Method::POST, url).json(&body)).await
    }

    async fn get_content(&self, uuid: &str) -> Result<String> {
        let url = self.endpoint(Api::Document, &format!("file/{}/content/", uuid))?;
        self.send(self.request(Method::GET, url))
            .await?
            .text()
            .await
            .map_err(|e| ErrorFormatter::from_transport(&e))
    }

    async fn set_context_metadata(&self, entity: &Entity, node: &NavNode) -> Result<()> {
        let context = node.context.as_deref().ok_or_else(|| {
            TaskError::invalid_descriptor(format!("navigation item '{}' has no context", node.name))
        })?;
        let url = self.endpoint(Api::Document, &format!("file/{}/metadata/", entity.uuid))?;
        let mut body = serde_json::Map::new();
        body.insert(format!("ctx_{}", context), serde_json::Value::from("1"));
        self.send(self.request(Method::POST, url).json(&body)).await?;
        Ok(())
    }
}

#[async_trait]
impl AppService for RestServices {
    async fn find_one(&self, title: &str) -> Result<App> {
        let mut url = self.endpoint(Api::Collab, "extension/")?;
        url.query_pairs_mut().append_pair("search", title);

        let mut matches: Vec<App> = self
            .get_all::<App>(url)
            .await?
            .into_iter()
            .filter(|app| app.title == title)
            .collect();

        match matches.len() {
            0 => Err(TaskError::not_found(format!("No application titled '{}'", title))),
            1 => Ok(matches.remove(0)),
            n => Err(TaskError::too_many_results(format!(
                "{} applications titled '{}'",
                n, title
            ))),
        }
    }
}
