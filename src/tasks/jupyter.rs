// ABOUTME: Placeholder handler for the jupyterNotebook task type
// ABOUTME: Accepts the descriptor so existing automation files keep running

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::engine::registry::TaskHandler;
use crate::engine::{Context, Result};

pub struct JupyterNotebookTask;

#[async_trait]
impl TaskHandler for JupyterNotebookTask {
    async fn handle(&self, _descriptor: Value, _context: Context) -> Result<Value> {
        warn!("jupyterNotebook tasks are not supported yet, skipping");
        Ok(Value::Null)
    }
}
