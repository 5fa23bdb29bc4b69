// ABOUTME: Loading of task descriptors from YAML or JSON files
// ABOUTME: Produces an ordered serde_json object ready for the automator

use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs;

use super::error::{ParserError, Result};
use crate::engine::task::json_kind;

#[derive(Debug, Clone, Default)]
pub struct DescriptorParser;

impl DescriptorParser {
    pub fn new() -> Self {
        Self
    }

    pub async fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Value> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(ParserError::IoError)?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            let value: Value = serde_json::from_str(&content)?;
            Self::check_root(value)
        } else {
            self.parse_string(&content)
        }
    }

    /// Parse YAML (and therefore JSON) text. An empty document is `{}`.
    pub fn parse_string(&self, content: &str) -> Result<Value> {
        if content.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        let value: Value = serde_yaml::from_str(content)?;
        Self::check_root(value)
    }

    fn check_root(value: Value) -> Result<Value> {
        match value {
            Value::Object(_) => Ok(value),
            Value::Null => Ok(Value::Object(Map::new())),
            other => Err(ParserError::InvalidFormat(format!(
                "descriptor root must be a mapping, got {}",
                json_kind(&other)
            ))),
        }
    }
}
