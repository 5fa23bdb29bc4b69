// ABOUTME: Configuration management for collab-automator
// ABOUTME: Handles loading and merging configuration from files and environment variables

use anyhow::{bail, Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::services::RestConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_collab_api_url")]
    pub collab_api_url: String,

    #[serde(default = "default_document_api_url")]
    pub document_api_url: String,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => bail!("Unknown log format '{}' (expected pretty or compact)", other),
        }
    }
}

fn default_collab_api_url() -> String {
    "https://services.humanbrainproject.eu/collab/v0/".to_string()
}

fn default_document_api_url() -> String {
    "https://services.humanbrainproject.eu/storage/v1/api/".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collab_api_url: default_collab_api_url(),
            document_api_url: default_document_api_url(),
            token: None,
            request_timeout: default_request_timeout(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Invalid configuration in {}", config_path.display()))?
        } else {
            Config::default()
        };

        config.merge_env()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".collab-automator").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        let candidates = [
            "automator.yaml",
            "automator.yml",
            ".automator.yaml",
            ".automator.yml",
        ];
        for candidate in candidates {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return path;
            }
        }

        // Default path (may not exist)
        PathBuf::from("automator.yaml")
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("AUTOMATOR_COLLAB_API_URL") {
            self.collab_api_url = url;
        }
        if let Ok(url) = std::env::var("AUTOMATOR_DOCUMENT_API_URL") {
            self.document_api_url = url;
        }
        if let Ok(token) = std::env::var("AUTOMATOR_TOKEN") {
            self.token = Some(token);
        }
        if let Ok(level) = std::env::var("AUTOMATOR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("AUTOMATOR_LOG_FORMAT") {
            self.logging.format = format
                .parse()
                .context("Invalid AUTOMATOR_LOG_FORMAT")?;
        }
        Ok(())
    }

    /// Settings for the REST collaborators
    pub fn rest_config(&self) -> Result<RestConfig> {
        Ok(RestConfig {
            collab_api_url: Url::parse(&self.collab_api_url)
                .with_context(|| format!("Invalid collab API URL '{}'", self.collab_api_url))?,
            document_api_url: Url::parse(&self.document_api_url)
                .with_context(|| format!("Invalid document API URL '{}'", self.document_api_url))?,
            token: self.token.clone(),
            timeout: self.request_timeout,
        })
    }
}
