// ABOUTME: Error types for descriptor loading and validation
// ABOUTME: Defines specific error types for parser module operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to read descriptor file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid descriptor format: {0}")]
    InvalidFormat(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Descriptor at '{path}' must be an object")]
    NotAnObject { path: String },

    #[error("Continuation at '{path}' must be a descriptor or a list of descriptors")]
    InvalidContinuation { path: String },

    #[error("Invalid {task_type} descriptor at '{path}': {reason}")]
    InvalidTaskDescriptor {
        path: String,
        task_type: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ParserError>;
