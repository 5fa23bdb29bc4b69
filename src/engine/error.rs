// ABOUTME: Error types for task automation and handler dispatch
// ABOUTME: Defines the uniform {type, message, code, data} failure shared by every layer

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Classification carried in the `type` field of a [`TaskError`].
///
/// Server-supplied types that do not match a known variant are kept verbatim
/// in [`ErrorType::Other`] so callers can still branch on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorType {
    MissingParameter,
    UnknownTaskType,
    InvalidDescriptor,
    HandlerPanicked,
    NotFound,
    Forbidden,
    BadGateway,
    ClientError,
    TooManyResults,
    Other(String),
}

impl ErrorType {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorType::MissingParameter => "MissingParameter",
            ErrorType::UnknownTaskType => "UnknownTaskType",
            ErrorType::InvalidDescriptor => "InvalidDescriptor",
            ErrorType::HandlerPanicked => "HandlerPanicked",
            ErrorType::NotFound => "NotFound",
            ErrorType::Forbidden => "Forbidden",
            ErrorType::BadGateway => "BadGateway",
            ErrorType::ClientError => "ClientError",
            ErrorType::TooManyResults => "TooManyResults",
            ErrorType::Other(other) => other,
        }
    }
}

impl From<String> for ErrorType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "MissingParameter" => ErrorType::MissingParameter,
            "UnknownTaskType" => ErrorType::UnknownTaskType,
            "InvalidDescriptor" => ErrorType::InvalidDescriptor,
            "HandlerPanicked" => ErrorType::HandlerPanicked,
            "NotFound" => ErrorType::NotFound,
            "Forbidden" => ErrorType::Forbidden,
            "BadGateway" => ErrorType::BadGateway,
            "ClientError" => ErrorType::ClientError,
            "TooManyResults" => ErrorType::TooManyResults,
            _ => ErrorType::Other(value),
        }
    }
}

impl From<&str> for ErrorType {
    fn from(value: &str) -> Self {
        ErrorType::from(value.to_string())
    }
}

impl From<ErrorType> for String {
    fn from(value: ErrorType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure propagated unchanged from handlers to the caller.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{error_type}: {message}")]
pub struct TaskError {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub message: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl TaskError {
    pub fn new(error_type: impl Into<ErrorType>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            code: 0,
            data: None,
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn missing_parameter(parameter: &str) -> Self {
        Self::new(
            ErrorType::MissingParameter,
            format!("Missing parameter: {}", parameter),
        )
        .with_data(serde_json::json!({ "parameter": parameter }))
    }

    pub fn unknown_task_type(task_type: &str) -> Self {
        Self::new(
            ErrorType::UnknownTaskType,
            format!("No handler registered for task type '{}'", task_type),
        )
        .with_data(serde_json::json!({ "task_type": task_type }))
    }

    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        Self::new(ErrorType::InvalidDescriptor, message)
    }

    pub fn handler_panicked(task_type: &str, message: &str) -> Self {
        Self::new(
            ErrorType::HandlerPanicked,
            format!("Handler '{}' panicked: {}", task_type, message),
        )
        .with_data(serde_json::json!({ "task_type": task_type }))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorType::NotFound, message).with_code(404)
    }

    pub fn too_many_results(message: impl Into<String>) -> Self {
        Self::new(ErrorType::TooManyResults, message)
    }

    pub fn is_type(&self, error_type: &ErrorType) -> bool {
        &self.error_type == error_type
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;

/// Settled outcome of a task. The error is shared so every layer that
/// reports it hands back the very same value.
pub type Outcome = std::result::Result<Value, Arc<TaskError>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serializes_uniform_shape() {
        let error = TaskError::missing_parameter("name");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["type"], "MissingParameter");
        assert_eq!(json["message"], "Missing parameter: name");
        assert_eq!(json["code"], 0);
        assert_eq!(json["data"]["parameter"], "name");
    }

    #[test]
    fn test_unknown_type_passthrough() {
        let error: TaskError = serde_json::from_value(serde_json::json!({
            "type": "QuotaExceeded",
            "message": "too many collabs",
            "code": 429
        }))
        .unwrap();

        assert_eq!(error.error_type, ErrorType::Other("QuotaExceeded".to_string()));
        assert_eq!(error.code, 429);
        assert!(error.data.is_none());
        assert_eq!(error.to_string(), "QuotaExceeded: too many collabs");
    }

    #[test]
    fn test_known_types_round_trip_through_strings() {
        assert_eq!(ErrorType::from("NotFound"), ErrorType::NotFound);
        assert_eq!(String::from(ErrorType::TooManyResults), "TooManyResults");
        assert!(TaskError::not_found("gone").is_type(&ErrorType::NotFound));
    }
}
