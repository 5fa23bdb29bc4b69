// ABOUTME: Normalization of collaborator failures into TaskError
// ABOUTME: Maps HTTP statuses, server error bodies and transport errors to one shape

use serde_json::Value;

use crate::engine::{ErrorType, TaskError};

/// Code used when no HTTP status is available.
pub const TRANSPORT_ERROR_CODE: i64 = -1;

pub struct ErrorFormatter;

impl ErrorFormatter {
    /// Build an error from a failed HTTP response.
    ///
    /// 404, 403 and 502 map to fixed types. Otherwise a JSON body carrying a
    /// `type` is passed through, and remaining 4xx become `ClientError`.
    pub fn from_status(status: u16, body: &str) -> TaskError {
        let data: Option<Value> = serde_json::from_str(body).ok().filter(Value::is_object);
        let server_message = data.as_ref().and_then(server_message);

        let (error_type, default_message) = match status {
            404 => (ErrorType::NotFound, "Resource not found".to_string()),
            403 => (ErrorType::Forbidden, "Permission denied".to_string()),
            502 => (ErrorType::BadGateway, "Server is unreachable".to_string()),
            _ => match data
                .as_ref()
                .and_then(|d| d.get("type"))
                .and_then(Value::as_str)
            {
                Some(server_type) => (
                    ErrorType::from(server_type),
                    format!("Request failed with status {}", status),
                ),
                None if (400..500).contains(&status) => (
                    ErrorType::ClientError,
                    format!("Request rejected with status {}", status),
                ),
                None => (
                    ErrorType::Other("ServerError".to_string()),
                    format!("Server failed with status {}", status),
                ),
            },
        };

        let error = TaskError::new(error_type, server_message.unwrap_or(default_message))
            .with_code(i64::from(status));

        match data {
            Some(data) => error.with_data(data),
            None => error,
        }
    }

    pub fn from_transport(error: &reqwest::Error) -> TaskError {
        match error.status() {
            Some(status) => Self::from_status(status.as_u16(), ""),
            None => Self::from_error(error),
        }
    }

    /// Wrap any other failure, keeping its message.
    pub fn from_error(error: &dyn std::error::Error) -> TaskError {
        TaskError::new(ErrorType::Other("Error".to_string()), error.to_string())
            .with_code(TRANSPORT_ERROR_CODE)
    }
}

fn server_message(data: &Value) -> Option<String> {
    ["reason", "message", "detail"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixed_status_mappings() {
        assert_eq!(ErrorFormatter::from_status(404, "").error_type, ErrorType::NotFound);
        assert_eq!(ErrorFormatter::from_status(403, "").error_type, ErrorType::Forbidden);
        assert_eq!(ErrorFormatter::from_status(502, "").error_type, ErrorType::BadGateway);
        assert_eq!(ErrorFormatter::from_status(404, "").code, 404);
    }

    #[test]
    fn test_client_error_without_body() {
        let error = ErrorFormatter::from_status(400, "not json");
        assert_eq!(error.error_type, ErrorType::ClientError);
        assert_eq!(error.code, 400);
        assert!(error.data.is_none());
    }

    #[test]
    fn test_server_type_and_reason_pass_through() {
        let body = json!({ "type": "DuplicateTitle", "reason": "title already used" }).to_string();
        let error = ErrorFormatter::from_status(409, &body);

        assert_eq!(error.error_type, ErrorType::Other("DuplicateTitle".to_string()));
        assert_eq!(error.message, "title already used");
        assert_eq!(error.data.unwrap()["reason"], "title already used");
    }

    #[test]
    fn test_reason_kept_on_fixed_mapping() {
        let body = json!({ "reason": "collab 4 is gone" }).to_string();
        let error = ErrorFormatter::from_status(404, &body);

        assert_eq!(error.error_type, ErrorType::NotFound);
        assert_eq!(error.message, "collab 4 is gone");
    }

    #[test]
    fn test_unknown_server_failure() {
        let error = ErrorFormatter::from_status(500, "");
        assert_eq!(error.error_type, ErrorType::Other("ServerError".to_string()));
    }

    #[test]
    fn test_from_error_uses_transport_code() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error = ErrorFormatter::from_error(&io);
        assert_eq!(error.code, TRANSPORT_ERROR_CODE);
        assert_eq!(error.message, "refused");
    }
}
