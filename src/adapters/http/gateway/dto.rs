//! Request and response bodies of the gateway endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /trigger`.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerRequest {
    /// Recipient phone number in international format without `+`.
    pub to: String,
    /// Approved template name.
    pub template: String,
    #[serde(default)]
    pub language: Option<String>,
    /// Body parameters, in placeholder order.
    #[serde(default)]
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub message_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Standard error response format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_request_defaults_optional_fields() {
        let request: TriggerRequest =
            serde_json::from_str(r#"{"to":"15551234567","template":"timetable_ready"}"#).unwrap();
        assert!(request.language.is_none());
        assert!(request.parameters.is_empty());
    }

    #[test]
    fn error_response_serializes_code_and_message() {
        let json = serde_json::to_value(ErrorResponse::new("UNAUTHORIZED", "nope")).unwrap();
        assert_eq!(json["error_code"], "UNAUTHORIZED");
        assert_eq!(json["message"], "nope");
    }
}
