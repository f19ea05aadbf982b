use serde::Serialize;
use std::fmt::Display;

/// Outer envelope for operation results.
///
/// Serializes as `{"success": true, ...payload}` on success and as
/// `{"success": false, "error": "..."}` on failure. Payloads must serialize
/// as JSON objects.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ToolResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Display) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }

    pub fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e),
        }
    }
}
