//! Uniform response envelope shared by every service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `{message, statusCode, data}` body returned to callers.
///
/// Internal error text only ever appears inside `data.error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub message: String,
    pub status_code: u16,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Creates an envelope with the given status and an empty message.
    pub fn new(status_code: u16) -> Self {
        Self {
            message: String::new(),
            status_code,
            data: Value::Null,
        }
    }

    /// Sets the human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Builds an error envelope carrying `{"error": <text>}` as data.
    pub fn error(status_code: u16, message: impl Into<String>, error: impl ToString) -> Self {
        Self::new(status_code)
            .with_message(message)
            .with_data(serde_json::json!({ "error": error.to_string() }))
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
