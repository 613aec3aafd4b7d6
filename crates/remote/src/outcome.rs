//! Classification of collaborator responses.

use serde_json::Value;

use crate::error::RemoteError;

/// Classified result of a remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome {
    /// Expected status; carries the decoded body.
    Success(Value),
    NotFound,
    Conflict,
    /// Rejected payload (422) with the remote's details.
    Invalid(String),
    ServerFailure { status: u16 },
    Unexpected { status: u16, body: String },
    /// Connection refused, timeout, DNS failure and other transport faults.
    TransientNetworkFailure(String),
}

impl RemoteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RemoteOutcome::Success(_))
    }

    /// Only transport faults are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteOutcome::TransientNetworkFailure(_))
    }

    pub fn into_result(self) -> Result<Value, RemoteError> {
        match self {
            RemoteOutcome::Success(body) => Ok(body),
            RemoteOutcome::NotFound => Err(RemoteError::NotFound),
            RemoteOutcome::Conflict => Err(RemoteError::Conflict),
            RemoteOutcome::Invalid(details) => Err(RemoteError::Validation(details)),
            RemoteOutcome::ServerFailure { status } => Err(RemoteError::Server { status }),
            RemoteOutcome::Unexpected { status, body } => {
                Err(RemoteError::Unexpected { status, body })
            }
            RemoteOutcome::TransientNetworkFailure(reason) => Err(RemoteError::Transient(reason)),
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteOutcome::Success(_) => "success",
            RemoteOutcome::NotFound => "not_found",
            RemoteOutcome::Conflict => "conflict",
            RemoteOutcome::Invalid(_) => "invalid",
            RemoteOutcome::ServerFailure { .. } => "server_failure",
            RemoteOutcome::Unexpected { .. } => "unexpected",
            RemoteOutcome::TransientNetworkFailure(_) => "transient",
        }
    }
}

/// Maps an HTTP response to an outcome.
///
/// With `expected` set, only that exact status is a success; otherwise any
/// 2xx is. A success body is decoded as JSON, `Null` when empty, or kept as
/// a raw string when it is not JSON.
pub fn classify(status: u16, expected: Option<u16>, body: &str) -> RemoteOutcome {
    let is_expected = match expected {
        Some(code) => status == code,
        None => (200..300).contains(&status),
    };

    if is_expected {
        return RemoteOutcome::Success(decode_body(body));
    }

    match status {
        404 => RemoteOutcome::NotFound,
        409 => RemoteOutcome::Conflict,
        422 => RemoteOutcome::Invalid(validation_details(body)),
        s if s >= 500 => RemoteOutcome::ServerFailure { status: s },
        s => RemoteOutcome::Unexpected {
            status: s,
            body: body.to_string(),
        },
    }
}

fn decode_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn validation_details(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => match json.get("errors") {
            Some(Value::String(s)) => s.clone(),
            Some(errors) => errors.to_string(),
            None => "No details".to_string(),
        },
        Err(_) => body.to_string(),
    }
}
