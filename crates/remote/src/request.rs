use serde_json::Value;

pub use reqwest::Method;

/// A single outbound call description.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    /// Status counted as success; any 2xx when unset.
    pub expected_status: Option<u16>,
}

impl RemoteRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            expected_status: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Only `status` is treated as success; other 2xx become `Unexpected`.
    pub fn expect(mut self, status: u16) -> Self {
        self.expected_status = Some(status);
        self
    }

    /// `"METHOD url"`, used for logging and scripted test routes.
    pub fn target(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}
