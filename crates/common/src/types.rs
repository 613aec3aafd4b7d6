use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Opaque JSON object exchanged with collaborator services.
pub type Payload = serde_json::Map<String, Value>;

/// Unique identifier for a single saga run.
///
/// Wraps a UUID so run IDs cannot be mixed up with resource identifiers
/// handed back by collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SagaId(Uuid);

impl SagaId {
    /// Creates a new random saga ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a saga ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SagaId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SagaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SagaId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identifier of a resource created by a collaborator service.
///
/// Collaborators answer with either numeric or string IDs; both are kept in
/// their textual form since they are only ever used to build URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extracts an identifier from a JSON value.
    ///
    /// Strings and numbers are accepted; empty strings, `null`, booleans and
    /// nested values yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn saga_id_new_creates_unique_ids() {
        let id1 = SagaId::new();
        let id2 = SagaId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn saga_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = SagaId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn resource_id_accepts_numbers_and_strings() {
        assert_eq!(ResourceId::from_json(&json!(42)), Some(ResourceId::new("42")));
        assert_eq!(
            ResourceId::from_json(&json!("PAY-0001")),
            Some(ResourceId::new("PAY-0001"))
        );
    }

    #[test]
    fn resource_id_rejects_empty_and_structured_values() {
        assert_eq!(ResourceId::from_json(&json!("")), None);
        assert_eq!(ResourceId::from_json(&Value::Null), None);
        assert_eq!(ResourceId::from_json(&json!(true)), None);
        assert_eq!(ResourceId::from_json(&json!({"id": 1})), None);
    }

    #[test]
    fn resource_id_serializes_as_plain_string() {
        let id = ResourceId::new("7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }
}
