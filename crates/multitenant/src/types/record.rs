//! A JSON-object backed entity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::Entity;

/// A generic entity record: a type name, an ID and a map of fields.
///
/// Any store that keeps rows as JSON objects can hand these to the
/// lifecycle hooks directly.
///
/// # Examples
///
/// ```
/// use helios_multitenant::types::{Entity, Record};
/// use serde_json::json;
///
/// let user = Record::new("User")
///     .with_field("name", json!("bob"))
///     .with_field("company_id", json!(1));
///
/// assert_eq!(user.entity_type(), "User");
/// assert_eq!(user.tenant_key("company_id").unwrap().as_str(), "1");
/// assert!(!user.id().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    entity_type: String,
    id: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl Record {
    /// Creates an empty record with a generated ID.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: uuid::Uuid::new_v4().to_string(),
            fields: Map::new(),
        }
    }

    /// Replaces the generated ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets a field.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Returns the record ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns all fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl Entity for Record {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}
