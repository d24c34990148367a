//! Declared shape of an entity type.

use std::collections::BTreeSet;

/// The fields an entity type declares.
///
/// Bindings are validated against this at registration time so that a
/// misspelled foreign key fails at startup instead of at query time.
///
/// # Examples
///
/// ```
/// use helios_multitenant::binding::EntitySchema;
///
/// let users = EntitySchema::new("User").with_fields(["id", "name", "company_id"]);
/// assert!(users.has_field("company_id"));
/// assert!(!users.has_field("tenant_id"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    entity_type: String,
    fields: BTreeSet<String>,
}

impl EntitySchema {
    /// Creates a schema with no fields.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields: BTreeSet::new(),
        }
    }

    /// Adds fields to the schema.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Returns the entity type name.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns `true` if the field is declared.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    /// Returns the declared fields in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}
