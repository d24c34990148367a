//! Field access the persistence layer provides for tenant-owned entities.

use serde_json::Value;

use crate::tenant::TenantId;

/// An entity instance whose fields can be read and written by name.
///
/// This is the only view the tenancy core has of an entity: it reads the
/// tenant foreign key before queries are filtered and before writes are
/// committed, and writes it when filling in a new record's tenant.
pub trait Entity {
    /// Returns the entity type this instance belongs to.
    fn entity_type(&self) -> &str;

    /// Returns the value of a field, or `None` when the field is absent.
    fn field(&self, name: &str) -> Option<&Value>;

    /// Sets the value of a field.
    fn set_field(&mut self, name: &str, value: Value);

    /// Reads a field as a tenant ID.
    ///
    /// Absent, null and empty fields yield `None`, as do values that cannot
    /// name a tenant.
    fn tenant_key(&self, name: &str) -> Option<TenantId> {
        self.field(name).and_then(TenantId::from_value)
    }
}
