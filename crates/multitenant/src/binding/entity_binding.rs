//! Per-entity-type tenant bindings.

use std::fmt;
use std::sync::Arc;

use crate::tenant::Tenant;

use super::schema::EntitySchema;

/// The conventional tenant foreign key column.
pub const DEFAULT_TENANT_FOREIGN_KEY: &str = "tenant_id";

/// Callback invoked with a tenant right after it becomes current.
pub type ActivationHook = Arc<dyn Fn(&dyn Tenant) + Send + Sync>;

/// Links an entity type to its owning tenant through a foreign key field.
///
/// # Examples
///
/// ```
/// use helios_multitenant::binding::{EntityBinding, EntitySchema};
///
/// let users = EntitySchema::new("User").with_fields(["id", "company_id"]);
/// let binding = EntityBinding::new(users, "company_id")
///     .on_activate(|tenant| println!("{} is current", tenant.id()));
///
/// assert_eq!(binding.entity_type(), "User");
/// assert_eq!(binding.tenant_foreign_key(), "company_id");
/// ```
#[derive(Clone)]
pub struct EntityBinding {
    schema: EntitySchema,
    tenant_foreign_key: String,
    on_activate: Option<ActivationHook>,
}

impl EntityBinding {
    /// Binds `schema` to its tenant through `tenant_foreign_key`.
    pub fn new(schema: EntitySchema, tenant_foreign_key: impl Into<String>) -> Self {
        Self {
            schema,
            tenant_foreign_key: tenant_foreign_key.into(),
            on_activate: None,
        }
    }

    /// Binds `schema` through the conventional `tenant_id` field.
    pub fn with_default_key(schema: EntitySchema) -> Self {
        Self::new(schema, DEFAULT_TENANT_FOREIGN_KEY)
    }

    /// Sets a hook invoked whenever a tenant becomes current.
    pub fn on_activate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Tenant) + Send + Sync + 'static,
    {
        self.on_activate = Some(Arc::new(hook));
        self
    }

    /// Returns the bound entity type.
    pub fn entity_type(&self) -> &str {
        self.schema.entity_type()
    }

    /// Returns the declared schema.
    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Returns the field linking entities to their tenant.
    pub fn tenant_foreign_key(&self) -> &str {
        &self.tenant_foreign_key
    }

    /// Returns the activation hook, if any.
    pub fn activation_hook(&self) -> Option<&ActivationHook> {
        self.on_activate.as_ref()
    }
}

impl fmt::Debug for EntityBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityBinding")
            .field("entity_type", &self.entity_type())
            .field("tenant_foreign_key", &self.tenant_foreign_key)
            .field("on_activate", &self.on_activate.is_some())
            .finish()
    }
}
