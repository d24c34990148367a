//! The table of registered entity bindings.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, error};

use crate::error::BindingError;

use super::entity_binding::{ActivationHook, EntityBinding};

#[derive(Default)]
struct Table {
    bindings: HashMap<String, Arc<EntityBinding>>,
    hooks: Vec<ActivationHook>,
}

/// Read-mostly registry of entity bindings.
///
/// Bindings are registered at startup, before concurrent traffic begins.
/// Once [`seal`](Self::seal) is called the table is frozen and any further
/// registration is reported as a configuration error.
///
/// # Examples
///
/// ```
/// use helios_multitenant::binding::{BindingRegistry, EntityBinding, EntitySchema};
///
/// let registry = BindingRegistry::new();
/// let items = EntitySchema::new("Item").with_fields(["id", "tenant_id"]);
/// registry.register(EntityBinding::with_default_key(items)).unwrap();
///
/// assert!(registry.get("Item").is_some());
/// assert!(registry.get("Tenant").is_none());
/// ```
#[derive(Default)]
pub struct BindingRegistry {
    table: RwLock<Table>,
    sealed: AtomicBool,
}

impl BindingRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a binding.
    ///
    /// Fails if the foreign key is empty or not a declared field, if the
    /// entity type is already bound, or if the registry is sealed.
    /// Re-registering a type never overwrites the existing binding.
    pub fn register(&self, binding: EntityBinding) -> Result<(), BindingError> {
        let entity_type = binding.entity_type().to_string();

        if self.is_sealed() {
            error!(entity_type = %entity_type, "Binding registered after registry was sealed");
            return Err(BindingError::RegistrySealed { entity_type });
        }

        let key = binding.tenant_foreign_key();
        if key.trim().is_empty() {
            return Err(BindingError::EmptyForeignKey { entity_type });
        }
        if !binding.schema().has_field(key) {
            return Err(BindingError::UnknownField {
                entity_type,
                field: key.to_string(),
            });
        }

        let mut table = self.table.write();
        if let Some(existing) = table.bindings.get(&entity_type) {
            return Err(BindingError::AlreadyBound {
                existing_key: existing.tenant_foreign_key().to_string(),
                requested_key: key.to_string(),
                entity_type,
            });
        }

        debug!(
            entity_type = %entity_type,
            tenant_foreign_key = %key,
            "Registered tenant binding"
        );
        if let Some(hook) = binding.activation_hook() {
            table.hooks.push(Arc::clone(hook));
        }
        table.bindings.insert(entity_type, Arc::new(binding));
        Ok(())
    }

    /// Freezes the registry.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// Returns `true` once the registry has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Looks up the binding of an entity type.
    pub fn get(&self, entity_type: &str) -> Option<Arc<EntityBinding>> {
        self.table.read().bindings.get(entity_type).cloned()
    }

    /// Returns `true` if the entity type is bound.
    pub fn is_bound(&self, entity_type: &str) -> bool {
        self.table.read().bindings.contains_key(entity_type)
    }

    /// Returns the number of bound entity types.
    pub fn len(&self) -> usize {
        self.table.read().bindings.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the activation hooks in registration order.
    pub fn activation_hooks(&self) -> Vec<ActivationHook> {
        self.table.read().hooks.clone()
    }
}

impl std::fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.read();
        let mut types: Vec<&str> = table.bindings.keys().map(String::as_str).collect();
        types.sort_unstable();
        f.debug_struct("BindingRegistry")
            .field("entity_types", &types)
            .field("sealed", &self.is_sealed())
            .finish()
    }
}
