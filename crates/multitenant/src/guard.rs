//! Write validation for bound entity types.
//!
//! Both checks are no-ops when no tenant is current, so maintenance code
//! running outside any tenant can still write.
//!
//! Callers pass a snapshot of the context. Nothing here borrows the ambient
//! cell, so entity implementations may read the current tenant.

use serde_json::Value;
use tracing::warn;

use crate::binding::EntityBinding;
use crate::context::TenantContext;
use crate::error::AccessError;
use crate::tenant::TenantId;
use crate::types::Entity;

/// Validates a new entity before it is persisted.
///
/// An unset tenant key (absent, `null` or `""`) is filled with the current
/// tenant. A key naming the current tenant is accepted. Any other tenant,
/// and any value that cannot name a tenant, is rejected.
pub fn before_create(
    binding: &EntityBinding,
    context: &TenantContext,
    entity: &mut dyn Entity,
) -> Result<(), AccessError> {
    let Some(active) = context.current_id() else {
        return Ok(());
    };

    let key = binding.tenant_foreign_key();
    let requested = match entity.field(key) {
        Some(value) if !is_unset(value) => match TenantId::from_value(value) {
            Some(id) => Some(id),
            None => {
                warn!(
                    entity_type = %binding.entity_type(),
                    tenant_id = %active,
                    field = %key,
                    value = %value,
                    "Rejected create with a malformed tenant key"
                );
                return Err(AccessError::InvalidTenantKey {
                    entity_type: binding.entity_type().to_string(),
                    field: key.to_string(),
                    value: value.to_string(),
                });
            }
        },
        _ => None,
    };

    match requested {
        None => {
            entity.set_field(key, active.to_value());
            Ok(())
        }
        Some(requested) if &requested == active => Ok(()),
        Some(requested) => {
            warn!(
                entity_type = %binding.entity_type(),
                tenant_id = %active,
                requested_tenant = %requested,
                "Rejected create for a foreign tenant"
            );
            Err(AccessError::ForeignTenantOnCreate {
                entity_type: binding.entity_type().to_string(),
                active: active.clone(),
                requested,
            })
        }
    }
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Validates an existing entity before an update is persisted.
///
/// The tenant key must still name the current tenant. This blocks moving a
/// record to another tenant directly or by reassigning its owner.
pub fn before_save(
    binding: &EntityBinding,
    context: &TenantContext,
    entity: &dyn Entity,
) -> Result<(), AccessError> {
    let Some(active) = context.current_id() else {
        return Ok(());
    };

    let found = entity.tenant_key(binding.tenant_foreign_key());
    if found.as_ref() == Some(active) {
        return Ok(());
    }

    warn!(
        entity_type = %binding.entity_type(),
        tenant_id = %active,
        found_tenant = ?found,
        "Rejected save outside the current tenant"
    );
    Err(AccessError::TenantReassignment {
        entity_type: binding.entity_type().to_string(),
        active: active.clone(),
        found,
    })
}
