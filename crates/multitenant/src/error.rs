//! Error types for tenant isolation.
//!
//! The hierarchy separates write rejections ([`AccessError`]), read-scope
//! failures ([`ScopeError`]) and startup configuration mistakes
//! ([`BindingError`]). None of them are retried or suppressed by this crate;
//! they propagate unchanged to the caller.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::tenant::TenantId;

/// The primary error type for tenancy operations.
#[derive(Error, Debug)]
pub enum TenancyError {
    /// A write would cross tenant boundaries.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// A read could not be scoped.
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// An entity binding is invalid.
    #[error(transparent)]
    Binding(#[from] BindingError),
}

impl TenancyError {
    /// Returns `true` if a write was rejected for crossing tenants.
    pub fn is_access_violation(&self) -> bool {
        matches!(self, TenancyError::Access(_))
    }

    /// Returns `true` if an unattended job read tenant data without a tenant.
    pub fn is_unscoped_background_operation(&self) -> bool {
        matches!(
            self,
            TenancyError::Scope(ScopeError::UnscopedBackgroundOperation { .. })
        )
    }

    /// Returns `true` if tenant state was written where other tasks would see it.
    pub fn is_detached_context(&self) -> bool {
        matches!(self, TenancyError::Scope(ScopeError::DetachedContext { .. }))
    }

    /// Returns `true` if this is a binding configuration error.
    pub fn is_binding_error(&self) -> bool {
        matches!(self, TenancyError::Binding(_))
    }
}

/// Writes rejected because they would move data across tenants.
///
/// Always fatal to the write in question; the record is never persisted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// A new record names a tenant other than the current one.
    #[error(
        "access violation: cannot create {entity_type} owned by tenant {requested} while tenant {active} is current"
    )]
    ForeignTenantOnCreate {
        entity_type: String,
        active: TenantId,
        requested: TenantId,
    },

    /// An existing record does not (or no longer does) belong to the current tenant.
    #[error(
        "access violation: cannot save {entity_type} owned by {} while tenant {active} is current",
        found.as_ref().map(TenantId::as_str).unwrap_or("no tenant")
    )]
    TenantReassignment {
        entity_type: String,
        active: TenantId,
        found: Option<TenantId>,
    },

    /// The tenant key holds a value that cannot name a tenant.
    #[error("access violation: {entity_type}.{field} holds {value}, which is not a tenant ID")]
    InvalidTenantKey {
        entity_type: String,
        field: String,
        value: String,
    },
}

/// Errors raised while deciding the read scope of a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// A background job queried tenant data with no tenant and no override.
    #[error(
        "unscoped background operation: {entity_type} queried from job queue '{queue}' without a current tenant"
    )]
    UnscopedBackgroundOperation {
        entity_type: String,
        queue: String,
        job_id: Option<String>,
    },

    /// Tenant state written on a Tokio worker thread outside a unit of work.
    #[error("cannot {operation} outside a unit of work on a shared runtime thread")]
    DetachedContext { operation: String },
}

/// Invalid entity bindings, raised at registration time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// The binding names no foreign key.
    #[error("binding for {entity_type} has an empty tenant foreign key")]
    EmptyForeignKey { entity_type: String },

    /// The foreign key is not a field of the entity type.
    #[error("binding for {entity_type} references unknown field '{field}'")]
    UnknownField { entity_type: String, field: String },

    /// The entity type already has a binding.
    #[error(
        "{entity_type} is already bound through '{existing_key}', cannot bind it again through '{requested_key}'"
    )]
    AlreadyBound {
        entity_type: String,
        existing_key: String,
        requested_key: String,
    },

    /// Registration attempted after the registry was sealed.
    #[error("binding registry is sealed, cannot register {entity_type}")]
    RegistrySealed { entity_type: String },
}

/// Result type for tenancy operations.
pub type TenancyResult<T> = Result<T, TenancyError>;
