//! Helios Tenant Isolation
//!
//! This crate binds a single current tenant to each in-flight unit of work
//! (a request, a job run, a nested block) and uses it to scope reads and
//! validate writes of tenant-owned entities. A persistence layer plugs it in
//! through [`LifecycleHooks`].
//!
//! # Features
//!
//! - **Ambient context**: Task-local tenant state that never leaks between
//!   concurrent requests, even under `tokio::join!` or cancellation
//! - **Read scoping**: Every query against a bound entity type is restricted
//!   to the current tenant, optionally widened by extra tenant IDs
//! - **Write validation**: New records get the current tenant; records of
//!   other tenants can be neither created nor moved
//! - **Escape hatch**: Explicit, logged cross-tenant blocks for maintenance
//! - **Fail-closed jobs**: Background jobs reading tenant data without a
//!   tenant fail with [`ScopeError::UnscopedBackgroundOperation`]
//!
//! # Architecture
//!
//! - [`tenant`] - Tenant identifiers and the [`Tenant`](tenant::Tenant) trait
//! - [`context`] - Per-unit-of-work tenant state and scoped execution
//! - [`binding`] - Entity bindings and their registry
//! - [`policy`] - The read scope decision and SQL filter rendering
//! - [`guard`] - Pre-create and pre-save validation
//! - [`escape`] - Dangerous cross-tenant blocks
//! - [`telemetry`] - Best-effort violation reporting
//! - [`types`] - The entity field access trait and a JSON record type
//! - [`error`] - Error types for all operations
//! - [`config`] - Isolation configuration
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use helios_multitenant::binding::{EntityBinding, EntitySchema};
//! use helios_multitenant::context::{unit_of_work_sync, WithTenantOptions, WorkOrigin};
//! use helios_multitenant::tenant::{TenantHandle, TenantId};
//! use helios_multitenant::types::{Entity, Record};
//! use helios_multitenant::Tenancy;
//! use serde_json::json;
//!
//! let tenancy = Tenancy::new();
//! let users = EntitySchema::new("User").with_fields(["id", "name", "company_id"]);
//! tenancy.register_binding(EntityBinding::new(users, "company_id")).unwrap();
//! tenancy.seal_bindings();
//!
//! let acme: TenantHandle = Arc::new(TenantId::new("acme"));
//! unit_of_work_sync(WorkOrigin::request("req-1"), || {
//!     tenancy.with_tenant_sync(Some(acme), WithTenantOptions::new(), || {
//!         // Creates are completed with the current tenant
//!         let mut user = Record::new("User").with_field("name", json!("bob"));
//!         tenancy.before_create(&mut user).unwrap();
//!         assert_eq!(user.tenant_key("company_id"), Some(TenantId::new("acme")));
//!
//!         // Reads are restricted to it
//!         let scope = tenancy.read_scope("User").unwrap();
//!         assert!(scope.permits(&user));
//!
//!         // Moving the record elsewhere is rejected
//!         user.set_field("company_id", json!("globex"));
//!         assert!(tenancy.before_save(&user).unwrap_err().is_access_violation());
//!     });
//! });
//! ```
//!
//! # Background Jobs
//!
//! Jobs are wrapped in a unit of work with a background origin. Reading a
//! bound entity type there without a tenant is an error rather than a
//! silent cross-tenant read:
//!
//! ```
//! use helios_multitenant::binding::EntitySchema;
//! use helios_multitenant::context::{unit_of_work_sync, WorkOrigin};
//! use helios_multitenant::Tenancy;
//!
//! let tenancy = Tenancy::new();
//! tenancy.bind(EntitySchema::new("Item").with_fields(["tenant_id"])).unwrap();
//!
//! let result = unit_of_work_sync(WorkOrigin::background_job("exports"), || {
//!     tenancy.read_scope("Item")
//! });
//! assert!(result.unwrap_err().is_unscoped_background_operation());
//!
//! // Unless the job explicitly opts into cross-tenant work
//! let result = unit_of_work_sync(WorkOrigin::background_job("exports"), || {
//!     tenancy.dangerous_cross_tenants_sync(|| tenancy.read_scope("Item"))
//! });
//! assert!(result.unwrap().filter().is_none());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod binding;
pub mod config;
pub mod context;
pub mod error;
pub mod escape;
pub mod guard;
pub mod policy;
pub mod telemetry;
pub mod tenancy;
pub mod tenant;
pub mod types;

// Re-export commonly used types
pub use config::IsolationConfig;
pub use error::{AccessError, BindingError, ScopeError, TenancyError, TenancyResult};
pub use tenancy::{LifecycleHooks, Tenancy, TenancyBuilder};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helios_multitenant={}", level)));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
