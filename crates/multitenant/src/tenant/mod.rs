//! Tenant identity types.
//!
//! - [`TenantId`] - Opaque identifier compared against tenant foreign keys
//! - [`Tenant`] - An identity that can be activated for a unit of work
//! - [`TenantHandle`] - Shared reference held by the tenant context
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use helios_multitenant::tenant::{same_tenant, TenantHandle, TenantId};
//!
//! let a: TenantHandle = Arc::new(TenantId::new("acme"));
//! let b = TenantId::new("acme");
//! assert!(same_tenant(a.as_ref(), &b));
//! ```

mod id;
mod identity;

pub use id::TenantId;
pub use identity::{same_tenant, Tenant, TenantHandle};
