//! The owning identity that partitions data visibility.

use std::fmt;
use std::sync::Arc;

use super::id::TenantId;

/// An identity that can become the current tenant of a unit of work.
///
/// Implementors are usually loaded by the caller from their own storage
/// (an organization row, a customer account). The tenancy core only keeps
/// references to them and never creates or destroys them.
///
/// # Examples
///
/// ```
/// use helios_multitenant::tenant::{Tenant, TenantId};
///
/// #[derive(Debug)]
/// struct Company {
///     id: TenantId,
///     name: String,
/// }
///
/// impl Tenant for Company {
///     fn id(&self) -> &TenantId {
///         &self.id
///     }
/// }
/// ```
pub trait Tenant: Send + Sync + fmt::Debug {
    /// Returns the stable identifier of this tenant.
    fn id(&self) -> &TenantId;

    /// Called after this tenant became the current tenant and before any
    /// scoped work runs.
    fn became_current_tenant(&self) {}
}

/// Shared reference to a tenant identity.
pub type TenantHandle = Arc<dyn Tenant>;

impl Tenant for TenantId {
    fn id(&self) -> &TenantId {
        self
    }
}

/// Returns `true` if both handles refer to the same tenant.
pub fn same_tenant(a: &dyn Tenant, b: &dyn Tenant) -> bool {
    a.id() == b.id()
}
