//! The ambient tenant of a unit of work.
//!
//! A unit of work is one request, one job run, or one nested block. Each
//! one owns a [`TenantContext`] holding the active tenant, the stack of
//! enclosing activations, the cross-tenant override flag and any extra
//! tenant IDs allowed for reads.
//!
//! # Storage
//!
//! Adapters start every request or job with [`unit_of_work`], which keeps
//! the context in a Tokio task-local. Code running on a plain thread outside
//! a unit of work gets a lazily created per-thread context instead. On a
//! Tokio worker thread outside a unit of work that per-thread context would
//! be shared by unrelated tasks, so writes to it fail with
//! [`ScopeError::DetachedContext`].
//!
//! [`ScopeError::DetachedContext`]: crate::ScopeError::DetachedContext
//!
//! Nested activations made through [`Tenancy::with_tenant`] return a
//! [`Scoped`] future that only installs its frame while being polled, so
//! nesting stays LIFO even across `.await` points, cancellation and
//! concurrent siblings in one task.
//!
//! [`Tenancy::with_tenant`]: crate::Tenancy::with_tenant
//!
//! # Examples
//!
//! ```
//! use helios_multitenant::context::{self, WorkOrigin};
//!
//! let depth = context::unit_of_work_sync(WorkOrigin::request("req-1"), || {
//!     let snapshot = context::snapshot();
//!     assert_eq!(snapshot.origin(), &WorkOrigin::request("req-1"));
//!     snapshot.depth()
//! });
//! assert_eq!(depth, 0);
//! ```

mod origin;
mod scoped;
mod state;
mod storage;

use std::collections::BTreeSet;

pub use origin::WorkOrigin;
pub use scoped::Scoped;
pub use state::TenantContext;
pub use storage::{in_unit_of_work, unit_of_work, unit_of_work_sync};

pub(crate) use scoped::{enter_sync, run_activation, Entry};
pub(crate) use storage::with_state;

use crate::error::{ScopeError, TenancyResult};
use crate::tenant::{TenantHandle, TenantId};

/// Returns the active tenant of the calling unit of work.
pub fn current_tenant() -> Option<TenantHandle> {
    with_state(|state| state.current().cloned())
}

/// Returns the ID of the active tenant of the calling unit of work.
pub fn current_tenant_id() -> Option<TenantId> {
    current_tenant().map(|tenant| tenant.id().clone())
}

/// Returns a copy of the calling unit of work's context.
pub fn snapshot() -> TenantContext {
    with_state(|state| state.clone())
}

/// Records where the calling unit of work came from.
///
/// For frameworks that cannot wrap their work in [`unit_of_work`].
///
/// # Errors
///
/// Returns [`ScopeError::DetachedContext`] on a Tokio runtime thread outside
/// a unit of work.
pub fn set_origin(origin: WorkOrigin) -> TenancyResult<()> {
    ensure_attached("set the work origin")?;
    with_state(|state| state.set_origin(origin));
    Ok(())
}

/// Clears the context of the calling unit of work.
pub fn reset() {
    let _previous = storage::replace(TenantContext::default());
}

/// Fails when a write would land in a per-thread context that other Tokio
/// tasks on this thread share.
pub(crate) fn ensure_attached(operation: &str) -> TenancyResult<()> {
    if storage::on_shared_runtime_thread() {
        tracing::warn!(operation, "Refused tenant context write outside a unit of work");
        return Err(ScopeError::DetachedContext {
            operation: operation.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Options for a nested tenant activation.
#[derive(Debug, Clone, Default)]
pub struct WithTenantOptions {
    extra_tenant_ids: Option<BTreeSet<TenantId>>,
}

impl WithTenantOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes rows of these tenants visible to reads inside the block, in
    /// addition to the active tenant's.
    pub fn extra_tenant_ids<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TenantId>,
    {
        self.extra_tenant_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn into_extra_tenant_ids(self) -> Option<BTreeSet<TenantId>> {
        self.extra_tenant_ids
    }
}
