//! Execution-local storage for [`TenantContext`].
//!
//! Inside a unit of work the context lives in a Tokio task-local, so tasks
//! never share it. Outside of one, each thread lazily gets its own cell.
//! On a Tokio runtime thread that cell is shared by every task scheduled
//! there, so the crate refuses to write tenant state into it.

use std::cell::RefCell;
use std::future::Future;

use tracing::Instrument;

use super::origin::WorkOrigin;
use super::state::TenantContext;

tokio::task_local! {
    static TASK_CONTEXT: RefCell<TenantContext>;
}

thread_local! {
    static THREAD_CONTEXT: RefCell<TenantContext> = RefCell::new(TenantContext::default());
}

/// Returns `true` when running inside [`unit_of_work`] or [`unit_of_work_sync`].
pub fn in_unit_of_work() -> bool {
    TASK_CONTEXT.try_with(|_| ()).is_ok()
}

/// Returns `true` when the calling code would fall back to a per-thread cell
/// that other Tokio tasks on this thread also see.
pub(crate) fn on_shared_runtime_thread() -> bool {
    !in_unit_of_work() && tokio::runtime::Handle::try_current().is_ok()
}

/// Runs `f` against the context of the calling unit of work.
///
/// `f` must not call back into the context, so it must not run caller code
/// (tenant or entity methods, hooks) or emit `tracing` events.
pub(crate) fn with_state<R>(f: impl FnOnce(&mut TenantContext) -> R) -> R {
    if in_unit_of_work() {
        TASK_CONTEXT.with(|cell| f(&mut cell.borrow_mut()))
    } else {
        THREAD_CONTEXT.with(|cell| f(&mut cell.borrow_mut()))
    }
}

/// Swaps the whole context, returning the previous one.
pub(crate) fn replace(state: TenantContext) -> TenantContext {
    with_state(|current| std::mem::replace(current, state))
}

/// A context installed for the duration of one poll.
///
/// Dropping the guard without calling [`restore`](Installed::restore) still
/// puts the outer context back, so a panicking body cannot leak its tenant.
pub(crate) struct Installed {
    outer: Option<TenantContext>,
}

impl Installed {
    pub(crate) fn new(state: TenantContext) -> Self {
        Self {
            outer: Some(replace(state)),
        }
    }

    /// Puts the outer context back and returns the installed one.
    pub(crate) fn restore(mut self) -> TenantContext {
        match self.outer.take() {
            Some(outer) => replace(outer),
            None => TenantContext::default(),
        }
    }
}

impl Drop for Installed {
    fn drop(&mut self) {
        if let Some(outer) = self.outer.take() {
            replace(outer);
        }
    }
}

/// Runs `body` as its own unit of work with a fresh tenant context.
///
/// Web and job adapters wrap each request or job run in this. Tasks spawned
/// from `body` start with no context of their own; hand them a tenant
/// explicitly.
///
/// # Examples
///
/// ```
/// use helios_multitenant::context::{current_tenant, unit_of_work, WorkOrigin};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let tenant = unit_of_work(WorkOrigin::background_job("mailers"), async {
///     current_tenant()
/// })
/// .await;
/// assert!(tenant.is_none());
/// # }
/// ```
pub async fn unit_of_work<F>(origin: WorkOrigin, body: F) -> F::Output
where
    F: Future,
{
    let span = tracing::debug_span!("unit_of_work", origin = %origin);
    TASK_CONTEXT
        .scope(RefCell::new(TenantContext::new(origin)), body)
        .instrument(span)
        .await
}

/// Synchronous form of [`unit_of_work`].
pub fn unit_of_work_sync<R>(origin: WorkOrigin, body: impl FnOnce() -> R) -> R {
    let _span = tracing::debug_span!("unit_of_work", origin = %origin).entered();
    TASK_CONTEXT.sync_scope(RefCell::new(TenantContext::new(origin)), body)
}
