//! Nested activation for synchronous blocks and futures.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tracing::{debug, warn};

use crate::binding::ActivationHook;
use crate::tenant::{TenantHandle, TenantId};

use super::state::TenantContext;
use super::storage::{self, Installed};

/// What a nested block changes about the context while it runs.
#[derive(Clone)]
pub(crate) struct Entry {
    tenant: Option<TenantHandle>,
    extra_tenant_ids: Option<BTreeSet<TenantId>>,
    allow_dangerous: Option<bool>,
    hooks: Vec<ActivationHook>,
}

impl Entry {
    /// Enters `tenant`, optionally widening reads to `extra_tenant_ids`.
    pub(crate) fn tenant(
        tenant: Option<TenantHandle>,
        extra_tenant_ids: Option<BTreeSet<TenantId>>,
        hooks: Vec<ActivationHook>,
    ) -> Self {
        Self {
            tenant,
            extra_tenant_ids,
            allow_dangerous: None,
            hooks,
        }
    }

    /// Leaves every tenant and sets the cross-tenant override.
    pub(crate) fn dangerous_cross_tenants() -> Self {
        Self {
            tenant: None,
            extra_tenant_ids: None,
            allow_dangerous: Some(true),
            hooks: Vec::new(),
        }
    }

    fn push_onto(&self, state: &mut TenantContext) {
        state.push(
            self.tenant.clone(),
            self.extra_tenant_ids.as_ref(),
            self.allow_dangerous,
        );
    }

    /// Logs entries into a dangerous block. Runs before the block is applied
    /// so the suspended tenant is still visible.
    fn audit(&self) {
        if self.allow_dangerous != Some(true) {
            return;
        }
        let snapshot = storage::with_state(|state| state.clone());
        warn!(
            suspended_tenant = ?snapshot.current_id(),
            origin = %snapshot.origin(),
            depth = snapshot.depth(),
            "Entering dangerous cross-tenant block"
        );
    }

    fn activate(&self) {
        if let Some(tenant) = &self.tenant {
            run_activation(tenant, &self.hooks);
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("tenant", &self.tenant.as_ref().map(|t| t.id()))
            .field("extra_tenant_ids", &self.extra_tenant_ids)
            .field("allow_dangerous", &self.allow_dangerous)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Invokes the tenant's own hook, then every binding hook in order.
pub(crate) fn run_activation(tenant: &TenantHandle, hooks: &[ActivationHook]) {
    debug!(tenant_id = %tenant.id(), hooks = hooks.len(), "Tenant became current");
    tenant.became_current_tenant();
    for hook in hooks {
        hook(tenant.as_ref());
    }
}

/// Runs `body` with `entry` applied, restoring the previous state on every exit.
pub(crate) fn enter_sync<R>(entry: Entry, body: impl FnOnce() -> R) -> R {
    entry.audit();
    storage::with_state(|state| entry.push_onto(state));
    let _restore = PopOnDrop;
    entry.activate();
    body()
}

struct PopOnDrop;

impl Drop for PopOnDrop {
    fn drop(&mut self) {
        if !storage::with_state(TenantContext::pop) {
            warn!("Tenant context restore without a matching activation");
        }
    }
}

enum Stage {
    Pending(Entry),
    Entered(TenantContext),
    Done,
}

/// A future that runs its body under a nested tenant context.
///
/// The nested context is derived from the surrounding one on first poll,
/// not when the future is built, and is only installed while the body is being polled. Between polls it is
/// parked inside this future, so sibling futures in the same task (for
/// example under `tokio::join!`) never observe it, and dropping the future
/// mid-flight leaves the surrounding context exactly as it was.
#[must_use = "futures do nothing unless polled"]
pub struct Scoped<F: Future> {
    stage: Stage,
    body: Pin<Box<F>>,
}

impl<F: Future> Scoped<F> {
    pub(crate) fn new(entry: Entry, body: F) -> Self {
        Self {
            stage: Stage::Pending(entry),
            body: Box::pin(body),
        }
    }
}

impl<F: Future> Future for Scoped<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let (state, entering) = match std::mem::replace(&mut this.stage, Stage::Done) {
            Stage::Pending(entry) => {
                entry.audit();
                let state = storage::with_state(|outer| {
                    let mut nested = outer.clone();
                    entry.push_onto(&mut nested);
                    nested
                });
                (state, Some(entry))
            }
            Stage::Entered(state) => (state, None),
            Stage::Done => panic!("`Scoped` polled after completion"),
        };

        let installed = Installed::new(state);
        if let Some(entry) = entering {
            entry.activate();
        }
        let poll = this.body.as_mut().poll(cx);
        let state = installed.restore();

        match poll {
            Poll::Ready(output) => Poll::Ready(output),
            Poll::Pending => {
                this.stage = Stage::Entered(state);
                Poll::Pending
            }
        }
    }
}

impl<F: Future> fmt::Debug for Scoped<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match &self.stage {
            Stage::Pending(_) => "pending",
            Stage::Entered(_) => "entered",
            Stage::Done => "done",
        };
        f.debug_struct("Scoped").field("stage", &stage).finish()
    }
}
