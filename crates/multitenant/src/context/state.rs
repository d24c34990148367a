//! Per-unit-of-work tenant state.

use std::collections::BTreeSet;

use crate::tenant::{TenantHandle, TenantId};

use super::origin::WorkOrigin;

/// State saved by a nested activation and put back when it exits.
#[derive(Debug, Clone)]
struct SavedFrame {
    current: Option<TenantHandle>,
    extra_tenant_ids: Option<BTreeSet<TenantId>>,
    allow_dangerous_cross_tenant: bool,
}

/// The ambient tenant state of one unit of work.
///
/// Every concurrently executing unit of work owns exactly one of these.
/// Entity code only ever sees copies obtained from
/// [`snapshot`](crate::context::snapshot); all mutation goes through the
/// context operations of this crate.
#[derive(Debug, Clone, Default)]
pub struct TenantContext {
    current: Option<TenantHandle>,
    extra_tenant_ids: Option<BTreeSet<TenantId>>,
    allow_dangerous_cross_tenant: bool,
    restore_stack: Vec<SavedFrame>,
    origin: WorkOrigin,
}

impl TenantContext {
    /// Creates an empty context for work started from `origin`.
    pub fn new(origin: WorkOrigin) -> Self {
        Self {
            origin,
            ..Default::default()
        }
    }

    /// Returns the active tenant.
    pub fn current(&self) -> Option<&TenantHandle> {
        self.current.as_ref()
    }

    /// Returns the ID of the active tenant.
    pub fn current_id(&self) -> Option<&TenantId> {
        self.current.as_ref().map(|t| t.id())
    }

    /// Returns the additional tenant IDs treated as current for reads.
    pub fn extra_tenant_ids(&self) -> Option<&BTreeSet<TenantId>> {
        self.extra_tenant_ids.as_ref()
    }

    /// Returns `true` inside a dangerous cross-tenant block.
    pub fn allows_dangerous_cross_tenant(&self) -> bool {
        self.allow_dangerous_cross_tenant
    }

    /// Returns where this unit of work came from.
    pub fn origin(&self) -> &WorkOrigin {
        &self.origin
    }

    /// Returns the number of enclosing nested activations.
    pub fn depth(&self) -> usize {
        self.restore_stack.len()
    }

    /// Replaces the current tenant, returning the previous one so the caller
    /// can drop it after releasing the context.
    pub(crate) fn set_current(&mut self, tenant: Option<TenantHandle>) -> Option<TenantHandle> {
        std::mem::replace(&mut self.current, tenant)
    }

    pub(crate) fn set_origin(&mut self, origin: WorkOrigin) {
        self.origin = origin;
    }

    /// Saves the current frame and enters a nested one.
    ///
    /// `extra` is merged into the inherited extra IDs; `None` keeps them.
    /// `allow_dangerous` overrides the escape-hatch flag when given.
    pub(crate) fn push(
        &mut self,
        tenant: Option<TenantHandle>,
        extra: Option<&BTreeSet<TenantId>>,
        allow_dangerous: Option<bool>,
    ) {
        self.restore_stack.push(SavedFrame {
            current: self.current.take(),
            extra_tenant_ids: self.extra_tenant_ids.clone(),
            allow_dangerous_cross_tenant: self.allow_dangerous_cross_tenant,
        });

        self.current = tenant;
        if let Some(extra) = extra {
            let merged = self
                .extra_tenant_ids
                .get_or_insert_with(BTreeSet::new);
            merged.extend(extra.iter().cloned());
        }
        if let Some(flag) = allow_dangerous {
            self.allow_dangerous_cross_tenant = flag;
        }
    }

    /// Restores the frame saved by the matching [`push`](Self::push).
    ///
    /// Returns `false` if there was nothing to restore.
    pub(crate) fn pop(&mut self) -> bool {
        match self.restore_stack.pop() {
            Some(frame) => {
                self.current = frame.current;
                self.extra_tenant_ids = frame.extra_tenant_ids;
                self.allow_dangerous_cross_tenant = frame.allow_dangerous_cross_tenant;
                true
            }
            None => false,
        }
    }
}
