//! Read scoping.
//!
//! [`decide`] is a pure function of a binding and a [`TenantContext`]
//! snapshot. It is evaluated fresh for every query:
//!
//! 1. A current tenant restricts reads to its rows, plus the rows of any
//!    extra tenant IDs in effect.
//! 2. Otherwise the dangerous cross-tenant override leaves reads unfiltered.
//! 3. Otherwise the read is unscoped. Unattended work is denied; interactive
//!    work is tolerated and reported, on the assumption that an outer
//!    authorization layer already constrained visibility.

use std::fmt;

use crate::binding::EntityBinding;
use crate::context::{TenantContext, WorkOrigin};
use crate::tenant::TenantId;
use crate::types::Entity;

/// Restriction of a query to a set of owning tenants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantFilter {
    column: String,
    tenant_ids: Vec<TenantId>,
}

impl TenantFilter {
    /// Builds a filter on `column`. The current tenant comes first, extra
    /// IDs follow in sorted order without duplicates.
    pub fn new<'a>(
        column: impl Into<String>,
        current: &TenantId,
        extra: impl IntoIterator<Item = &'a TenantId>,
    ) -> Self {
        let mut tenant_ids = vec![current.clone()];
        for id in extra {
            if !tenant_ids.contains(id) {
                tenant_ids.push(id.clone());
            }
        }
        tenant_ids[1..].sort();
        Self {
            column: column.into(),
            tenant_ids,
        }
    }

    /// Returns the foreign key column being filtered.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the allowed tenant IDs.
    pub fn tenant_ids(&self) -> &[TenantId] {
        &self.tenant_ids
    }

    /// Returns `true` if the ID is allowed.
    pub fn allows(&self, tenant_id: &TenantId) -> bool {
        self.tenant_ids.contains(tenant_id)
    }

    /// Evaluates the filter against an entity in memory.
    ///
    /// Entities with no tenant never match.
    pub fn matches(&self, entity: &dyn Entity) -> bool {
        entity
            .tenant_key(&self.column)
            .is_some_and(|id| self.allows(&id))
    }

    /// Renders the filter as a WHERE clause fragment with positional
    /// placeholders starting at `$first_placeholder`.
    ///
    /// # Examples
    ///
    /// ```
    /// use helios_multitenant::policy::TenantFilter;
    /// use helios_multitenant::tenant::TenantId;
    ///
    /// let extra = [TenantId::new("b")];
    /// let filter = TenantFilter::new("company_id", &TenantId::new("a"), &extra);
    /// let predicate = filter.to_sql(Some("u"), 3);
    /// assert_eq!(predicate.clause, "u.company_id IN ($3, $4)");
    /// assert_eq!(predicate.params, vec![TenantId::new("a"), TenantId::new("b")]);
    /// ```
    pub fn to_sql(&self, table_alias: Option<&str>, first_placeholder: usize) -> SqlPredicate {
        let column = match table_alias {
            Some(alias) => format!("{}.{}", alias, self.column),
            None => self.column.clone(),
        };

        let clause = if self.tenant_ids.len() == 1 {
            format!("{} = ${}", column, first_placeholder)
        } else {
            let placeholders: Vec<String> = (0..self.tenant_ids.len())
                .map(|i| format!("${}", first_placeholder + i))
                .collect();
            format!("{} IN ({})", column, placeholders.join(", "))
        };

        SqlPredicate {
            clause,
            params: self.tenant_ids.clone(),
        }
    }
}

/// A rendered SQL predicate and its bind values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlPredicate {
    /// The WHERE clause fragment.
    pub clause: String,
    /// Values for the placeholders, in order.
    pub params: Vec<TenantId>,
}

/// Why a read was left unfiltered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfilteredReason {
    /// The entity type has no tenant binding.
    NotBound,
    /// Inside an explicit dangerous cross-tenant block.
    DangerousCrossTenant,
    /// No tenant was active in an interactive unit of work.
    NoActiveTenant,
}

impl fmt::Display for UnfilteredReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnfilteredReason::NotBound => write!(f, "not_bound"),
            UnfilteredReason::DangerousCrossTenant => write!(f, "dangerous_cross_tenant"),
            UnfilteredReason::NoActiveTenant => write!(f, "no_active_tenant"),
        }
    }
}

/// The scope a query must apply, as returned to the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadScope {
    /// Only rows of these tenants are visible.
    Restricted(TenantFilter),
    /// All rows are visible.
    Unfiltered(UnfilteredReason),
}

impl ReadScope {
    /// Returns the filter, if reads are restricted.
    pub fn filter(&self) -> Option<&TenantFilter> {
        match self {
            ReadScope::Restricted(filter) => Some(filter),
            ReadScope::Unfiltered(_) => None,
        }
    }

    /// Returns `true` if the entity is visible under this scope.
    pub fn permits(&self, entity: &dyn Entity) -> bool {
        match self {
            ReadScope::Restricted(filter) => filter.matches(entity),
            ReadScope::Unfiltered(_) => true,
        }
    }
}

/// Outcome of the scope policy for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDecision {
    /// Apply this filter.
    Restrict(TenantFilter),
    /// The escape hatch is open; read everything.
    AllowAll,
    /// No tenant in interactive work; read everything but report it.
    Tolerate {
        /// Origin reported alongside the violation.
        origin: WorkOrigin,
    },
    /// No tenant in unattended work; the read must fail.
    Deny {
        /// Origin reported alongside the violation.
        origin: WorkOrigin,
    },
}

/// Decides the read scope of a bound entity type under `context`.
pub fn decide(binding: &EntityBinding, context: &TenantContext) -> ScopeDecision {
    if let Some(current) = context.current_id() {
        let extra = context.extra_tenant_ids().into_iter().flatten();
        return ScopeDecision::Restrict(TenantFilter::new(
            binding.tenant_foreign_key(),
            current,
            extra,
        ));
    }

    if context.allows_dangerous_cross_tenant() {
        return ScopeDecision::AllowAll;
    }

    let origin = context.origin().clone();
    if origin.is_unattended() {
        ScopeDecision::Deny { origin }
    } else {
        ScopeDecision::Tolerate { origin }
    }
}
