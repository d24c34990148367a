//! The tenant isolation facade.
//!
//! [`Tenancy`] ties the context, the binding registry, the scope policy, the
//! write guard and violation reporting together. A persistence layer holds
//! one and calls it through [`LifecycleHooks`] at three moments: before a
//! query, before a create and before an update.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::binding::{BindingRegistry, EntityBinding, EntitySchema};
use crate::config::IsolationConfig;
use crate::context::{self, Entry, Scoped, WithTenantOptions};
use crate::error::{BindingError, ScopeError, TenancyResult};
use crate::escape;
use crate::guard;
use crate::policy::{self, ReadScope, ScopeDecision, UnfilteredReason};
use crate::telemetry::{self, Sampler, TracingSink, UnscopedRead, ViolationSink};
use crate::tenant::TenantHandle;
use crate::types::Entity;

/// Hook points a persistence layer invokes around its operations.
///
/// Each hook may abort the operation by returning an error, in which case
/// nothing is read or written.
pub trait LifecycleHooks: Send + Sync {
    /// Returns the scope a query against `entity_type` must apply.
    fn before_query(&self, entity_type: &str) -> TenancyResult<ReadScope>;

    /// Validates, and possibly completes, an entity about to be created.
    fn before_create(&self, entity: &mut dyn Entity) -> TenancyResult<()>;

    /// Validates an entity about to be updated.
    fn before_save(&self, entity: &dyn Entity) -> TenancyResult<()>;
}

struct Inner {
    registry: BindingRegistry,
    config: IsolationConfig,
    sink: Arc<dyn ViolationSink>,
    sampler: Sampler,
}

/// Entry point for tenant isolation.
///
/// Cheap to clone; clones share the registry and the sink.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use helios_multitenant::binding::EntitySchema;
/// use helios_multitenant::context::{unit_of_work, WithTenantOptions, WorkOrigin};
/// use helios_multitenant::tenant::{TenantHandle, TenantId};
/// use helios_multitenant::Tenancy;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let tenancy = Tenancy::new();
/// tenancy.bind(EntitySchema::new("Item").with_fields(["id", "tenant_id"])).unwrap();
/// tenancy.seal_bindings();
///
/// let acme: TenantHandle = Arc::new(TenantId::new("acme"));
/// unit_of_work(WorkOrigin::request("req-1"), async {
///     let scope = tenancy
///         .with_tenant(Some(acme), WithTenantOptions::new(), async {
///             tenancy.read_scope("Item")
///         })
///         .await
///         .unwrap();
///     assert_eq!(scope.filter().unwrap().to_sql(None, 1).clause, "tenant_id = $1");
/// })
/// .await;
/// # }
/// ```
#[derive(Clone)]
pub struct Tenancy {
    inner: Arc<Inner>,
}

impl Tenancy {
    /// Creates a facade with default configuration and the tracing sink.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a facade.
    pub fn builder() -> TenancyBuilder {
        TenancyBuilder::default()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &IsolationConfig {
        &self.inner.config
    }

    /// Returns the binding registry.
    pub fn registry(&self) -> &BindingRegistry {
        &self.inner.registry
    }

    /// Registers an entity binding.
    pub fn register_binding(&self, binding: EntityBinding) -> Result<(), BindingError> {
        self.inner.registry.register(binding)
    }

    /// Binds `schema` through the configured default tenant column.
    pub fn bind(&self, schema: EntitySchema) -> Result<(), BindingError> {
        let column = self.inner.config.default_tenant_column.clone();
        self.register_binding(EntityBinding::new(schema, column))
    }

    /// Closes registration. Later registrations fail.
    pub fn seal_bindings(&self) {
        self.inner.registry.seal();
        debug!(bindings = self.inner.registry.len(), "Tenant bindings sealed");
    }

    /// Makes `tenant` current for the rest of the calling unit of work.
    ///
    /// This overwrites the current tenant without saving the previous one.
    /// Prefer [`with_tenant`](Self::with_tenant) for anything scoped.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::DetachedContext`] when called on a Tokio runtime
    /// thread outside [`unit_of_work`](context::unit_of_work), where every
    /// task on the thread would see the tenant. Nothing is written.
    pub fn activate_tenant(&self, tenant: TenantHandle) -> TenancyResult<()> {
        context::ensure_attached("activate a tenant")?;
        let _previous = context::with_state(|state| state.set_current(Some(Arc::clone(&tenant))));
        context::run_activation(&tenant, &self.inner.registry.activation_hooks());
        Ok(())
    }

    /// Leaves the current tenant of the calling unit of work.
    ///
    /// # Errors
    ///
    /// Fails like [`activate_tenant`](Self::activate_tenant) on a shared
    /// runtime thread.
    pub fn clear_current_tenant(&self) -> TenancyResult<()> {
        context::ensure_attached("clear the current tenant")?;
        let _previous = context::with_state(|state| state.set_current(None));
        Ok(())
    }

    /// Returns the current tenant of the calling unit of work.
    pub fn current_tenant(&self) -> Option<TenantHandle> {
        context::current_tenant()
    }

    /// Runs `body` with `tenant` current.
    ///
    /// `None` runs the body with no tenant at all. The enclosing tenant and
    /// extra IDs are restored once the returned future completes or is
    /// dropped, and an error returned by `body` passes through unchanged.
    pub fn with_tenant<F>(
        &self,
        tenant: Option<TenantHandle>,
        options: WithTenantOptions,
        body: F,
    ) -> Scoped<F>
    where
        F: Future,
    {
        Scoped::new(self.entry(tenant, options), body)
    }

    /// Synchronous form of [`with_tenant`](Self::with_tenant).
    ///
    /// Restoration also runs when `body` panics.
    pub fn with_tenant_sync<R>(
        &self,
        tenant: Option<TenantHandle>,
        options: WithTenantOptions,
        body: impl FnOnce() -> R,
    ) -> R {
        context::enter_sync(self.entry(tenant, options), body)
    }

    /// Runs `body` with tenant isolation disabled.
    ///
    /// See [`escape::dangerous_cross_tenants`].
    pub fn dangerous_cross_tenants<F>(&self, body: F) -> Scoped<F>
    where
        F: Future,
    {
        escape::dangerous_cross_tenants(body)
    }

    /// Synchronous form of [`dangerous_cross_tenants`](Self::dangerous_cross_tenants).
    pub fn dangerous_cross_tenants_sync<R>(&self, body: impl FnOnce() -> R) -> R {
        escape::dangerous_cross_tenants_sync(body)
    }

    /// Returns the scope a query against `entity_type` must apply.
    ///
    /// Unbound types are never filtered. Unscoped reads are reported; from a
    /// background job they fail with
    /// [`ScopeError::UnscopedBackgroundOperation`].
    pub fn read_scope(&self, entity_type: &str) -> TenancyResult<ReadScope> {
        let Some(binding) = self.inner.registry.get(entity_type) else {
            return Ok(ReadScope::Unfiltered(UnfilteredReason::NotBound));
        };

        match policy::decide(&binding, &context::snapshot()) {
            ScopeDecision::Restrict(filter) => Ok(ReadScope::Restricted(filter)),
            ScopeDecision::AllowAll => {
                debug!(entity_type = %entity_type, "Cross-tenant read");
                Ok(ReadScope::Unfiltered(UnfilteredReason::DangerousCrossTenant))
            }
            ScopeDecision::Tolerate { origin } => {
                if self.inner.sampler.should_report() {
                    let violation = UnscopedRead {
                        entity_type: entity_type.to_string(),
                        origin,
                        denied: false,
                    };
                    telemetry::report_best_effort(self.inner.sink.as_ref(), &violation);
                }
                Ok(ReadScope::Unfiltered(UnfilteredReason::NoActiveTenant))
            }
            ScopeDecision::Deny { origin } => {
                let err = ScopeError::UnscopedBackgroundOperation {
                    entity_type: entity_type.to_string(),
                    queue: origin.queue().unwrap_or_default().to_string(),
                    job_id: origin.job_id().map(String::from),
                };
                let violation = UnscopedRead {
                    entity_type: entity_type.to_string(),
                    origin,
                    denied: true,
                };
                telemetry::report_best_effort(self.inner.sink.as_ref(), &violation);
                Err(err.into())
            }
        }
    }

    /// Validates a new entity, filling in its tenant key when unset.
    pub fn before_create(&self, entity: &mut dyn Entity) -> TenancyResult<()> {
        let Some(binding) = self.inner.registry.get(entity.entity_type()) else {
            return Ok(());
        };
        guard::before_create(&binding, &context::snapshot(), entity)?;
        Ok(())
    }

    /// Validates an entity about to be updated.
    pub fn before_save(&self, entity: &dyn Entity) -> TenancyResult<()> {
        let Some(binding) = self.inner.registry.get(entity.entity_type()) else {
            return Ok(());
        };
        guard::before_save(&binding, &context::snapshot(), entity)?;
        Ok(())
    }

    fn entry(&self, tenant: Option<TenantHandle>, options: WithTenantOptions) -> Entry {
        Entry::tenant(
            tenant,
            options.into_extra_tenant_ids(),
            self.inner.registry.activation_hooks(),
        )
    }
}

impl Default for Tenancy {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleHooks for Tenancy {
    fn before_query(&self, entity_type: &str) -> TenancyResult<ReadScope> {
        self.read_scope(entity_type)
    }

    fn before_create(&self, entity: &mut dyn Entity) -> TenancyResult<()> {
        Tenancy::before_create(self, entity)
    }

    fn before_save(&self, entity: &dyn Entity) -> TenancyResult<()> {
        Tenancy::before_save(self, entity)
    }
}

impl fmt::Debug for Tenancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tenancy")
            .field("registry", &self.inner.registry)
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Builder for [`Tenancy`].
#[derive(Default)]
pub struct TenancyBuilder {
    config: Option<IsolationConfig>,
    registry: Option<BindingRegistry>,
    sink: Option<Arc<dyn ViolationSink>>,
}

impl TenancyBuilder {
    /// Sets the configuration.
    pub fn with_config(mut self, config: IsolationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses a pre-populated registry.
    pub fn with_registry(mut self, registry: BindingRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sends violation reports to `sink` instead of `tracing`.
    pub fn with_sink(mut self, sink: impl ViolationSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Builds the facade.
    pub fn build(self) -> Tenancy {
        let config = self.config.unwrap_or_default();
        let sampler = Sampler::new(config.unscoped_read_sample_every);
        Tenancy {
            inner: Arc::new(Inner {
                registry: self.registry.unwrap_or_default(),
                sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
                sampler,
                config,
            }),
        }
    }
}

impl fmt::Debug for TenancyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenancyBuilder")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
