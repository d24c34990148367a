//! The cross-tenant escape hatch.
//!
//! Inside a dangerous block no tenant is current and reads of bound entity
//! types are unfiltered, including from background jobs. Every entry is
//! logged at `warn`: synchronous blocks when called, async blocks on first
//! poll. A future that is built but never polled logs nothing.

use std::future::Future;

use crate::context::{self, Entry, Scoped};

/// Runs `body` with tenant isolation disabled.
///
/// The enclosing tenant, extra IDs and override flag are restored once the
/// returned future completes or is dropped.
///
/// # Examples
///
/// ```
/// use helios_multitenant::{context, escape};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// escape::dangerous_cross_tenants(async {
///     assert!(context::snapshot().allows_dangerous_cross_tenant());
/// })
/// .await;
/// assert!(!context::snapshot().allows_dangerous_cross_tenant());
/// # }
/// ```
pub fn dangerous_cross_tenants<F>(body: F) -> Scoped<F>
where
    F: Future,
{
    Scoped::new(Entry::dangerous_cross_tenants(), body)
}

/// Synchronous form of [`dangerous_cross_tenants`].
///
/// Restoration also runs when `body` panics.
pub fn dangerous_cross_tenants_sync<R>(body: impl FnOnce() -> R) -> R {
    context::enter_sync(Entry::dangerous_cross_tenants(), body)
}
