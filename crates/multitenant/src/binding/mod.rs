//! Entity bindings.
//!
//! An entity type opts into tenant isolation by registering an
//! [`EntityBinding`] naming the field that holds its owning tenant. Reads of
//! bound types are scoped and writes are validated; unbound types pass
//! through untouched.

mod entity_binding;
mod registry;
mod schema;

pub use entity_binding::{ActivationHook, EntityBinding, DEFAULT_TENANT_FOREIGN_KEY};
pub use registry::BindingRegistry;
pub use schema::EntitySchema;
