//! Entity types seen by the tenancy hooks.
//!
//! - [`Entity`] - Named field access implemented by the persistence layer
//! - [`Record`] - A ready-made JSON-object entity

mod entity;
mod record;

pub use entity::Entity;
pub use record::Record;
