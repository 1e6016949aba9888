//! # relkit-core
//!
//! Foundation crate for relkit.
//! Defines the schema registry, the entity model, the storage and reflector
//! traits, errors, and config. Every other crate in the workspace depends on this.

pub mod config;
pub mod entity;
pub mod errors;
pub mod schema;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::RelkitConfig;
pub use entity::{Condition, Entity, EntityRef, Filter, Values};
pub use errors::{RelkitError, RelkitResult};
pub use schema::{Cardinality, EntityType, Field, SchemaRegistry};
