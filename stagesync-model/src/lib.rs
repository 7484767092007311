//! Object model for StageSync.
//!
//! Defines the universal types the merge engine operates on:
//! - [`ObjectGraph`]: an arena of [`Object`]s addressed by `ObjectId`
//! - [`Slot`] / [`Container`]: the three attribute shapes (basic, to-one, to-many)
//! - [`EntitySchema`]: declares an entity type's fields, supertype, and hooks
//! - [`SchemaRegistry`]: type hierarchy, identity, equality, and hook dispatch
//! - [`LifecycleHook`]: callbacks run on object creation and after merge
//!
//! Nothing here knows about catalogs, products, or prices. Entity shapes are
//! data, registered at startup (or loaded from JSON) and looked up at runtime.

mod error;
mod graph;
mod handler;
mod registry;
mod schema;

pub use error::{ModelError, ModelResult};
pub use graph::{Container, Object, ObjectGraph, Slot};
pub use handler::LifecycleHook;
pub use registry::SchemaRegistry;
pub use schema::{ContainerKind, EntitySchema, FieldMapping, FieldSchema, ToManyMapping};
