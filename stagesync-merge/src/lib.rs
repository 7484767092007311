//! Object-graph merge engine for StageSync.
//!
//! Replays a source object graph (an entity and everything it transitively
//! references, typically loaded from a staging store) onto the corresponding
//! target graph (the unit of work of a production store), without losing
//! target-only identity or unrelated target state.
//!
//! # Components
//!
//! - **Metadata**: classifies every attribute of an entity type
//! - **Cycle tracking**: maps visited source objects to their targets
//! - **Reconciler**: adds, merges, and removes collection elements in place
//! - **Boundary**: decides which referenced types are deep-merged and which are
//!   only re-resolved by GUID
//! - **Locator / factory**: find target-store objects, create new ones
//! - **Value objects**: fold identity-less elements onto equal existing ones
//! - **Inclusion / filters**: exclude attributes or elements from merging
//!
//! # Example
//!
//! ```
//! use stagesync_merge::MergeEngine;
//! use stagesync_model::{EntitySchema, FieldSchema, Object, ObjectGraph, SchemaRegistry};
//! use std::sync::Arc;
//!
//! let registry = SchemaRegistry::new().with_schema(
//!     EntitySchema::new("Brand")
//!         .field(FieldSchema::guid("guid"))
//!         .field(FieldSchema::basic("name")),
//! );
//! let engine = MergeEngine::new(Arc::new(registry));
//!
//! let mut staging = ObjectGraph::new();
//! let source = staging.insert(Object::new("Brand").with_value("guid", "b-1").with_value("name", "Acme"));
//!
//! let mut production = ObjectGraph::new();
//! let target = production.insert(Object::new("Brand").with_value("guid", "b-1").with_value("name", "Old"));
//!
//! engine.merge(&staging, source, &mut production, target)?;
//! let name = production.object(target)?.value("name").and_then(|v| v.as_str());
//! assert_eq!(name, Some("Acme"));
//! # Ok::<(), stagesync_merge::MergeError>(())
//! ```

mod boundary;
mod config;
mod cycle;
mod engine;
mod error;
mod factory;
mod filter;
mod inclusion;
mod locator;
mod map_key;
mod metadata;
mod reconcile;
mod session;
mod value_object;

pub use boundary::{Boundary, BoundarySpec};
pub use config::MergeConfig;
pub use cycle::CycleTracker;
pub use engine::MergeEngine;
pub use error::{MergeError, MergeResult};
pub use factory::{ObjectFactory, SchemaObjectFactory};
pub use filter::{EntityFilter, FieldEqualsFilter, MergeFilters};
pub use inclusion::{AccessorRef, InclusionPolicy};
pub use locator::{EntityLocator, GraphEntityLocator, GuidLocator};
pub use map_key::{FieldMapKeyExtractor, MapKeyExtractor};
pub use metadata::{Accessor, Classification, CollectionAccessor, MetadataLocator};
pub use session::MergeStats;
pub use value_object::{FieldwiseValueObjectMerger, ValueObjectMerger};
