//! Error types for the merge engine.

use stagesync_model::ModelError;
use stagesync_types::ObjectId;
use thiserror::Error;

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Errors that abort a merge.
///
/// Nothing is recovered locally: the first error ends the top-level call and
/// the target graph may be partially mutated. Callers discard it by not
/// committing.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Schema lookup, graph access, or hook failure.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A merged attribute has no setter.
    #[error("no setter for {entity_type}.{accessor}")]
    MissingSetter {
        entity_type: String,
        accessor: String,
    },

    /// A to-many association does not declare its element type.
    #[error("to-many association {entity_type}.{accessor} declares no target entity")]
    UndeclaredCollectionTarget {
        entity_type: String,
        accessor: String,
    },

    /// A to-many slot holds something other than a list, set, or map,
    /// or source and target disagree on the container kind.
    #[error("unexpected collection type in {entity_type}.{accessor}: {found}")]
    UnexpectedCollectionType {
        entity_type: String,
        accessor: String,
        found: String,
    },

    /// A slot does not have the shape its schema mapping requires.
    #[error("{entity_type}.{accessor} holds a {found} where a {expected} was expected")]
    SlotShape {
        entity_type: String,
        accessor: String,
        expected: &'static str,
        found: &'static str,
    },

    /// No key could be derived for a map element.
    #[error("cannot derive a map key for {entity_type} in {accessor}")]
    MissingMapKey {
        entity_type: String,
        accessor: String,
    },

    /// The factory could not create an object.
    #[error("cannot instantiate {entity_type}: {reason}")]
    Instantiation { entity_type: String, reason: String },

    /// A referenced entity has no counterpart in the target store.
    #[error("{entity_type} with GUID {guid} not found in target store")]
    EntityNotFound { entity_type: String, guid: String },

    /// A source entity that must be resolved by GUID has none.
    #[error("{entity_type} at {object} has no GUID to resolve it by")]
    MissingGuid {
        entity_type: String,
        object: ObjectId,
    },

    /// Source and target objects are of different types.
    #[error("type mismatch: source is {source_type}, target is {target_type}")]
    TypeMismatch {
        source_type: String,
        target_type: String,
    },

    /// Configuration document could not be parsed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MergeError {
    /// Errors caused by schemas, hooks, or engine configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Model(_)
                | Self::MissingSetter { .. }
                | Self::UndeclaredCollectionTarget { .. }
                | Self::UnexpectedCollectionType { .. }
                | Self::SlotShape { .. }
                | Self::MissingMapKey { .. }
                | Self::Instantiation { .. }
                | Self::Serialization(_)
                | Self::Io(_)
        )
    }

    /// Errors caused by a referenced entity missing from the target store,
    /// which usually means a prerequisite sync has not run.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::EntityNotFound { .. } | Self::MissingGuid { .. })
    }
}
