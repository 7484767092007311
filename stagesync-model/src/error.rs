//! Error types for the object model.

use stagesync_types::ObjectId;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while reading schemas or walking a graph.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No schema registered for the type.
    #[error("unknown entity type: {0}")]
    UnknownType(String),

    /// The `extends` chain loops back on itself.
    #[error("inheritance cycle through entity type: {0}")]
    InheritanceCycle(String),

    /// The handle does not point at a live object.
    #[error("no object at {0}")]
    MissingObject(ObjectId),

    /// A schema names a hook that was never registered.
    #[error("hook {hook} is not registered for {entity_type}")]
    UnknownHook { entity_type: String, hook: String },

    /// A hook ran and reported failure.
    #[error("hook {hook} on {entity_type} failed: {reason}")]
    HookFailed {
        entity_type: String,
        hook: String,
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
