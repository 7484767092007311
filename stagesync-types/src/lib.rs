//! Core type definitions for StageSync.
//!
//! This crate defines the fundamental, domain-agnostic types used throughout
//! the merge engine:
//! - Arena handles for objects inside an object graph ([`ObjectId`])
//! - Stable, store-independent entity identities ([`Guid`])
//! - Scalar attribute values ([`Value`])
//!
//! Entity shapes (products, prices, catalogs, ...) are never described here;
//! they are declared at runtime through schemas in `stagesync-model`.

mod ids;
mod value;

pub use ids::{Guid, ObjectId};
pub use value::Value;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid GUID: {0:?}")]
    InvalidGuid(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),
}
