//! Per-attribute allow/deny lists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Names one attribute of one entity type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccessorRef {
    pub entity_type: String,
    pub field: String,
}

impl AccessorRef {
    pub fn new(entity_type: &str, field: &str) -> Self {
        Self {
            entity_type: entity_type.into(),
            field: field.into(),
        }
    }
}

/// Decides which attributes take part in a merge.
///
/// Exactly one mode is active. In JSON:
/// `{"mode": "except", "accessors": [{"entity_type": "Product", "field": "lastModified"}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "accessors", rename_all = "snake_case")]
pub enum InclusionPolicy {
    /// Merge every attribute.
    #[default]
    #[serde(rename = "all")]
    MergeAll,
    /// Merge every attribute except the listed ones.
    #[serde(rename = "except")]
    MergeAllExcept(BTreeSet<AccessorRef>),
    /// Merge only the listed attributes.
    #[serde(rename = "only")]
    MergeOnly(BTreeSet<AccessorRef>),
}

impl InclusionPolicy {
    pub fn merge_all() -> Self {
        Self::MergeAll
    }

    pub fn merge_all_except(accessors: impl IntoIterator<Item = AccessorRef>) -> Self {
        Self::MergeAllExcept(accessors.into_iter().collect())
    }

    pub fn merge_only(accessors: impl IntoIterator<Item = AccessorRef>) -> Self {
        Self::MergeOnly(accessors.into_iter().collect())
    }

    /// Whether `accessor` declared on `entity_type` is merged.
    pub fn permitted(&self, entity_type: &str, accessor: &str) -> bool {
        match self {
            Self::MergeAll => true,
            Self::MergeAllExcept(denied) => !contains(denied, entity_type, accessor),
            Self::MergeOnly(allowed) => contains(allowed, entity_type, accessor),
        }
    }

    /// Like [`permitted`](Self::permitted) for an inherited attribute: an entry
    /// may name either the concrete type being merged or the declaring supertype.
    pub fn permits_field(&self, entity_type: &str, declaring_type: &str, accessor: &str) -> bool {
        match self {
            Self::MergeAll => true,
            Self::MergeAllExcept(_) => {
                self.permitted(declaring_type, accessor) && self.permitted(entity_type, accessor)
            }
            Self::MergeOnly(_) => {
                self.permitted(declaring_type, accessor) || self.permitted(entity_type, accessor)
            }
        }
    }
}

fn contains(set: &BTreeSet<AccessorRef>, entity_type: &str, accessor: &str) -> bool {
    set.iter()
        .any(|a| a.entity_type == entity_type && a.field == accessor)
}
