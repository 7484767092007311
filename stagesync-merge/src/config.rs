//! Merge configuration document.

use crate::boundary::BoundarySpec;
use crate::filter::{FieldEqualsFilter, MergeFilters};
use crate::inclusion::InclusionPolicy;
use crate::MergeResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Declarative engine configuration, usually loaded from JSON.
///
/// ```json
/// {
///   "boundaries": { "Product": ["Brand", "Category"] },
///   "inclusion": { "mode": "except", "accessors": [{ "entity_type": "Product", "field": "lastModified" }] },
///   "filters": [{ "entity_type": "Sku", "field": "status", "equals": "retired" }],
///   "value_objects": ["Price"]
/// }
/// ```
///
/// Every section is optional; the default merges everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Root type to reference-only types.
    pub boundaries: BoundarySpec,
    pub inclusion: InclusionPolicy,
    /// Collection elements matching a filter are resolved, not merged.
    pub filters: Vec<FieldEqualsFilter>,
    /// Restricts value-object merging to these types. `None` means every
    /// identity-less type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_objects: Option<Vec<String>>,
}

impl MergeConfig {
    pub fn from_json(json: &str) -> MergeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> MergeResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn to_json(&self) -> MergeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The configured filters, keyed by the type they apply to.
    pub fn merge_filters(&self) -> MergeFilters {
        let mut filters = MergeFilters::new();
        for filter in &self.filters {
            filters.add(&filter.entity_type, filter.clone());
        }
        filters
    }
}
