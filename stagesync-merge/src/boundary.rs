//! Merge boundary: where deep merging stops and reference resolution begins.

use serde::{Deserialize, Serialize};
use stagesync_model::SchemaRegistry;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Per-root-type boundary rules.
///
/// Each entry maps a root entity type to the types that are treated as
/// reference-only while that root is being merged. Promoting a `Product`
/// typically deep-merges its SKUs and attribute values but only re-links
/// its `Brand` and `Category`, which are synchronized on their own.
///
/// In JSON: `{"Product": ["Brand", "Category"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundarySpec {
    rules: BTreeMap<String, BTreeSet<String>>,
}

impl BoundarySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds reference-only types for `root_type`.
    pub fn add_rule<'a>(&mut self, root_type: &str, reference_only: impl IntoIterator<Item = &'a str>) {
        self.rules
            .entry(root_type.to_string())
            .or_default()
            .extend(reference_only.into_iter().map(str::to_string));
    }

    #[must_use]
    pub fn with_rule<'a>(
        mut self,
        root_type: &str,
        reference_only: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.add_rule(root_type, reference_only);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Establishes the boundary for one top-level merge of `root_type`.
    ///
    /// Rules declared for the root type win; otherwise the nearest supertype
    /// with rules is used. A root with no rules at all deep-merges everything.
    pub fn initialize(&self, registry: &SchemaRegistry, root_type: &str) -> Boundary {
        let mut candidates = vec![root_type.to_string()];
        if let Ok(lineage) = registry.lineage(root_type) {
            candidates.extend(lineage.iter().rev().map(|s| s.entity_type.clone()));
        }

        for candidate in &candidates {
            if let Some(types) = self.rules.get(candidate) {
                debug!(
                    "Merge boundary for {} (rules of {}): {:?}",
                    root_type, candidate, types
                );
                return Boundary {
                    root_type: root_type.into(),
                    reference_only: types.clone(),
                };
            }
        }

        warn!("No merge boundary configured for {root_type}; deep-merging every reachable entity");
        Boundary::deep_merge_all(root_type)
    }
}

/// The boundary in force for one top-level merge. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    root_type: String,
    reference_only: BTreeSet<String>,
}

impl Boundary {
    /// A boundary that never stops merging.
    pub fn deep_merge_all(root_type: &str) -> Self {
        Self {
            root_type: root_type.into(),
            reference_only: BTreeSet::new(),
        }
    }

    pub fn root_type(&self) -> &str {
        &self.root_type
    }

    pub fn reference_only(&self) -> impl Iterator<Item = &str> {
        self.reference_only.iter().map(String::as_str)
    }

    /// True when `entity_type`, or one of its supertypes, is reference-only.
    pub fn stop_merging(&self, registry: &SchemaRegistry, entity_type: &str) -> bool {
        self.reference_only
            .iter()
            .any(|t| registry.is_a(entity_type, t))
    }
}
