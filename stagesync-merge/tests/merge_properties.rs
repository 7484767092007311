//! Property-based tests for merge correctness.
//!
//! - Idempotence: merging the same source twice equals merging it once
//! - Exactness: the reconciled SKU list holds exactly the source SKUs, and
//!   SKUs present on both sides keep their target object
//! - Reference-only round trip: resolved categories are the store objects

mod common;

use common::*;
use proptest::prelude::*;
use stagesync_model::ObjectGraph;
use stagesync_types::ObjectId;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn sku_codes() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(
        (0u8..8).prop_map(|n| format!("s-{n}")),
        prop::sample::select(vec!["active", "retired", "draft"]).prop_map(str::to_string),
        0..6,
    )
}

fn prices() -> impl Strategy<Value = BTreeMap<String, i64>> {
    prop::collection::btree_map(
        prop::sample::select(vec!["USD", "EUR", "GBP", "JPY"]).prop_map(str::to_string),
        0i64..10_000,
        0..4,
    )
}

fn attributes() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(
        prop::sample::select(vec!["color", "size", "weight"]).prop_map(str::to_string),
        "[a-z]{1,6}",
        0..3,
    )
}

#[derive(Debug, Clone)]
struct Side {
    name: String,
    skus: BTreeMap<String, String>,
    prices: BTreeMap<String, i64>,
    attributes: BTreeMap<String, String>,
}

fn side() -> impl Strategy<Value = Side> {
    ("[A-Za-z ]{0,12}", sku_codes(), prices(), attributes()).prop_map(
        |(name, skus, prices, attributes)| Side {
            name,
            skus,
            prices,
            attributes,
        },
    )
}

/// Builds a product; SKUs point back at it when `back_refs` is set.
fn build(graph: &mut ObjectGraph, side: &Side, back_refs: bool) -> (ObjectId, BTreeMap<String, ObjectId>) {
    let root = product(graph, "p-1", &side.name);
    let mut skus = BTreeMap::new();
    for (code, status) in &side.skus {
        let id = sku(graph, code, status);
        if back_refs {
            set_ref(graph, id, "product", Some(root));
        }
        add(graph, root, "skus", id);
        skus.insert(code.clone(), id);
    }
    for (currency, amount) in &side.prices {
        let id = price(graph, currency, *amount);
        add(graph, root, "prices", id);
    }
    for (key, value) in &side.attributes {
        let id = attribute(graph, key, value);
        put(graph, root, "attributes", key, id);
    }
    (root, skus)
}

// =============================================================================
// MERGE PROPERTIES
// =============================================================================

mod merge_properties {
    use super::*;

    proptest! {
        /// Idempotence: a second identical merge changes nothing.
        #[test]
        fn merge_is_idempotent(source_side in side(), target_side in side()) {
            let engine = catalog_engine();
            let mut source = ObjectGraph::new();
            let (s, _) = build(&mut source, &source_side, true);
            let mut target = ObjectGraph::new();
            let (t, _) = build(&mut target, &target_side, false);

            engine.merge(&source, s, &mut target, t).unwrap();
            let once = snapshot(&target, t);
            let skus_once = elements(&target, t, "skus");

            engine.merge(&source, s, &mut target, t).unwrap();
            let twice = snapshot(&target, t);

            prop_assert_eq!(once, twice);
            prop_assert_eq!(skus_once, elements(&target, t, "skus"));
        }

        /// Exactness: the target holds exactly the source SKUs, matched ones
        /// merged in place and unmatched ones removed.
        #[test]
        fn sku_reconciliation_is_exact(source_side in side(), target_side in side()) {
            let engine = catalog_engine();
            let mut source = ObjectGraph::new();
            let (s, _) = build(&mut source, &source_side, true);
            let mut target = ObjectGraph::new();
            let (t, original) = build(&mut target, &target_side, false);

            engine.merge(&source, s, &mut target, t).unwrap();

            let merged = elements(&target, t, "skus");
            let codes: BTreeSet<String> = texts(&target, &merged, "skuCode").into_iter().collect();
            let expected: BTreeSet<String> = source_side.skus.keys().cloned().collect();
            prop_assert_eq!(&codes, &expected);
            prop_assert_eq!(merged.len(), expected.len());

            for (code, id) in &original {
                if source_side.skus.contains_key(code) {
                    prop_assert!(merged.contains(id));
                    prop_assert_eq!(text(&target, *id, "status"), Some(source_side.skus[code].clone()));
                } else {
                    prop_assert!(!merged.contains(id));
                }
            }
            for id in &merged {
                prop_assert_eq!(target.object(*id).unwrap().reference("product"), Some(t));
            }
        }

        /// Value objects end up keyed exactly like the source, one element per key.
        #[test]
        fn value_objects_follow_the_source(source_side in side(), target_side in side()) {
            let engine = catalog_engine();
            let mut source = ObjectGraph::new();
            let (s, _) = build(&mut source, &source_side, false);
            let mut target = ObjectGraph::new();
            let (t, _) = build(&mut target, &target_side, false);

            engine.merge(&source, s, &mut target, t).unwrap();

            let snap = snapshot(&target, t);
            let expected_prices: Vec<serde_json::Value> = source_side
                .prices
                .iter()
                .map(|(c, a)| serde_json::json!([c, a]))
                .collect();
            prop_assert_eq!(&snap["prices"], &serde_json::Value::Array(expected_prices));
            let expected_attributes: serde_json::Map<String, serde_json::Value> = source_side
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            prop_assert_eq!(&snap["attributes"], &serde_json::Value::Object(expected_attributes));
        }

        /// Reference-only round trip: every resolved category is the store object.
        #[test]
        fn categories_resolve_to_store_objects(
            stored in prop::collection::btree_set(0u8..10, 1..6),
            picks in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
        ) {
            let engine = catalog_engine();
            let codes: Vec<String> = stored.iter().map(|n| format!("c-{n}")).collect();

            let mut target = ObjectGraph::new();
            let store: BTreeMap<String, ObjectId> = codes
                .iter()
                .map(|code| (code.clone(), category(&mut target, code, code)))
                .collect();
            let t = product(&mut target, "p-1", "A");

            let mut source = ObjectGraph::new();
            let s = product(&mut source, "p-1", "A");
            let mut expected = Vec::new();
            for pick in &picks {
                let code = &codes[pick.index(codes.len())];
                if expected.contains(&store[code]) {
                    continue;
                }
                let c = category(&mut source, code, "staging copy");
                add(&mut source, s, "categories", c);
                expected.push(store[code]);
            }

            engine.merge(&source, s, &mut target, t).unwrap();

            prop_assert_eq!(elements(&target, t, "categories"), expected);
        }
    }
}
