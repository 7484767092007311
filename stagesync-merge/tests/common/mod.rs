//! Shared fixtures for merge engine tests.

#![allow(dead_code)]

use serde_json::{json, Map, Value as Json};
use stagesync_merge::{BoundarySpec, MergeEngine};
use stagesync_model::{Container, EntitySchema, FieldSchema, Object, ObjectGraph, SchemaRegistry};
use stagesync_types::{ObjectId, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A small catalog: products with SKUs, categories, attributes, and prices.
///
/// - `Brand` and `Category` carry GUIDs and are reference-only under `Product`.
/// - `Sku` carries a GUID and points back at its product.
/// - `AttributeValue` and `Price` are identity-less value objects.
pub fn catalog_registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with_schema(
            EntitySchema::new("Persistable")
                .field(FieldSchema::id("uidPk"))
                .field(FieldSchema::version("version")),
        )
        .with_schema(
            EntitySchema::new("Brand")
                .extends("Persistable")
                .field(FieldSchema::guid("guid"))
                .field(FieldSchema::basic("name")),
        )
        .with_schema(
            EntitySchema::new("Category")
                .extends("Persistable")
                .field(FieldSchema::guid("code"))
                .field(FieldSchema::basic("name"))
                .field(FieldSchema::to_one("parent", "Category"))
                .field(FieldSchema::set("children", "Category")),
        )
        .with_schema(
            EntitySchema::new("Product")
                .extends("Persistable")
                .field(FieldSchema::guid("code"))
                .field(FieldSchema::basic("name"))
                .field(FieldSchema::basic("status"))
                .field(FieldSchema::transient("displayCache"))
                .field(FieldSchema::to_one("brand", "Brand"))
                .field(FieldSchema::to_one("defaultSku", "Sku"))
                .field(FieldSchema::list("skus", "Sku"))
                .field(FieldSchema::set("categories", "Category"))
                .field(FieldSchema::map("attributes", "AttributeValue", Some("key")))
                .field(FieldSchema::set("prices", "Price")),
        )
        .with_schema(
            EntitySchema::new("Sku")
                .extends("Persistable")
                .field(FieldSchema::guid("skuCode"))
                .field(FieldSchema::basic("status"))
                .field(FieldSchema::basic("quantity"))
                .field(FieldSchema::to_one("product", "Product")),
        )
        .with_schema(
            EntitySchema::new("AttributeValue")
                .field(FieldSchema::basic("key"))
                .field(FieldSchema::basic("value"))
                .natural_key(&["key"]),
        )
        .with_schema(
            EntitySchema::new("Price")
                .field(FieldSchema::basic("currency"))
                .field(FieldSchema::basic("amount"))
                .natural_key(&["currency"]),
        )
}

/// Brands and categories are re-linked, everything else is deep-merged.
pub fn catalog_boundaries() -> BoundarySpec {
    BoundarySpec::new().with_rule("Product", ["Brand", "Category"])
}

pub fn catalog_engine() -> MergeEngine {
    MergeEngine::new(Arc::new(catalog_registry())).with_boundaries(catalog_boundaries())
}

// ── Builders ─────────────────────────────────────────────────────

pub fn brand(graph: &mut ObjectGraph, guid: &str, name: &str) -> ObjectId {
    graph.insert(
        Object::new("Brand")
            .with_value("guid", guid)
            .with_value("name", name),
    )
}

pub fn category(graph: &mut ObjectGraph, code: &str, name: &str) -> ObjectId {
    graph.insert(
        Object::new("Category")
            .with_value("code", code)
            .with_value("name", name)
            .with_ref("parent", None)
            .with_many("children", Some(Container::Set(Vec::new()))),
    )
}

/// A product with every association present and empty.
pub fn product(graph: &mut ObjectGraph, code: &str, name: &str) -> ObjectId {
    graph.insert(
        Object::new("Product")
            .with_value("code", code)
            .with_value("name", name)
            .with_value("status", "active")
            .with_ref("brand", None)
            .with_ref("defaultSku", None)
            .with_many("skus", Some(Container::List(Vec::new())))
            .with_many("categories", Some(Container::Set(Vec::new())))
            .with_many("attributes", Some(Container::Map(BTreeMap::new())))
            .with_many("prices", Some(Container::Set(Vec::new()))),
    )
}

pub fn sku(graph: &mut ObjectGraph, code: &str, status: &str) -> ObjectId {
    graph.insert(
        Object::new("Sku")
            .with_value("skuCode", code)
            .with_value("status", status)
            .with_value("quantity", 0_i64)
            .with_ref("product", None),
    )
}

pub fn attribute(graph: &mut ObjectGraph, key: &str, value: &str) -> ObjectId {
    graph.insert(
        Object::new("AttributeValue")
            .with_value("key", key)
            .with_value("value", value),
    )
}

pub fn price(graph: &mut ObjectGraph, currency: &str, amount: i64) -> ObjectId {
    graph.insert(
        Object::new("Price")
            .with_value("currency", currency)
            .with_value("amount", amount),
    )
}

/// Appends to a list or set association.
pub fn add(graph: &mut ObjectGraph, owner: ObjectId, field: &str, element: ObjectId) {
    match graph.object_mut(owner).unwrap().container_mut(field).unwrap() {
        Container::List(items) | Container::Set(items) => items.push(element),
        Container::Map(_) => panic!("{field} is a map; use put"),
    }
}

/// Inserts into a map association.
pub fn put(graph: &mut ObjectGraph, owner: ObjectId, field: &str, key: &str, element: ObjectId) {
    match graph.object_mut(owner).unwrap().container_mut(field).unwrap() {
        Container::Map(entries) => {
            entries.insert(key.to_string(), element);
        }
        _ => panic!("{field} is not a map"),
    }
}

pub fn set_ref(graph: &mut ObjectGraph, owner: ObjectId, field: &str, target: Option<ObjectId>) {
    graph
        .object_mut(owner)
        .unwrap()
        .set(field, stagesync_model::Slot::Ref(target));
}

// ── Readers ──────────────────────────────────────────────────────

pub fn text(graph: &ObjectGraph, object: ObjectId, field: &str) -> Option<String> {
    graph
        .object(object)
        .unwrap()
        .value(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn elements(graph: &ObjectGraph, owner: ObjectId, field: &str) -> Vec<ObjectId> {
    graph
        .object(owner)
        .unwrap()
        .container(field)
        .map(Container::elements)
        .unwrap_or_default()
}

/// The values of `field` across `ids`, in order.
pub fn texts(graph: &ObjectGraph, ids: &[ObjectId], field: &str) -> Vec<String> {
    ids.iter()
        .map(|id| text(graph, *id, field).unwrap_or_default())
        .collect()
}

/// A canonical JSON view of a product, independent of arena positions.
pub fn snapshot(graph: &ObjectGraph, product: ObjectId) -> Json {
    let root = graph.object(product).unwrap();
    let value_of = |id: ObjectId, field: &str| -> Json {
        graph
            .object(id)
            .unwrap()
            .value(field)
            .map(|v| serde_json::to_value(v).unwrap())
            .unwrap_or(Json::Null)
    };

    let skus: Vec<Json> = elements(graph, product, "skus")
        .into_iter()
        .map(|id| {
            let back = graph.object(id).unwrap().reference("product");
            json!({
                "skuCode": value_of(id, "skuCode"),
                "status": value_of(id, "status"),
                "quantity": value_of(id, "quantity"),
                "pointsAtRoot": back == Some(product),
            })
        })
        .collect();

    let mut prices: Vec<(String, Json)> = elements(graph, product, "prices")
        .into_iter()
        .map(|id| (text(graph, id, "currency").unwrap_or_default(), value_of(id, "amount")))
        .collect();
    prices.sort_by(|a, b| a.0.cmp(&b.0));

    let attributes: Map<String, Json> = match root.container("attributes") {
        Some(Container::Map(entries)) => entries
            .iter()
            .map(|(k, id)| (k.clone(), value_of(*id, "value")))
            .collect(),
        _ => Map::new(),
    };

    json!({
        "code": value_of(product, "code"),
        "name": value_of(product, "name"),
        "status": value_of(product, "status"),
        "skus": skus,
        "prices": prices,
        "attributes": attributes,
    })
}
