use pretty_assertions::assert_eq;
use serde_json::json;
use stagesync_model::{ContainerKind, Container, EntitySchema, FieldMapping, FieldSchema, ToManyMapping};

// ── FieldSchema constructors ─────────────────────────────────────

#[test]
fn store_owned_fields() {
    assert_eq!(FieldSchema::id("uidPk").mapping, FieldMapping::Id);
    assert_eq!(FieldSchema::version("version").mapping, FieldMapping::Version);
}

#[test]
fn basic_and_guid_fields_are_writable() {
    let f = FieldSchema::basic("name");
    assert_eq!(f.name, "name");
    assert_eq!(f.mapping, FieldMapping::Basic);
    assert!(f.writable);
    assert_eq!(FieldSchema::guid("code").mapping, FieldMapping::Guid);
}

#[test]
fn read_only_clears_writable() {
    let f = FieldSchema::basic("displayName").read_only();
    assert!(!f.writable);
}

#[test]
fn to_one_records_target() {
    let f = FieldSchema::to_one("brand", "Brand");
    assert_eq!(
        f.mapping,
        FieldMapping::ToOne {
            target: "Brand".into()
        }
    );
}

#[test]
fn container_shorthands() {
    let list = FieldSchema::list("skus", "Sku");
    let set = FieldSchema::set("categories", "Category");
    let map = FieldSchema::map("localized", "LocalizedName", Some("locale"));

    assert_eq!(
        list.mapping,
        FieldMapping::ToMany(ToManyMapping {
            target: Some("Sku".into()),
            container: ContainerKind::List,
            map_key: None,
        })
    );
    assert!(matches!(set.mapping, FieldMapping::ToMany(ref m) if m.container == ContainerKind::Set));
    assert!(matches!(map.mapping, FieldMapping::ToMany(ref m) if m.map_key.as_deref() == Some("locale")));
}

#[test]
fn to_many_without_target() {
    let f = FieldSchema::to_many("attachments", None, ContainerKind::List, None);
    assert!(matches!(f.mapping, FieldMapping::ToMany(ref m) if m.target.is_none()));
}

// ── EntitySchema builder ─────────────────────────────────────────

#[test]
fn builder_accumulates_in_order() {
    let schema = EntitySchema::new("Product")
        .extends("CatalogItem")
        .field(FieldSchema::guid("code"))
        .field(FieldSchema::basic("name"))
        .post_load("recalculate")
        .post_load("index")
        .on_create("assignGuid");

    assert_eq!(schema.entity_type, "Product");
    assert_eq!(schema.extends.as_deref(), Some("CatalogItem"));
    let names: Vec<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["code", "name"]);
    assert_eq!(schema.post_load, vec!["recalculate", "index"]);
    assert_eq!(schema.on_create.as_deref(), Some("assignGuid"));
}

#[test]
fn guid_field_and_field_named() {
    let schema = EntitySchema::new("Brand")
        .field(FieldSchema::id("uidPk"))
        .field(FieldSchema::guid("code"));
    assert_eq!(schema.guid_field().map(|f| f.name.as_str()), Some("code"));
    assert!(schema.field_named("uidPk").is_some());
    assert!(schema.field_named("missing").is_none());
}

#[test]
fn value_object_has_no_guid_field() {
    let schema = EntitySchema::new("Price")
        .field(FieldSchema::basic("currency"))
        .natural_key(&["currency"]);
    assert!(schema.guid_field().is_none());
    assert_eq!(schema.natural_key, vec!["currency"]);
}

// ── ContainerKind ────────────────────────────────────────────────

#[test]
fn container_kind_empty() {
    assert_eq!(ContainerKind::List.empty(), Container::List(vec![]));
    assert_eq!(ContainerKind::Set.empty(), Container::Set(vec![]));
    assert!(ContainerKind::Map.empty().is_empty());
    assert_eq!(ContainerKind::Map.empty().kind(), ContainerKind::Map);
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn schema_deserializes_from_json() {
    let schema: EntitySchema = serde_json::from_value(json!({
        "entity_type": "Product",
        "fields": [
            {"name": "uidPk", "mapping": {"kind": "id"}},
            {"name": "code", "mapping": {"kind": "guid"}},
            {"name": "brand", "mapping": {"kind": "to_one", "target": "Brand"}},
            {"name": "skus", "mapping": {"kind": "to_many", "target": "Sku", "container": "list"}},
            {"name": "label", "mapping": {"kind": "basic"}, "writable": false}
        ],
        "post_load": ["recalculate"]
    }))
    .unwrap();

    assert_eq!(schema.fields.len(), 5);
    assert_eq!(schema.fields[2].mapping, FieldMapping::ToOne { target: "Brand".into() });
    assert!(!schema.fields[4].writable);
    assert!(schema.fields[0].writable);
    assert_eq!(schema.extends, None);
    assert!(schema.natural_key.is_empty());
}

#[test]
fn schema_serialization_skips_defaults() {
    let schema = EntitySchema::new("Tag").field(FieldSchema::basic("label"));
    let json = serde_json::to_value(&schema).unwrap();
    assert_eq!(
        json,
        json!({
            "entity_type": "Tag",
            "fields": [{"name": "label", "mapping": {"kind": "basic"}}]
        })
    );
}

#[test]
fn to_many_target_is_optional_in_json() {
    let field: FieldSchema = serde_json::from_value(json!({
        "name": "items",
        "mapping": {"kind": "to_many", "container": "set"}
    }))
    .unwrap();
    assert_eq!(
        field.mapping,
        FieldMapping::ToMany(ToManyMapping {
            target: None,
            container: ContainerKind::Set,
            map_key: None,
        })
    );
}
