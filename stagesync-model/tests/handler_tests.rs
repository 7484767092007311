use stagesync_model::{LifecycleHook, Object, ObjectGraph, Slot};
use stagesync_types::{ObjectId, Value};

struct Stamp;

impl LifecycleHook for Stamp {
    fn invoke(&self, graph: &mut ObjectGraph, object: ObjectId) -> Result<(), String> {
        let obj = graph.get_mut(object).ok_or("missing")?;
        obj.set("stamped", Slot::Value(Value::Bool(true)));
        Ok(())
    }
}

// ── Trait implementations ────────────────────────────────────────

#[test]
fn struct_hook_mutates_object() {
    let mut graph = ObjectGraph::new();
    let id = graph.insert(Object::new("Product"));
    Stamp.invoke(&mut graph, id).unwrap();
    assert_eq!(graph.get(id).unwrap().value("stamped"), Some(&Value::Bool(true)));
}

#[test]
fn struct_hook_reports_missing_object() {
    let mut graph = ObjectGraph::new();
    let err = Stamp.invoke(&mut graph, ObjectId::from_index(9)).unwrap_err();
    assert_eq!(err, "missing");
}

#[test]
fn closure_is_a_hook() {
    let hook = |graph: &mut ObjectGraph, id: ObjectId| -> Result<(), String> {
        graph
            .object_mut(id)
            .map_err(|e| e.to_string())?
            .set("count", Slot::Value(Value::Int(1)));
        Ok(())
    };
    let mut graph = ObjectGraph::new();
    let id = graph.insert(Object::new("Sku"));
    hook.invoke(&mut graph, id).unwrap();
    assert_eq!(graph.get(id).unwrap().value("count"), Some(&Value::Int(1)));
}

#[test]
fn hooks_are_object_safe() {
    let hooks: Vec<Box<dyn LifecycleHook>> = vec![
        Box::new(Stamp),
        Box::new(|_: &mut ObjectGraph, _: ObjectId| -> Result<(), String> {
            Err("nope".to_string())
        }),
    ];
    let mut graph = ObjectGraph::new();
    let id = graph.insert(Object::new("Sku"));
    assert!(hooks[0].invoke(&mut graph, id).is_ok());
    assert_eq!(hooks[1].invoke(&mut graph, id).unwrap_err(), "nope");
}
