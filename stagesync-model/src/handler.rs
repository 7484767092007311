use crate::ObjectGraph;
use stagesync_types::ObjectId;

/// A callback attached to an entity type by name.
///
/// Schemas reference hooks by name (`on_create`, `post_load`); the
/// implementations are registered on the `SchemaRegistry`. Two moments use
/// them:
/// - `on_create` runs when the merge engine instantiates a fresh target
///   object (e.g., to mint a GUID or seed defaults).
/// - `post_load` runs on a target object after all of its attributes were
///   merged (e.g., to recompute derived fields).
///
/// Any `Fn(&mut ObjectGraph, ObjectId) -> Result<(), String>` closure is a hook.
pub trait LifecycleHook: Send + Sync {
    /// Runs the hook against `object` inside `graph`.
    /// Return `Err(message)` to abort the surrounding merge.
    fn invoke(&self, graph: &mut ObjectGraph, object: ObjectId) -> Result<(), String>;
}

impl<F> LifecycleHook for F
where
    F: Fn(&mut ObjectGraph, ObjectId) -> Result<(), String> + Send + Sync,
{
    fn invoke(&self, graph: &mut ObjectGraph, object: ObjectId) -> Result<(), String> {
        self(graph, object)
    }
}
