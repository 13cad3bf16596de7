//! Cycle detection over object graphs
//!
//! A walk from a root value through container elements and traversable
//! object fields, inherited ones included. Objects are tracked by heap
//! address in a visited set that lives for one [`has_cycle`] call. Reaching
//! an object that is already in the set reports a cycle, so no object is
//! expanded twice and the walk terminates on any graph. The walk keeps its
//! own work stack; graph depth is not limited by the thread's stack.

use crate::builtin::is_leaf;
use crate::gc::{GcPtr, Heap};
use crate::object::{Modifiers, Object, ObjectKind};
use crate::reflect::{owner_fields, read_field, FieldDescriptor, FieldOwner};
use crate::value::Value;
use rustc_hash::FxHashSet;

/// Check if any object reachable from `root` is reached twice
///
/// Null and leaf values never have cycles. Note that an object reachable
/// along two different paths (shared, not cyclic) is reported too.
pub fn has_cycle(heap: &Heap, root: Value) -> bool {
    let mut visited = FxHashSet::default();
    visit(heap, root, &mut visited)
}

/// Field filter used by the walk
///
/// Skips leaf-typed fields, class-level final fields, and fields flagged
/// transient, native, abstract or interface. The flags of the declaring
/// class do not matter: fields inherited from an abstract class are walked.
pub fn is_traversable(field: &FieldDescriptor) -> bool {
    !is_leaf(Some(&field.ty))
        && !field.modifiers.contains(Modifiers::STATIC | Modifiers::FINAL)
        && !field.modifiers.intersects(
            Modifiers::TRANSIENT | Modifiers::NATIVE | Modifiers::ABSTRACT | Modifiers::INTERFACE,
        )
}

fn visit(heap: &Heap, root: Value, visited: &mut FxHashSet<usize>) -> bool {
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        let Some(object) = node.as_object() else {
            continue;
        };
        if is_leaf(Some(&object.runtime_type())) {
            continue;
        }
        for child in children(heap, object) {
            if !is_newly_visited(visited, child) {
                return true;
            }
            pending.push(child);
        }
    }
    false
}

/// Record `node`; false if it was already recorded
///
/// Null, scalars and boxed scalars are always new and never recorded.
fn is_newly_visited(visited: &mut FxHashSet<usize>, node: Value) -> bool {
    match node.as_object() {
        Some(object) if object.boxed().is_none() => visited.insert(object.addr()),
        _ => true,
    }
}

fn children(heap: &Heap, object: GcPtr<Object>) -> Vec<Value> {
    if let Some(elements) = object.elements() {
        return elements;
    }

    let owner = match &object.kind {
        ObjectKind::Instance { .. } => FieldOwner::Instance(object),
        ObjectKind::Statics { class_id, .. } => FieldOwner::Class(*class_id),
        _ => return Vec::new(),
    };

    owner_fields(heap, owner)
        .iter()
        .filter(|field| is_traversable(field))
        .filter_map(|field| read_field(heap, owner, field))
        .collect()
}
