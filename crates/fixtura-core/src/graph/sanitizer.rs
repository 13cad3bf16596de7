//! Cycle removal
//!
//! [`sanitize`] nulls references that close cycles, top down. A field (or
//! container element) is nulled only when its own value has a cycle;
//! otherwise the sanitizer descends into it and keeps the reference.
//! Inherited fields are handled like declared ones.
//!
//! Descending only happens into acyclic values, where [`sanitize`] returns
//! at once, so the recursion is at most one level deep.

use super::detector::has_cycle;
use crate::builtin::is_leaf;
use crate::gc::{GcPtr, Heap};
use crate::object::{Object, ObjectKind};
use crate::reflect::{owner_fields, read_field, set_field_with, FieldOwner};
use crate::value::Value;

/// Null out the references in `value` that take part in cycles
///
/// Does nothing for null, leaves, and values without a cycle. Never fails:
/// field errors are logged and the field is left as is.
pub fn sanitize(heap: &Heap, value: Value) {
    let Some(object) = value.as_object() else {
        return;
    };
    if is_leaf(Some(&object.runtime_type())) || !has_cycle(heap, value) {
        return;
    }

    if object.is_container() {
        sanitize_elements(heap, object);
    } else {
        sanitize_fields(heap, object);
    }
}

fn sanitize_fields(heap: &Heap, object: GcPtr<Object>) {
    let owner = match &object.kind {
        ObjectKind::Instance { .. } => FieldOwner::Instance(object),
        ObjectKind::Statics { class_id, .. } => FieldOwner::Class(*class_id),
        _ => return,
    };

    for field in owner_fields(heap, owner) {
        let Some(current) = read_field(heap, owner, &field) else {
            continue;
        };

        if has_cycle(heap, current) {
            tracing::debug!(field = %field.name, "nulling cyclic field");
            if let Err(err) = set_field_with(heap, owner, &field, Value::null()) {
                tracing::warn!(field = %field.name, error = %err, "cannot null cyclic field");
            }
        } else {
            sanitize(heap, current);
        }
    }
}

fn sanitize_elements(heap: &Heap, container: GcPtr<Object>) {
    let Some(slots) = container.slots() else {
        return;
    };
    for (index, element) in slots.values().into_iter().enumerate() {
        if has_cycle(heap, element) {
            tracing::debug!(index, "nulling cyclic element");
            if let Err(err) = slots.set(index, Value::null()) {
                tracing::warn!(index, error = %err, "cannot null cyclic element");
            }
        } else {
            sanitize(heap, element);
        }
    }
}
