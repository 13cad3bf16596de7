//! Field lookup, reads and writes
//!
//! Fields are found by name, starting at the owner's class and walking up
//! the parent chain. The nearest class declaring a matching field wins, so a
//! subclass field shadows a parent field of the same name. Two fields with
//! the same name in one class are an error.

use super::raw::raw_access;
use super::FieldError;
use crate::gc::{GcPtr, Heap};
use crate::object::{Class, FieldDecl, Modifiers, Object, ObjectKind};
use crate::types::{ClassId, TypeRef};
use crate::value::Value;
use std::fmt;

/// Whether a field belongs to instances or to the class itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// One value per instance
    Instance,
    /// One value per class ("static")
    Class,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Instance => f.write_str("instance"),
            Scope::Class => f.write_str("static"),
        }
    }
}

/// Resolved field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Class declaring the field
    pub declaring_class: ClassId,
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Field modifiers
    pub modifiers: Modifiers,
    /// Slot index in the instance or static block
    pub slot: usize,
    /// Byte offset in the instance or static block
    pub offset: usize,
}

impl FieldDescriptor {
    /// Describe `field` as declared by `class`
    pub fn new(class: &Class, field: &FieldDecl) -> Self {
        Self {
            declaring_class: class.id,
            name: field.name.clone(),
            ty: field.ty.clone(),
            modifiers: field.modifiers,
            slot: field.slot,
            offset: field.offset(),
        }
    }

    /// Field scope
    pub fn scope(&self) -> Scope {
        if self.modifiers.is_static() {
            Scope::Class
        } else {
            Scope::Instance
        }
    }

    /// Check if the field is normally immutable
    pub fn is_final(&self) -> bool {
        self.modifiers.is_final()
    }
}

/// The object or class whose fields are accessed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldOwner {
    /// An object; fields are searched from its runtime class
    Instance(GcPtr<Object>),
    /// A class; only its static fields are writable
    Class(ClassId),
}

impl FieldOwner {
    /// Owner for a value (null and scalars have no fields)
    pub fn from_value(value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Ref(ptr) => Ok(FieldOwner::Instance(ptr)),
            Value::Null => Err(FieldError::NullOwner),
            scalar => Err(FieldError::InvalidOwner(scalar.type_name())),
        }
    }

    /// Scope a by-name write through this owner targets
    pub fn scope(&self) -> Scope {
        match self {
            FieldOwner::Instance(_) => Scope::Instance,
            FieldOwner::Class(_) => Scope::Class,
        }
    }

    /// Class where field search starts
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            FieldOwner::Instance(ptr) => match &ptr.kind {
                ObjectKind::Instance { class_id, .. } => Some(*class_id),
                _ => None,
            },
            FieldOwner::Class(id) => Some(*id),
        }
    }

    fn name(&self, heap: &Heap) -> String {
        match self.class_id().and_then(|id| heap.registry().class(id)) {
            Some(class) => class.name.clone(),
            None => match self {
                FieldOwner::Instance(ptr) => ptr
                    .runtime_type()
                    .display(heap.registry())
                    .to_string(),
                FieldOwner::Class(id) => format!("<class #{}>", id),
            },
        }
    }
}

/// Find the nearest field named `name` that satisfies `predicate`
///
/// Classes are searched nearest first. Within one class, more than one field
/// named `name` is an [`FieldError::Ambiguous`] error. A class whose single
/// matching field fails the predicate does not stop the search.
pub fn find_field<P>(
    heap: &Heap,
    owner: FieldOwner,
    name: &str,
    predicate: P,
) -> Result<Option<FieldDescriptor>, FieldError>
where
    P: Fn(&FieldDescriptor) -> bool,
{
    let Some(start) = owner.class_id() else {
        return Ok(None);
    };

    for class in heap.registry().ancestors(start) {
        let mut named = class.declared_fields_named(name);
        let Some(field) = named.next() else {
            continue;
        };
        if named.next().is_some() {
            return Err(FieldError::Ambiguous {
                field: name.to_string(),
                owner: class.name.clone(),
            });
        }
        let descriptor = FieldDescriptor::new(class, field);
        if predicate(&descriptor) {
            return Ok(Some(descriptor));
        }
    }

    Ok(None)
}

/// Read the field named `name`; `None` when there is no such field
pub fn get_field(heap: &Heap, owner: FieldOwner, name: &str) -> Result<Option<Value>, FieldError> {
    get_field_filtered(heap, owner, name, |_| true)
}

/// Read the field named `name` if it satisfies `predicate`
pub fn get_field_filtered<P>(
    heap: &Heap,
    owner: FieldOwner,
    name: &str,
    predicate: P,
) -> Result<Option<Value>, FieldError>
where
    P: Fn(&FieldDescriptor) -> bool,
{
    Ok(find_field(heap, owner, name, predicate)?.and_then(|field| read_field(heap, owner, &field)))
}

/// Read a resolved field
pub fn read_field(heap: &Heap, owner: FieldOwner, field: &FieldDescriptor) -> Option<Value> {
    match field.scope() {
        Scope::Class => heap
            .static_block(field.declaring_class)
            .and_then(|block| block.slots().and_then(|slots| slots.get(field.slot))),
        Scope::Instance => match owner {
            FieldOwner::Instance(ptr) if inherits(heap, &ptr, field.declaring_class) => {
                ptr.slots().and_then(|slots| slots.get(field.slot))
            }
            _ => None,
        },
    }
}

/// Write the field named `name`
///
/// Instance owners resolve instance fields and class owners resolve static
/// fields. When the only field with that name has the other scope, the
/// write is refused with [`FieldError::ScopeMismatch`].
pub fn set_field(heap: &Heap, owner: FieldOwner, name: &str, value: Value) -> Result<(), FieldError> {
    let scope = owner.scope();
    if let Some(field) = find_field(heap, owner, name, |field| field.scope() == scope)? {
        return set_field_with(heap, owner, &field, value);
    }

    if find_field(heap, owner, name, |_| true)?.is_some() {
        Err(FieldError::ScopeMismatch {
            expected: scope,
            field: name.to_string(),
            owner: owner.name(heap),
        })
    } else {
        Err(FieldError::FieldNotFound {
            scope,
            field: name.to_string(),
            owner: owner.name(heap),
        })
    }
}

/// Write a resolved field
///
/// Static fields are written into the declaring class's static block
/// whatever the owner. Final fields go through the raw write path; other
/// fields go through the checked path, which also verifies the value's type.
pub fn set_field_with(
    heap: &Heap,
    owner: FieldOwner,
    field: &FieldDescriptor,
    value: Value,
) -> Result<(), FieldError> {
    let block = target_block(heap, owner, field)?;
    let Some(slots) = block.slots() else {
        return Err(not_found(heap, owner, field));
    };
    let value = coerce(field, value)?;

    if field.is_final() {
        raw_access()?.write_field(slots, field, value)
    } else {
        check_assignable(heap, field, value)?;
        slots
            .set(field.slot, value)
            .map_err(|_| not_found(heap, owner, field))
    }
}

fn target_block(
    heap: &Heap,
    owner: FieldOwner,
    field: &FieldDescriptor,
) -> Result<GcPtr<Object>, FieldError> {
    match field.scope() {
        Scope::Class => heap
            .static_block(field.declaring_class)
            .ok_or_else(|| not_found(heap, owner, field)),
        Scope::Instance => match owner {
            FieldOwner::Instance(ptr) if inherits(heap, &ptr, field.declaring_class) => Ok(ptr),
            FieldOwner::Instance(_) => Err(not_found(heap, owner, field)),
            FieldOwner::Class(_) => Err(FieldError::ScopeMismatch {
                expected: Scope::Instance,
                field: field.name.clone(),
                owner: owner.name(heap),
            }),
        },
    }
}

fn not_found(heap: &Heap, owner: FieldOwner, field: &FieldDescriptor) -> FieldError {
    FieldError::FieldNotFound {
        scope: field.scope(),
        field: field.name.clone(),
        owner: owner.name(heap),
    }
}

/// Check if `object` is an instance of `class_id` or of a subclass
fn inherits(heap: &Heap, object: &GcPtr<Object>, class_id: ClassId) -> bool {
    match &object.kind {
        ObjectKind::Instance { class_id: runtime, .. } => heap
            .registry()
            .ancestors(*runtime)
            .any(|class| class.id == class_id),
        _ => false,
    }
}

/// Unbox values for scalar fields; refuse scalars for reference fields
fn coerce(field: &FieldDescriptor, value: Value) -> Result<Value, FieldError> {
    let mismatch = || FieldError::IncompatibleValue {
        field: field.name.clone(),
        expected: field.ty.clone(),
        found: value.type_name(),
    };
    match &field.ty {
        TypeRef::Scalar(kind) => match value.unboxed() {
            Some(scalar) if scalar.scalar_kind() == Some(*kind) => Ok(scalar),
            _ => Err(mismatch()),
        },
        _ if value.is_null() || value.is_ref() => Ok(value),
        _ => Err(mismatch()),
    }
}

/// Checked-path type test for reference fields
fn check_assignable(heap: &Heap, field: &FieldDescriptor, value: Value) -> Result<(), FieldError> {
    let Some(object) = value.as_object() else {
        return Ok(());
    };
    let fits = match (&field.ty, &object.kind) {
        (TypeRef::Scalar(_), _) => true,
        (TypeRef::Any | TypeRef::Param(_), _) => true,
        (TypeRef::String, ObjectKind::Str(_)) => true,
        (TypeRef::Boxed(kind), ObjectKind::Boxed(inner)) => inner.scalar_kind() == Some(*kind),
        (TypeRef::Array(_), ObjectKind::Array { .. }) => true,
        (TypeRef::List(_), ObjectKind::List { .. }) => true,
        (TypeRef::Map(_), ObjectKind::Map { .. }) => true,
        (TypeRef::Class(target), ObjectKind::Instance { .. }) => inherits(heap, &object, *target),
        _ => false,
    };
    if fits {
        Ok(())
    } else {
        Err(FieldError::IncompatibleValue {
            field: field.name.clone(),
            expected: field.ty.clone(),
            found: "reference",
        })
    }
}

/// Descriptors of every field an owner holds
///
/// For an instance: the fields of its runtime class and of each ancestor,
/// nearest class first. Shadowed parent fields are included, since each
/// occupies its own slot. For a class: that class's static fields.
pub fn owner_fields(heap: &Heap, owner: FieldOwner) -> Vec<FieldDescriptor> {
    let Some(class_id) = owner.class_id() else {
        return Vec::new();
    };
    match owner {
        FieldOwner::Instance(_) => heap
            .registry()
            .ancestors(class_id)
            .flat_map(|class| class.fields.iter().map(move |field| FieldDescriptor::new(class, field)))
            .collect(),
        FieldOwner::Class(_) => declared_fields(heap, class_id)
            .into_iter()
            .filter(|field| field.scope() == Scope::Class)
            .collect(),
    }
}

/// Descriptors of the fields declared by `class_id` itself, in order
pub fn declared_fields(heap: &Heap, class_id: ClassId) -> Vec<FieldDescriptor> {
    heap.registry()
        .class(class_id)
        .map(|class| {
            class
                .fields
                .iter()
                .map(|field| FieldDescriptor::new(class, field))
                .collect()
        })
        .unwrap_or_default()
}

