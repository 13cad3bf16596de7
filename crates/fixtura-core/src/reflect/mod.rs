//! Reflective field access
//!
//! Named field lookup across a class hierarchy, scope-aware reads and
//! writes, and the raw write path used for final fields.
//!
//! Lookup misses are not errors for reads (`get_*` return `Ok(None)`), but
//! they are for writes. Two same-named fields in one class are always an
//! error.

mod field;
pub mod raw;

pub use field::{
    declared_fields, find_field, get_field, get_field_filtered, owner_fields, read_field,
    set_field, set_field_with, FieldDescriptor, FieldOwner, Scope,
};
pub use raw::{raw_access, RawFieldAccess};

use crate::types::TypeRef;

/// Field access errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// No field with that name and scope in the hierarchy
    #[error("No {scope} field named \"{field}\" could be found in the \"{owner}\" class hierarchy")]
    FieldNotFound {
        /// Scope searched
        scope: Scope,
        /// Field name
        field: String,
        /// Owner type name
        owner: String,
    },

    /// More than one field with that name in one class
    #[error("Two or more fields named \"{field}\" are declared by \"{owner}\"")]
    Ambiguous {
        /// Field name
        field: String,
        /// Declaring class name
        owner: String,
    },

    /// The field exists, but with the other scope
    #[error("Field \"{field}\" in the \"{owner}\" class hierarchy does not have {expected} scope")]
    ScopeMismatch {
        /// Scope the owner required
        expected: Scope,
        /// Field name
        field: String,
        /// Owner type name
        owner: String,
    },

    /// The value does not fit the field's declared type
    #[error("Cannot assign {found} to field \"{field}\" of type {expected:?}")]
    IncompatibleValue {
        /// Field name
        field: String,
        /// Declared type
        expected: TypeRef,
        /// Kind of the rejected value
        found: &'static str,
    },

    /// Field access on null
    #[error("The object containing the field cannot be null")]
    NullOwner,

    /// Field access on a scalar
    #[error("A {0} value has no fields")]
    InvalidOwner(&'static str),

    /// The raw write path could not be used
    #[error("Raw field access unavailable: {0}")]
    RawAccessUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::Heap;
    use crate::object::{FieldDecl, Literal, Modifiers};
    use crate::types::{ClassDef, ClassRegistry, ScalarKind};
    use crate::value::Value;
    use std::sync::Arc;

    fn heap() -> Heap {
        let mut builder = ClassRegistry::builder();
        let who = builder.class(
            "WhoIAm",
            ClassDef::new()
                .field(
                    FieldDecl::new("name", TypeRef::String)
                        .with_modifiers(Modifiers::FINAL)
                        .with_default(Literal::Str("halley".to_string())),
                )
                .field(
                    FieldDecl::new("country", TypeRef::String)
                        .with_modifiers(Modifiers::STATIC | Modifiers::FINAL)
                        .with_default(Literal::Str("wuwei".to_string())),
                )
                .field(
                    FieldDecl::new("age", TypeRef::Scalar(ScalarKind::I32))
                        .with_modifiers(Modifiers::FINAL)
                        .with_default(Literal::Int(3)),
                ),
        );
        builder.class("WhereIGo", ClassDef::new().extends(who));
        builder.class(
            "Twins",
            ClassDef::new()
                .field(FieldDecl::new("x", TypeRef::Any))
                .field(FieldDecl::new("x", TypeRef::Any)),
        );
        Heap::new(Arc::new(builder.build().unwrap()))
    }

    fn instance(heap: &mut Heap, name: &str) -> FieldOwner {
        let id = heap.registry().by_name(name).unwrap();
        FieldOwner::Instance(heap.new_instance(id).unwrap())
    }

    #[test]
    fn test_get_missing_field_is_none() {
        let mut heap = heap();
        let owner = instance(&mut heap, "WhereIGo");
        assert_eq!(get_field(&heap, owner, "died"), Ok(None));
    }

    #[test]
    fn test_get_inherited_and_static_fields() {
        let mut heap = heap();
        let owner = instance(&mut heap, "WhereIGo");
        let name = get_field(&heap, owner, "name").unwrap().unwrap();
        assert_eq!(name.as_str(), Some("halley"));
        let country = get_field(&heap, owner, "country").unwrap().unwrap();
        assert_eq!(country.as_str(), Some("wuwei"));
    }

    #[test]
    fn test_ambiguous_field() {
        let mut heap = heap();
        let owner = instance(&mut heap, "Twins");
        assert!(matches!(
            get_field(&heap, owner, "x"),
            Err(FieldError::Ambiguous { .. })
        ));
    }

    #[test]
    fn test_filtered_get_skips_rejected_field() {
        let mut heap = heap();
        let owner = instance(&mut heap, "WhoIAm");
        let value = get_field_filtered(&heap, owner, "name", |f| !f.is_final()).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_set_final_scalar_field() {
        let mut heap = heap();
        let owner = instance(&mut heap, "WhoIAm");
        set_field(&heap, owner, "age", Value::I32(40)).unwrap();
        assert_eq!(get_field(&heap, owner, "age"), Ok(Some(Value::I32(40))));

        // Boxed values are unboxed into scalar fields
        let boxed = heap.alloc_boxed(Value::I32(41));
        set_field(&heap, owner, "age", boxed).unwrap();
        assert_eq!(get_field(&heap, owner, "age"), Ok(Some(Value::I32(41))));

        assert!(matches!(
            set_field(&heap, owner, "age", Value::null()),
            Err(FieldError::IncompatibleValue { .. })
        ));
    }

    #[test]
    fn test_scope_mismatch_message() {
        let mut heap = heap();
        let owner = instance(&mut heap, "WhoIAm");
        let err = set_field(&heap, owner, "country", Value::null()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Field \"country\" in the \"WhoIAm\" class hierarchy does not have instance scope"
        );
    }

    #[test]
    fn test_not_found_message() {
        let mut heap = heap();
        let owner = instance(&mut heap, "WhereIGo");
        let err = set_field(&heap, owner, "died", Value::null()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No instance field named \"died\" could be found in the \"WhereIGo\" class hierarchy"
        );
    }

    #[test]
    fn test_owner_from_value() {
        assert_eq!(FieldOwner::from_value(Value::null()), Err(FieldError::NullOwner));
        assert_eq!(
            FieldOwner::from_value(Value::I32(1)),
            Err(FieldError::InvalidOwner("int"))
        );
    }
}
