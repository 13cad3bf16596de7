//! Built-in type classification
//!
//! Scalar kinds, boxed or not, are leaves: graph walks stop at them. Every
//! other type is composite and may hold references.

use crate::types::{ScalarKind, TypeRef};

/// Check if `ty` is a leaf (scalar or boxed scalar) type
///
/// Returns false for the null type (`None`).
pub fn is_leaf(ty: Option<&TypeRef>) -> bool {
    matches!(ty, Some(TypeRef::Scalar(_)) | Some(TypeRef::Boxed(_)))
}

/// Look up a built-in type by name
///
/// Recognizes primitive names (`int`), wrapper names (`Integer`), `String`,
/// `Object`, and the raw container names `List` and `Map`.
pub fn lookup_builtin_type(name: &str) -> Option<TypeRef> {
    for kind in ScalarKind::ALL {
        if name == kind.primitive_name() {
            return Some(TypeRef::Scalar(kind));
        }
        if name == kind.boxed_name() {
            return Some(TypeRef::Boxed(kind));
        }
    }
    match name {
        "String" => Some(TypeRef::String),
        "Object" => Some(TypeRef::Any),
        "List" | "ArrayList" => Some(TypeRef::list(TypeRef::Any)),
        "Map" | "HashMap" => Some(TypeRef::map(TypeRef::Any)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_types() {
        for kind in ScalarKind::ALL {
            assert!(is_leaf(Some(&TypeRef::Scalar(kind))));
            assert!(is_leaf(Some(&TypeRef::Boxed(kind))));
        }
    }

    #[test]
    fn test_composite_types() {
        assert!(!is_leaf(None));
        assert!(!is_leaf(Some(&TypeRef::String)));
        assert!(!is_leaf(Some(&TypeRef::Any)));
        assert!(!is_leaf(Some(&TypeRef::Class(0))));
        assert!(!is_leaf(Some(&TypeRef::list(TypeRef::Boxed(ScalarKind::I32)))));
    }

    #[test]
    fn test_lookup_builtin_type() {
        assert_eq!(lookup_builtin_type("int"), Some(TypeRef::Scalar(ScalarKind::I32)));
        assert_eq!(lookup_builtin_type("Integer"), Some(TypeRef::Boxed(ScalarKind::I32)));
        assert_eq!(lookup_builtin_type("Character"), Some(TypeRef::Boxed(ScalarKind::Char)));
        assert_eq!(lookup_builtin_type("List"), Some(TypeRef::list(TypeRef::Any)));
        assert_eq!(lookup_builtin_type("People"), None);
    }
}
