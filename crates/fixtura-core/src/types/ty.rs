//! Declared and runtime type references
//!
//! A [`TypeRef`] names the type of a field, a constructor parameter, or the
//! runtime type of a value. Scalar kinds come in two flavours: unboxed
//! (`int`) and boxed (`Integer`), mirroring the wrapper types a fixture
//! schema can declare.

use super::registry::ClassRegistry;
use std::fmt;

/// Class ID (index into the class registry)
pub type ClassId = usize;

/// Scalar value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Boolean
    Bool,
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Unicode scalar value
    Char,
}

impl ScalarKind {
    /// Every scalar kind, in declaration order
    pub const ALL: [ScalarKind; 8] = [
        ScalarKind::Bool,
        ScalarKind::I8,
        ScalarKind::I16,
        ScalarKind::I32,
        ScalarKind::I64,
        ScalarKind::F32,
        ScalarKind::F64,
        ScalarKind::Char,
    ];

    /// Name of the unboxed form (`int`, `boolean`, ...)
    pub const fn primitive_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "boolean",
            ScalarKind::I8 => "byte",
            ScalarKind::I16 => "short",
            ScalarKind::I32 => "int",
            ScalarKind::I64 => "long",
            ScalarKind::F32 => "float",
            ScalarKind::F64 => "double",
            ScalarKind::Char => "char",
        }
    }

    /// Name of the boxed form (`Integer`, `Boolean`, ...)
    pub const fn boxed_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "Boolean",
            ScalarKind::I8 => "Byte",
            ScalarKind::I16 => "Short",
            ScalarKind::I32 => "Integer",
            ScalarKind::I64 => "Long",
            ScalarKind::F32 => "Float",
            ScalarKind::F64 => "Double",
            ScalarKind::Char => "Character",
        }
    }
}

/// A declared or runtime type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Unboxed scalar, stored inline
    Scalar(ScalarKind),
    /// Boxed scalar, heap-allocated
    Boxed(ScalarKind),
    /// Immutable text
    String,
    /// Fixed-length array
    Array(Box<TypeRef>),
    /// Ordered growable collection
    List(Box<TypeRef>),
    /// String-keyed map
    Map(Box<TypeRef>),
    /// Registered class
    Class(ClassId),
    /// Type parameter of the declaring class (erased at runtime)
    Param(usize),
    /// Any reference
    Any,
}

impl TypeRef {
    /// `List<element>`
    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(Box::new(element))
    }

    /// `element[]`
    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    /// `Map<String, value>`
    pub fn map(value: TypeRef) -> Self {
        TypeRef::Map(Box::new(value))
    }

    /// True for every type except unboxed scalars
    pub fn is_reference(&self) -> bool {
        !matches!(self, TypeRef::Scalar(_))
    }

    /// Scalar kind of a scalar or boxed type
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            TypeRef::Scalar(kind) | TypeRef::Boxed(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Element type of a container type
    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(element) | TypeRef::List(element) | TypeRef::Map(element) => {
                Some(element)
            }
            _ => None,
        }
    }

    /// Replace `Param(i)` with `args[i]`; parameters without an argument
    /// erase to `Any`.
    pub fn substitute(&self, args: &[TypeRef]) -> TypeRef {
        match self {
            TypeRef::Param(index) => args.get(*index).cloned().unwrap_or(TypeRef::Any),
            TypeRef::Array(element) => TypeRef::Array(Box::new(element.substitute(args))),
            TypeRef::List(element) => TypeRef::List(Box::new(element.substitute(args))),
            TypeRef::Map(value) => TypeRef::Map(Box::new(value.substitute(args))),
            other => other.clone(),
        }
    }

    /// Display adapter resolving class names through `registry`
    pub fn display<'a>(&'a self, registry: &'a ClassRegistry) -> TypeDisplay<'a> {
        TypeDisplay { ty: self, registry }
    }
}

/// Displays a [`TypeRef`] with class names
pub struct TypeDisplay<'a> {
    ty: &'a TypeRef,
    registry: &'a ClassRegistry,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            TypeRef::Scalar(kind) => f.write_str(kind.primitive_name()),
            TypeRef::Boxed(kind) => f.write_str(kind.boxed_name()),
            TypeRef::String => f.write_str("String"),
            TypeRef::Array(element) => write!(f, "{}[]", element.display(self.registry)),
            TypeRef::List(element) if **element == TypeRef::Any => f.write_str("List"),
            TypeRef::List(element) => write!(f, "List<{}>", element.display(self.registry)),
            TypeRef::Map(value) if **value == TypeRef::Any => f.write_str("Map"),
            TypeRef::Map(value) => write!(f, "Map<String, {}>", value.display(self.registry)),
            TypeRef::Class(id) => match self.registry.class(*id) {
                Some(class) => f.write_str(&class.name),
                None => write!(f, "<class #{}>", id),
            },
            TypeRef::Param(index) => write!(f, "T{}", index),
            TypeRef::Any => f.write_str("Object"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_params() {
        let ty = TypeRef::list(TypeRef::Param(1));
        let args = [TypeRef::String, TypeRef::Boxed(ScalarKind::I32)];
        assert_eq!(ty.substitute(&args), TypeRef::list(TypeRef::Boxed(ScalarKind::I32)));
        assert_eq!(TypeRef::Param(5).substitute(&args), TypeRef::Any);
    }

    #[test]
    fn test_reference_types() {
        assert!(!TypeRef::Scalar(ScalarKind::I32).is_reference());
        assert!(TypeRef::Boxed(ScalarKind::I32).is_reference());
        assert!(TypeRef::String.is_reference());
        assert!(TypeRef::Any.is_reference());
    }

    #[test]
    fn test_display() {
        let registry = ClassRegistry::new();
        assert_eq!(TypeRef::Scalar(ScalarKind::I64).display(&registry).to_string(), "long");
        assert_eq!(TypeRef::Boxed(ScalarKind::Char).display(&registry).to_string(), "Character");
        assert_eq!(TypeRef::list(TypeRef::Any).display(&registry).to_string(), "List");
        assert_eq!(
            TypeRef::map(TypeRef::Boxed(ScalarKind::I32)).display(&registry).to_string(),
            "Map<String, Integer>"
        );
        assert_eq!(TypeRef::array(TypeRef::String).display(&registry).to_string(), "String[]");
    }
}
