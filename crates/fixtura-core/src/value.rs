//! Value representation
//!
//! A [`Value`] is either null, an unboxed scalar, or a reference to a heap
//! [`Object`]. Scalars are copied by value and carry no identity. References
//! compare and hash by heap address, so two structurally equal objects are
//! still distinct values.

use crate::gc::GcPtr;
use crate::object::Object;
use crate::types::{ScalarKind, TypeRef};
use std::fmt;

/// Runtime value
#[derive(Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// Null reference
    #[default]
    Null,
    /// `boolean`
    Bool(bool),
    /// `byte`
    I8(i8),
    /// `short`
    I16(i16),
    /// `int`
    I32(i32),
    /// `long`
    I64(i64),
    /// `float`
    F32(f32),
    /// `double`
    F64(f64),
    /// `char`
    Char(char),
    /// Reference to a heap object
    Ref(GcPtr<Object>),
}

impl Value {
    /// Create a null value
    #[inline]
    pub const fn null() -> Self {
        Value::Null
    }

    /// Zero value of an unboxed scalar kind
    pub const fn zero(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::I8 => Value::I8(0),
            ScalarKind::I16 => Value::I16(0),
            ScalarKind::I32 => Value::I32(0),
            ScalarKind::I64 => Value::I64(0),
            ScalarKind::F32 => Value::F32(0.0),
            ScalarKind::F64 => Value::F64(0.0),
            ScalarKind::Char => Value::Char('\0'),
        }
    }

    /// Check if this value is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a heap reference
    #[inline]
    pub const fn is_ref(&self) -> bool {
        matches!(self, Value::Ref(_))
    }

    /// Referenced object, if this is a reference
    #[inline]
    pub fn as_object(&self) -> Option<GcPtr<Object>> {
        match self {
            Value::Ref(ptr) => Some(*ptr),
            _ => None,
        }
    }

    /// Identity of the referenced object (its heap address)
    #[inline]
    pub fn identity(&self) -> Option<usize> {
        self.as_object().map(|ptr| ptr.addr())
    }

    /// Scalar kind of an unboxed scalar
    pub const fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Value::Bool(_) => Some(ScalarKind::Bool),
            Value::I8(_) => Some(ScalarKind::I8),
            Value::I16(_) => Some(ScalarKind::I16),
            Value::I32(_) => Some(ScalarKind::I32),
            Value::I64(_) => Some(ScalarKind::I64),
            Value::F32(_) => Some(ScalarKind::F32),
            Value::F64(_) => Some(ScalarKind::F64),
            Value::Char(_) => Some(ScalarKind::Char),
            Value::Null | Value::Ref(_) => None,
        }
    }

    /// Runtime type (`None` for null)
    pub fn runtime_type(&self) -> Option<TypeRef> {
        match self {
            Value::Null => None,
            Value::Ref(ptr) => Some(ptr.runtime_type()),
            scalar => scalar.scalar_kind().map(TypeRef::Scalar),
        }
    }

    /// The scalar itself, or the scalar held by a boxed object
    pub fn unboxed(&self) -> Option<Value> {
        match self {
            Value::Null => None,
            Value::Ref(ptr) => ptr.boxed(),
            scalar => Some(*scalar),
        }
    }

    /// Extract a boolean (unboxing if needed)
    pub fn as_bool(&self) -> Option<bool> {
        match self.unboxed()? {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Extract an integer of any width (unboxing if needed)
    pub fn as_i64(&self) -> Option<i64> {
        match self.unboxed()? {
            Value::I8(i) => Some(i64::from(i)),
            Value::I16(i) => Some(i64::from(i)),
            Value::I32(i) => Some(i64::from(i)),
            Value::I64(i) => Some(i),
            _ => None,
        }
    }

    /// Extract an `int` (unboxing if needed)
    pub fn as_i32(&self) -> Option<i32> {
        match self.unboxed()? {
            Value::I32(i) => Some(i),
            _ => None,
        }
    }

    /// Extract a float of any width (unboxing if needed)
    pub fn as_f64(&self) -> Option<f64> {
        match self.unboxed()? {
            Value::F32(x) => Some(f64::from(x)),
            Value::F64(x) => Some(x),
            _ => None,
        }
    }

    /// Text of a string object
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Ref(ptr) => ptr.as_str(),
            _ => None,
        }
    }

    /// Get type name for debugging
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Ref(_) => "reference",
            Value::Bool(_) => ScalarKind::Bool.primitive_name(),
            Value::I8(_) => ScalarKind::I8.primitive_name(),
            Value::I16(_) => ScalarKind::I16.primitive_name(),
            Value::I32(_) => ScalarKind::I32.primitive_name(),
            Value::I64(_) => ScalarKind::I64.primitive_name(),
            Value::F32(_) => ScalarKind::F32.primitive_name(),
            Value::F64(_) => ScalarKind::F64.primitive_name(),
            Value::Char(_) => ScalarKind::Char.primitive_name(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "bool({})", b),
            Value::I8(i) => write!(f, "i8({})", i),
            Value::I16(i) => write!(f, "i16({})", i),
            Value::I32(i) => write!(f, "i32({})", i),
            Value::I64(i) => write!(f, "i64({})", i),
            Value::F32(x) => write!(f, "f32({})", x),
            Value::F64(x) => write!(f, "f64({})", x),
            Value::Char(c) => write!(f, "char({:?})", c),
            Value::Ref(ptr) => write!(f, "ref({:#x})", ptr.addr()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I8(i) => write!(f, "{}", i),
            Value::I16(i) => write!(f, "{}", i),
            Value::I32(i) => write!(f, "{}", i),
            Value::I64(i) => write!(f, "{}", i),
            Value::F32(x) => write!(f, "{}", x),
            Value::F64(x) => write!(f, "{}", x),
            Value::Char(c) => write!(f, "{}", c),
            Value::Ref(ptr) => write!(f, "[object@{:#x}]", ptr.addr()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_null() {
        let v = Value::null();
        assert!(v.is_null());
        assert!(!v.is_ref());
        assert_eq!(v.runtime_type(), None);
        assert_eq!(v.type_name(), "null");
        assert_eq!(Value::default(), Value::null());
    }

    #[test]
    fn test_value_scalars() {
        assert_eq!(Value::I32(42).as_i32(), Some(42));
        assert_eq!(Value::I16(-3).as_i64(), Some(-3));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::F32(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::I32(1).as_bool(), None);
        assert_eq!(
            Value::Char('x').runtime_type(),
            Some(TypeRef::Scalar(ScalarKind::Char))
        );
    }

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::null()), "null");
        assert_eq!(format!("{}", Value::Bool(false)), "false");
        assert_eq!(format!("{}", Value::I64(-10)), "-10");
        assert_eq!(format!("{:?}", Value::I32(42)), "i32(42)");
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::I32(42), Value::I32(42));
        assert_ne!(Value::I32(1), Value::I64(1));
        assert_ne!(Value::null(), Value::Bool(false));
    }
}
