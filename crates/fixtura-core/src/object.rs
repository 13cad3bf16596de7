//! Object model and class system

use crate::types::{ClassId, ScalarKind, TypeRef};
use crate::value::Value;
use bitflags::bitflags;
use std::cell::Cell;
use std::fmt;

/// Field slot storage
///
/// Slots are interior-mutable so a write through one reference to an object
/// is visible through every other reference to it.
pub struct Slots(Box<[Cell<Value>]>);

impl Slots {
    /// Create `count` null slots
    pub fn new(count: usize) -> Self {
        Self((0..count).map(|_| Cell::new(Value::null())).collect())
    }

    /// Create slots holding `values`
    pub fn from_values(values: Vec<Value>) -> Self {
        Self(values.into_iter().map(Cell::new).collect())
    }

    /// Get the value at `index`
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.get(index).map(Cell::get)
    }

    /// Set the value at `index`
    pub fn set(&self, index: usize, value: Value) -> Result<(), String> {
        match self.0.get(index) {
            Some(slot) => {
                slot.set(value);
                Ok(())
            }
            None => Err(format!(
                "Slot index {} out of bounds (block has {} slots)",
                index,
                self.0.len()
            )),
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no slots
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Snapshot of every slot value
    pub fn values(&self) -> Vec<Value> {
        self.0.iter().map(Cell::get).collect()
    }

    /// Base address of the slot block, for offset-based writes
    pub(crate) fn base_ptr(&self) -> *mut u8 {
        // Cell<T> has the same layout as T.
        self.0.as_ptr() as *mut Value as *mut u8
    }

    /// Size of the slot block in bytes
    pub(crate) fn byte_len(&self) -> usize {
        self.0.len() * std::mem::size_of::<Value>()
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(Cell::get)).finish()
    }
}

/// Heap object payload
#[derive(Debug)]
pub enum ObjectKind {
    /// Class instance with one slot per instance field in the hierarchy
    Instance {
        /// Runtime class
        class_id: ClassId,
        /// Instance field slots, parent fields first
        slots: Slots,
    },
    /// Class-level field block of one class
    Statics {
        /// Owning class
        class_id: ClassId,
        /// Static field slots
        slots: Slots,
    },
    /// Fixed-length array
    Array {
        /// Element type
        element: TypeRef,
        /// Elements
        slots: Slots,
    },
    /// Ordered collection
    List {
        /// Element type
        element: TypeRef,
        /// Elements
        slots: Slots,
    },
    /// String-keyed map, entries in insertion order
    Map {
        /// Value type
        value: TypeRef,
        /// Keys, parallel to `slots`
        keys: Vec<String>,
        /// Values
        slots: Slots,
    },
    /// Text
    Str(String),
    /// Boxed scalar
    Boxed(Value),
}

/// Object instance (heap-allocated)
#[derive(Debug)]
pub struct Object {
    /// Payload
    pub kind: ObjectKind,
}

impl Object {
    /// Wrap a payload
    pub fn new(kind: ObjectKind) -> Self {
        Self { kind }
    }

    /// Runtime type of this object
    pub fn runtime_type(&self) -> TypeRef {
        match &self.kind {
            ObjectKind::Instance { class_id, .. } | ObjectKind::Statics { class_id, .. } => {
                TypeRef::Class(*class_id)
            }
            ObjectKind::Array { element, .. } => TypeRef::Array(Box::new(element.clone())),
            ObjectKind::List { element, .. } => TypeRef::List(Box::new(element.clone())),
            ObjectKind::Map { value, .. } => TypeRef::Map(Box::new(value.clone())),
            ObjectKind::Str(_) => TypeRef::String,
            ObjectKind::Boxed(inner) => match inner.scalar_kind() {
                Some(kind) => TypeRef::Boxed(kind),
                None => TypeRef::Any,
            },
        }
    }

    /// Class ID of an instance or static block
    pub fn class_id(&self) -> Option<ClassId> {
        match &self.kind {
            ObjectKind::Instance { class_id, .. } | ObjectKind::Statics { class_id, .. } => {
                Some(*class_id)
            }
            _ => None,
        }
    }

    /// Field or element slots, if this object has any
    pub fn slots(&self) -> Option<&Slots> {
        match &self.kind {
            ObjectKind::Instance { slots, .. }
            | ObjectKind::Statics { slots, .. }
            | ObjectKind::Array { slots, .. }
            | ObjectKind::List { slots, .. }
            | ObjectKind::Map { slots, .. } => Some(slots),
            ObjectKind::Str(_) | ObjectKind::Boxed(_) => None,
        }
    }

    /// Check if this is an array, list or map
    pub fn is_container(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::Array { .. } | ObjectKind::List { .. } | ObjectKind::Map { .. }
        )
    }

    /// Elements of a container, in order (map values for maps)
    pub fn elements(&self) -> Option<Vec<Value>> {
        if self.is_container() {
            self.slots().map(Slots::values)
        } else {
            None
        }
    }

    /// Text of a string object
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ObjectKind::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar held by a boxed object
    pub fn boxed(&self) -> Option<Value> {
        match &self.kind {
            ObjectKind::Boxed(inner) => Some(*inner),
            _ => None,
        }
    }
}

bitflags! {
    /// Access and property flags for classes and fields
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u16 {
        /// No flags
        const NONE      = 0x0000;
        /// Owned by the class rather than by an instance
        const STATIC    = 0x0008;
        /// Assigned once at construction
        const FINAL     = 0x0010;
        /// Excluded from serialization and traversal
        const TRANSIENT = 0x0080;
        /// Backed by native storage
        const NATIVE    = 0x0100;
        /// Interface type
        const INTERFACE = 0x0200;
        /// Abstract type
        const ABSTRACT  = 0x0400;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

impl Modifiers {
    /// Shorthand for `contains(STATIC)`
    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    /// Shorthand for `contains(FINAL)`
    pub fn is_final(self) -> bool {
        self.contains(Modifiers::FINAL)
    }
}

/// Initial value of a field
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Boolean
    Bool(bool),
    /// Integer (narrowed to the field's kind)
    Int(i64),
    /// Float (narrowed to the field's kind)
    Float(f64),
    /// Character
    Char(char),
    /// Text
    Str(String),
}

impl Literal {
    /// Convert to an unboxed scalar of `kind`
    pub fn to_scalar(&self, kind: ScalarKind) -> Option<Value> {
        match (self, kind) {
            (Literal::Bool(b), ScalarKind::Bool) => Some(Value::Bool(*b)),
            (Literal::Int(i), ScalarKind::I8) => i8::try_from(*i).ok().map(Value::I8),
            (Literal::Int(i), ScalarKind::I16) => i16::try_from(*i).ok().map(Value::I16),
            (Literal::Int(i), ScalarKind::I32) => i32::try_from(*i).ok().map(Value::I32),
            (Literal::Int(i), ScalarKind::I64) => Some(Value::I64(*i)),
            (Literal::Int(i), ScalarKind::F32) => Some(Value::F32(*i as f32)),
            (Literal::Int(i), ScalarKind::F64) => Some(Value::F64(*i as f64)),
            (Literal::Float(x), ScalarKind::F32) => Some(Value::F32(*x as f32)),
            (Literal::Float(x), ScalarKind::F64) => Some(Value::F64(*x)),
            (Literal::Char(c), ScalarKind::Char) => Some(Value::Char(*c)),
            _ => None,
        }
    }
}

/// Field declaration
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Field modifiers
    pub modifiers: Modifiers,
    /// Initial value (zero/null when absent)
    pub default: Option<Literal>,
    /// Slot index in the instance block or the static block (set by the registry)
    pub slot: usize,
}

impl FieldDecl {
    /// Declare a field with no modifiers
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: Modifiers::NONE,
            default: None,
            slot: 0,
        }
    }

    /// Add modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = self.modifiers | modifiers;
        self
    }

    /// Set the initial value
    pub fn with_default(mut self, literal: Literal) -> Self {
        self.default = Some(literal);
        self
    }

    /// Check if this is a class-level field
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    /// Byte offset of the field in its slot block
    pub fn offset(&self) -> usize {
        self.slot * std::mem::size_of::<Value>()
    }
}

/// Constructor visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Callable by fixture materialization
    Public,
    /// Not considered by constructor resolution
    Private,
}

/// Constructor parameter, bound to the field it initializes
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Declared parameter type
    pub ty: TypeRef,
    /// Name of the instance field receiving the argument
    pub field: String,
}

impl Param {
    /// Parameter of type `ty` assigned to `field`
    pub fn new(ty: TypeRef, field: impl Into<String>) -> Self {
        Self {
            ty,
            field: field.into(),
        }
    }
}

/// Constructor declaration
#[derive(Debug, Clone)]
pub struct Constructor {
    /// Visibility
    pub visibility: Visibility,
    /// Ordered parameters
    pub params: Vec<Param>,
}

impl Constructor {
    /// Public constructor
    pub fn public(params: Vec<Param>) -> Self {
        Self {
            visibility: Visibility::Public,
            params,
        }
    }

    /// Private constructor
    pub fn private(params: Vec<Param>) -> Self {
        Self {
            visibility: Visibility::Private,
            params,
        }
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Class definition metadata
#[derive(Debug, Clone)]
pub struct Class {
    /// Class ID (unique identifier)
    pub id: ClassId,
    /// Class name
    pub name: String,
    /// Parent class ID (None for root classes)
    pub parent_id: Option<ClassId>,
    /// Class modifiers (ABSTRACT, INTERFACE)
    pub modifiers: Modifiers,
    /// Type parameter names, in order
    pub type_params: Vec<String>,
    /// Declared fields, in declaration order
    pub fields: Vec<FieldDecl>,
    /// Declared constructors, in declaration order
    pub constructors: Vec<Constructor>,
    /// Number of instance slots (including inherited)
    pub instance_slots: usize,
    /// Number of static slots declared by this class
    pub static_slots: usize,
}

impl Class {
    /// Create a new root class
    pub fn new(id: ClassId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: None,
            modifiers: Modifiers::NONE,
            type_params: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            instance_slots: 0,
            static_slots: 0,
        }
    }

    /// Check if instances of this class can be created
    pub fn is_instantiable(&self) -> bool {
        !self
            .modifiers
            .intersects(Modifiers::ABSTRACT | Modifiers::INTERFACE)
    }

    /// Declared fields named `name`
    pub fn declared_fields_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldDecl> {
        self.fields.iter().filter(move |field| field.name == name)
    }

    /// Constructors visible to materialization, in declaration order
    pub fn public_constructors(&self) -> impl Iterator<Item = &Constructor> {
        self.constructors
            .iter()
            .filter(|ctor| ctor.visibility == Visibility::Public)
    }
}
