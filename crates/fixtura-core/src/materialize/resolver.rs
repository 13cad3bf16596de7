//! Constructor resolution and invocation
//!
//! Field types of a generic class only name its type parameters, so the
//! arguments of a generic shape are injected through a constructor. The
//! constructor is picked by arity alone: the first public constructor, in
//! declaration order, taking as many parameters as the shape has type
//! arguments. Overloads of equal arity are not told apart.

use crate::gc::{GcPtr, Heap, HeapError};
use crate::object::{Object, Param, Visibility};
use crate::reflect::{set_field, FieldError, FieldOwner};
use crate::shape::Shape;
use crate::types::{ClassId, ClassRegistry, TypeRef};
use crate::value::Value;

/// Constructor resolution and invocation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// No public constructor has one parameter per type argument
    #[error(
        "No suitable constructor of {type_name} for type arguments [{}]",
        .type_arguments.join(", ")
    )]
    NoSuitableConstructor {
        /// Raw type name
        type_name: String,
        /// Type arguments, as text
        type_arguments: Vec<String>,
    },

    /// Wrong number of constructor arguments
    #[error("Constructor of {type_name} takes {expected} arguments but {found} were given")]
    ArityMismatch {
        /// Class name
        type_name: String,
        /// Constructor arity
        expected: usize,
        /// Arguments given
        found: usize,
    },

    /// Instance allocation failed
    #[error(transparent)]
    Heap(#[from] HeapError),

    /// An argument could not be bound to its field
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// A selected constructor
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDescriptor {
    /// Class to instantiate
    pub class_id: ClassId,
    /// Class name
    pub type_name: String,
    /// Position among the class's declared constructors
    pub index: usize,
    /// Parameters, in order
    pub params: Vec<Param>,
}

impl ConstructorDescriptor {
    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Select the first public constructor of `raw` whose arity matches the
/// number of `type_arguments`
pub fn resolve_constructor(
    registry: &ClassRegistry,
    raw: &TypeRef,
    type_arguments: &[Shape],
) -> Result<ConstructorDescriptor, ResolveError> {
    let no_match = || ResolveError::NoSuitableConstructor {
        type_name: raw.display(registry).to_string(),
        type_arguments: type_arguments
            .iter()
            .map(|arg| arg.display(registry).to_string())
            .collect(),
    };

    let TypeRef::Class(class_id) = raw else {
        return Err(no_match());
    };
    let class = registry.class(*class_id).ok_or_else(no_match)?;

    class
        .constructors
        .iter()
        .enumerate()
        .filter(|(_, ctor)| ctor.visibility == Visibility::Public)
        .find(|(_, ctor)| ctor.arity() == type_arguments.len())
        .map(|(index, ctor)| ConstructorDescriptor {
            class_id: class.id,
            type_name: class.name.clone(),
            index,
            params: ctor.params.clone(),
        })
        .ok_or_else(no_match)
}

/// Create an instance through `ctor`
///
/// The instance starts with its field defaults; each argument is then
/// written to the field its parameter is bound to, final fields included.
/// Scalars given for reference parameters are boxed.
pub fn invoke_constructor(
    heap: &mut Heap,
    ctor: &ConstructorDescriptor,
    args: Vec<Value>,
) -> Result<GcPtr<Object>, ResolveError> {
    if args.len() != ctor.arity() {
        return Err(ResolveError::ArityMismatch {
            type_name: ctor.type_name.clone(),
            expected: ctor.arity(),
            found: args.len(),
        });
    }

    let object = heap.new_instance(ctor.class_id)?;
    for (param, arg) in ctor.params.iter().zip(args) {
        let arg = if param.ty.is_reference() {
            heap.alloc_boxed(arg)
        } else {
            arg
        };
        set_field(heap, FieldOwner::Instance(object), &param.field, arg)?;
    }

    Ok(object)
}
