//! Fixtura Core
//!
//! Test fixture generation over a small reflective object model:
//! - **Object model**: values, heap objects, classes (`value`, `object`, `gc`, `types`)
//! - **Field access**: named, scope-aware field reads and writes, including
//!   a raw write path for final fields (`reflect`)
//! - **Graph walks**: cycle detection and cycle removal (`graph`)
//! - **Materialization**: random population and constructor-based building
//!   of generic shapes (`random`, `materialize`)
//! - **JSON**: encoding and shape-guided decoding (`json`)
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtura_core::{ClassRegistry, Heap, Materializer, Shape};
//!
//! let registry = Arc::new(builder.build()?);
//! let mut heap = Heap::new(Arc::clone(&registry));
//! let shape = Shape::parse(&registry, "Pair<Integer, Integer>")?;
//! let value = Materializer::default().materialize(&mut heap, &shape)?;
//! let text = fixtura_core::json::to_json_string(&heap, value)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Built-in type classification
pub mod builtin;

/// Heap allocation and object handles
pub mod gc;

/// Cycle detection and removal
pub mod graph;

/// JSON encoding and decoding
pub mod json;

/// Shape materialization
pub mod materialize;

/// Heap object layout and class metadata
pub mod object;

/// Random object population
pub mod random;

/// Reflective field access
pub mod reflect;

/// Target shapes
pub mod shape;

/// Type references and the class registry
pub mod types;

/// Runtime values
pub mod value;

pub use builtin::is_leaf;
pub use gc::{GcPtr, Heap, HeapError};
pub use graph::{has_cycle, sanitize};
pub use json::JsonError;
pub use materialize::{MaterializeError, Materializer, ResolveError};
pub use object::{Class, Constructor, FieldDecl, Literal, Modifiers, Object, ObjectKind, Param};
pub use random::{GenerateError, RandomConfig, RandomGenerator, SizeRange};
pub use reflect::{FieldError, FieldOwner};
pub use shape::{Shape, ShapeError};
pub use types::{ClassDef, ClassId, ClassRegistry, RegistryError, ScalarKind, TypeRef};
pub use value::Value;
