//! Fixture materialization
//!
//! Turns a [`Shape`] into a value. Non-generic shapes are populated at
//! random and then sanitized. Generic shapes are built through a
//! constructor with one parameter per type argument, each argument being
//! materialized recursively. When no such constructor exists the raw type
//! is populated at random instead.

mod resolver;

pub use resolver::{invoke_constructor, resolve_constructor, ConstructorDescriptor, ResolveError};

use crate::gc::Heap;
use crate::graph::sanitize;
use crate::random::{GenerateError, RandomConfig, RandomGenerator};
use crate::shape::Shape;
use crate::types::TypeRef;
use crate::value::Value;
use std::sync::Arc;

/// Materialization errors
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    /// Random population failed
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// Constructor invocation failed
    #[error(transparent)]
    Construct(#[from] ResolveError),
}

/// Builds fixture values for shapes
pub struct Materializer {
    generator: RandomGenerator,
}

impl Materializer {
    /// Create a materializer with a fresh random generator
    pub fn new(config: RandomConfig) -> Self {
        Self::with_generator(RandomGenerator::new(config))
    }

    /// Create a materializer around an existing generator
    pub fn with_generator(generator: RandomGenerator) -> Self {
        Self { generator }
    }

    /// Build a value of `shape` in `heap`
    pub fn materialize(&mut self, heap: &mut Heap, shape: &Shape) -> Result<Value, MaterializeError> {
        let registry = Arc::clone(heap.registry());
        tracing::debug!(shape = %shape.display(&registry), "materializing");

        if !shape.is_generic() {
            return self.populate(heap, &shape.raw);
        }

        let ctor = match resolve_constructor(&registry, &shape.raw, &shape.args) {
            Ok(ctor) => ctor,
            Err(err) => {
                tracing::warn!(
                    shape = %shape.display(&registry),
                    error = %err,
                    "no constructor for type arguments, populating at random"
                );
                return self.populate(heap, &shape.to_type());
            }
        };

        let mut args = Vec::with_capacity(shape.args.len());
        for arg in &shape.args {
            args.push(self.materialize(heap, arg)?);
        }
        let object = invoke_constructor(heap, &ctor, args)?;
        Ok(Value::Ref(object))
    }

    fn populate(&mut self, heap: &mut Heap, ty: &TypeRef) -> Result<Value, MaterializeError> {
        let value = self.generator.next_value(heap, ty)?;
        sanitize(heap, value);
        Ok(value)
    }
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new(RandomConfig::default())
    }
}
