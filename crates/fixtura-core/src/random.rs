//! Random object population
//!
//! [`RandomGenerator`] fills instances of registered classes with random
//! values. Within one call it keeps a pool of the instances it created per
//! class; once a pool is full, or the nesting limit is reached, it hands out
//! an already created instance instead of a new one. Generated graphs can
//! therefore contain cycles, which callers are expected to sanitize.

use crate::gc::{GcPtr, Heap, HeapError};
use crate::object::Object;
use crate::reflect::{set_field_with, FieldDescriptor, FieldError, FieldOwner};
use crate::types::{ClassId, ScalarKind, TypeRef};
use crate::value::Value;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Random generation errors
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Instance allocation failed (unknown or abstract class)
    #[error(transparent)]
    Heap(#[from] HeapError),

    /// A generated value could not be stored
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Inclusive size range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    /// Smallest size
    pub min: usize,
    /// Largest size
    pub max: usize,
}

impl SizeRange {
    /// Range `min..=max`
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

/// Random generator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomConfig {
    /// RNG seed
    pub seed: u64,
    /// Number of elements in generated arrays, lists and maps
    pub collection_size: SizeRange,
    /// Length of generated strings
    pub string_length: SizeRange,
    /// Instances created per class before existing ones are reused
    pub object_pool_size: usize,
    /// Nesting depth after which existing instances are reused
    pub max_depth: usize,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            seed: 123,
            collection_size: SizeRange::new(1, 10),
            string_length: SizeRange::new(1, 32),
            object_pool_size: 10,
            max_depth: 16,
        }
    }
}

/// Attempts at a fresh map key before a map is cut short
const MAX_KEY_DRAWS: usize = 32;

/// Random object generator
pub struct RandomGenerator {
    rng: StdRng,
    config: RandomConfig,
}

/// Per-call instance pools
#[derive(Default)]
struct Pools {
    by_class: FxHashMap<ClassId, Vec<GcPtr<Object>>>,
}

impl RandomGenerator {
    /// Create a generator seeded from `config.seed`
    pub fn new(config: RandomConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    /// Generator settings
    pub fn config(&self) -> &RandomConfig {
        &self.config
    }

    /// Generate a random value of type `ty`
    ///
    /// `Param` and `Any` produce null. Abstract classes and interfaces are
    /// an error at the top level and null when nested.
    pub fn next_value(&mut self, heap: &mut Heap, ty: &TypeRef) -> Result<Value, GenerateError> {
        let mut pools = Pools::default();
        if let TypeRef::Class(class_id) = ty {
            return Ok(Value::Ref(self.instance(heap, *class_id, &mut pools, 0)?));
        }
        self.value(heap, ty, &mut pools, 0)
    }

    /// Generate a random instance of `class_id`
    pub fn next_object(
        &mut self,
        heap: &mut Heap,
        class_id: ClassId,
    ) -> Result<GcPtr<Object>, GenerateError> {
        self.instance(heap, class_id, &mut Pools::default(), 0)
    }

    fn value(
        &mut self,
        heap: &mut Heap,
        ty: &TypeRef,
        pools: &mut Pools,
        depth: usize,
    ) -> Result<Value, GenerateError> {
        Ok(match ty {
            TypeRef::Scalar(kind) => self.scalar(*kind),
            TypeRef::Boxed(kind) => {
                let scalar = self.scalar(*kind);
                heap.alloc_boxed(scalar)
            }
            TypeRef::String => {
                let text = self.string();
                heap.alloc_str(text)
            }
            TypeRef::Array(element) | TypeRef::List(element) => {
                let len = self.size(self.config.collection_size);
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    values.push(self.value(heap, element, pools, depth + 1)?);
                }
                match ty {
                    TypeRef::Array(_) => heap.alloc_array((**element).clone(), values),
                    _ => heap.alloc_list((**element).clone(), values),
                }
            }
            TypeRef::Map(value) => {
                let len = self.size(self.config.collection_size);
                let mut entries = Vec::with_capacity(len);
                let mut used = FxHashSet::default();
                for _ in 0..len {
                    let Some(key) = self.unique_key(&mut used) else {
                        break;
                    };
                    entries.push((key, self.value(heap, value, pools, depth + 1)?));
                }
                heap.alloc_map((**value).clone(), entries)
            }
            TypeRef::Class(class_id) => {
                let instantiable = heap
                    .registry()
                    .class(*class_id)
                    .is_some_and(|class| class.is_instantiable());
                if !instantiable {
                    tracing::debug!(class_id, "leaving non-instantiable class null");
                    return Ok(Value::null());
                }
                Value::Ref(self.instance(heap, *class_id, pools, depth)?)
            }
            TypeRef::Param(_) | TypeRef::Any => Value::null(),
        })
    }

    fn instance(
        &mut self,
        heap: &mut Heap,
        class_id: ClassId,
        pools: &mut Pools,
        depth: usize,
    ) -> Result<GcPtr<Object>, GenerateError> {
        let pool = pools.by_class.entry(class_id).or_default();
        let exhausted = pool.len() >= self.config.object_pool_size || depth >= self.config.max_depth;
        if exhausted && !pool.is_empty() {
            let index = self.rng.gen_range(0..pool.len());
            return Ok(pool[index]);
        }

        let object = heap.new_instance(class_id)?;
        pools.by_class.entry(class_id).or_default().push(object);

        let registry = Arc::clone(heap.registry());
        let owner = FieldOwner::Instance(object);
        for class in registry.ancestors(class_id) {
            for field in class.fields.iter().filter(|f| !f.is_static()) {
                if field.modifiers.is_final() && field.default.is_some() {
                    continue;
                }
                let value = self.value(heap, &field.ty, pools, depth + 1)?;
                set_field_with(heap, owner, &FieldDescriptor::new(class, field), value)?;
            }
        }

        Ok(object)
    }

    fn scalar(&mut self, kind: ScalarKind) -> Value {
        match kind {
            ScalarKind::Bool => Value::Bool(self.rng.gen_bool(0.5)),
            ScalarKind::I8 => Value::I8(self.rng.gen()),
            ScalarKind::I16 => Value::I16(self.rng.gen()),
            ScalarKind::I32 => Value::I32(self.rng.gen()),
            ScalarKind::I64 => Value::I64(self.rng.gen()),
            ScalarKind::F32 => Value::F32(self.rng.gen()),
            ScalarKind::F64 => Value::F64(self.rng.gen()),
            ScalarKind::Char => Value::Char(self.rng.sample(Alphanumeric) as char),
        }
    }

    fn string(&mut self) -> String {
        let len = self.size(self.config.string_length);
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    /// Draw a map key not in `used`; `None` when the key space looks exhausted
    fn unique_key(&mut self, used: &mut FxHashSet<String>) -> Option<String> {
        for _ in 0..MAX_KEY_DRAWS {
            let key = self.string();
            if used.insert(key.clone()) {
                return Some(key);
            }
        }
        tracing::debug!(entries = used.len(), "no fresh map key, truncating map");
        None
    }

    fn size(&mut self, range: SizeRange) -> usize {
        if range.min >= range.max {
            range.min
        } else {
            self.rng.gen_range(range.min..=range.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::has_cycle;
    use crate::object::{FieldDecl, Literal, Modifiers, ObjectKind};
    use crate::reflect::get_field;
    use crate::types::{ClassDef, ClassRegistry};

    fn heap() -> Heap {
        let mut builder = ClassRegistry::builder();
        let shape = builder.class("Shape", ClassDef::new().with_modifiers(Modifiers::ABSTRACT));
        let node = builder.declare("Node");
        builder.define(
            node,
            ClassDef::new()
                .field(FieldDecl::new("id", TypeRef::Scalar(ScalarKind::I64)))
                .field(FieldDecl::new("name", TypeRef::String))
                .field(
                    FieldDecl::new("kind", TypeRef::String)
                        .with_modifiers(Modifiers::FINAL)
                        .with_default(Literal::Str("node".to_string())),
                )
                .field(FieldDecl::new("next", TypeRef::Class(node)))
                .field(FieldDecl::new("shape", TypeRef::Class(shape)))
                .field(FieldDecl::new("tags", TypeRef::list(TypeRef::Boxed(ScalarKind::I32))))
                .field(FieldDecl::new("payload", TypeRef::Any)),
        );
        Heap::new(Arc::new(builder.build().unwrap()))
    }

    fn get(heap: &Heap, object: GcPtr<Object>, name: &str) -> Value {
        get_field(heap, FieldOwner::Instance(object), name)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_populates_fields() {
        let mut heap = heap();
        let node = heap.registry().by_name("Node").unwrap();
        let mut generator = RandomGenerator::new(RandomConfig::default());
        let object = generator.next_object(&mut heap, node).unwrap();

        let name = get(&heap, object, "name");
        let len = name.as_str().unwrap().len();
        assert!((1..=32).contains(&len));
        assert_eq!(get(&heap, object, "kind").as_str(), Some("node"));
        assert!(get(&heap, object, "shape").is_null());
        assert!(get(&heap, object, "payload").is_null());

        let tags = get(&heap, object, "tags").as_object().unwrap().elements().unwrap();
        assert!((1..=10).contains(&tags.len()));
        assert!(tags.iter().all(|tag| tag.as_i32().is_some()));
    }

    #[test]
    fn test_pool_reuse_creates_cycles() {
        let mut heap = heap();
        let node = heap.registry().by_name("Node").unwrap();
        let config = RandomConfig {
            object_pool_size: 3,
            ..RandomConfig::default()
        };
        let mut generator = RandomGenerator::new(config);
        let object = generator.next_object(&mut heap, node).unwrap();
        assert!(has_cycle(&heap, Value::Ref(object)));
    }

    #[test]
    fn test_same_seed_same_values() {
        let mut heap = heap();
        let ty = TypeRef::list(TypeRef::Scalar(ScalarKind::I64));
        let a = RandomGenerator::new(RandomConfig::default())
            .next_value(&mut heap, &ty)
            .unwrap();
        let b = RandomGenerator::new(RandomConfig::default())
            .next_value(&mut heap, &ty)
            .unwrap();
        assert_eq!(
            a.as_object().unwrap().elements(),
            b.as_object().unwrap().elements()
        );
    }

    #[test]
    fn test_abstract_class_is_an_error() {
        let mut heap = heap();
        let shape = heap.registry().by_name("Shape").unwrap();
        let mut generator = RandomGenerator::new(RandomConfig::default());
        assert!(matches!(
            generator.next_object(&mut heap, shape),
            Err(GenerateError::Heap(HeapError::NotInstantiable(_)))
        ));
    }

    #[test]
    fn test_fixed_sizes() {
        let mut heap = heap();
        let config = RandomConfig {
            collection_size: SizeRange::new(4, 4),
            ..RandomConfig::default()
        };
        let mut generator = RandomGenerator::new(config);
        let map = generator
            .next_value(&mut heap, &TypeRef::map(TypeRef::Boxed(ScalarKind::Bool)))
            .unwrap();
        assert_eq!(map.as_object().unwrap().elements().unwrap().len(), 4);
    }

    #[test]
    fn test_map_keys_are_distinct() {
        let mut heap = heap();
        let config = RandomConfig {
            collection_size: SizeRange::new(40, 40),
            string_length: SizeRange::new(1, 1),
            ..RandomConfig::default()
        };
        let mut generator = RandomGenerator::new(config);
        let map = generator
            .next_value(&mut heap, &TypeRef::map(TypeRef::Boxed(ScalarKind::I32)))
            .unwrap();

        let ObjectKind::Map { keys, slots, .. } = &map.as_object().unwrap().kind else {
            panic!("Expected a map");
        };
        let distinct: FxHashSet<&String> = keys.iter().collect();
        assert_eq!(distinct.len(), keys.len());
        assert_eq!(keys.len(), slots.len());
        assert_eq!(keys.len(), 40);
    }
}
