//! JSON encoding of fixture values
//!
//! Instances encode as objects of their instance fields (static and
//! transient fields excluded, nulls omitted). Decoding is guided by a
//! [`Shape`]: class type parameters take the shape's arguments, and
//! positions with no static type are decoded from the JSON itself.

use crate::gc::{GcPtr, Heap, HeapError};
use crate::object::{Modifiers, Object, ObjectKind};
use crate::reflect::{set_field_with, FieldDescriptor, FieldError, FieldOwner};
use crate::shape::Shape;
use crate::types::{ClassId, ScalarKind, TypeRef};
use crate::value::Value;
use rustc_hash::FxHashSet;
use serde_json::{Map, Number};
use std::sync::Arc;

/// JSON conversion errors
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    /// The value refers back to an object that is being encoded
    #[error("Cannot encode cyclic reference to {0}")]
    Cycle(String),

    /// Class-level field blocks have no JSON form
    #[error("Cannot encode static field block of {0}")]
    StaticBlock(String),

    /// JSON does not match the expected type
    #[error("Expected {expected}, found JSON {found}")]
    TypeMismatch {
        /// Expected type
        expected: String,
        /// JSON kind found
        found: &'static str,
    },

    /// Malformed JSON text
    #[error("Invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    /// Instance allocation failed
    #[error(transparent)]
    Heap(#[from] HeapError),

    /// A decoded value could not be stored
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Encode `value` as JSON
pub fn to_json(heap: &Heap, value: Value) -> Result<serde_json::Value, JsonError> {
    Encoder {
        heap,
        in_progress: FxHashSet::default(),
    }
    .encode(value)
}

/// Encode `value` as pretty-printed JSON text
pub fn to_json_string(heap: &Heap, value: Value) -> Result<String, JsonError> {
    Ok(serde_json::to_string_pretty(&to_json(heap, value)?)?)
}

/// Decode `json` as a value of `shape`
pub fn from_json(heap: &mut Heap, json: &serde_json::Value, shape: &Shape) -> Result<Value, JsonError> {
    decode_shape(heap, json, shape)
}

/// Decode JSON text as a value of `shape`
pub fn from_json_str(heap: &mut Heap, text: &str, shape: &Shape) -> Result<Value, JsonError> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    from_json(heap, &json, shape)
}

struct Encoder<'h> {
    heap: &'h Heap,
    in_progress: FxHashSet<usize>,
}

impl Encoder<'_> {
    fn encode(&mut self, value: Value) -> Result<serde_json::Value, JsonError> {
        Ok(match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::I8(i) => serde_json::Value::from(i),
            Value::I16(i) => serde_json::Value::from(i),
            Value::I32(i) => serde_json::Value::from(i),
            Value::I64(i) => serde_json::Value::from(i),
            Value::F32(x) => float(f64::from(x)),
            Value::F64(x) => float(x),
            Value::Char(c) => serde_json::Value::String(c.to_string()),
            Value::Ref(object) => self.encode_object(object)?,
        })
    }

    fn encode_object(&mut self, object: GcPtr<Object>) -> Result<serde_json::Value, JsonError> {
        match &object.kind {
            ObjectKind::Str(text) => return Ok(serde_json::Value::String(text.clone())),
            ObjectKind::Boxed(inner) => return self.encode(*inner),
            ObjectKind::Statics { class_id, .. } => {
                return Err(JsonError::StaticBlock(self.class_name(*class_id)))
            }
            _ => {}
        }

        if !self.in_progress.insert(object.addr()) {
            let name = object.runtime_type().display(self.heap.registry()).to_string();
            return Err(JsonError::Cycle(name));
        }
        let json = match &object.kind {
            ObjectKind::Instance { class_id, slots } => {
                let registry = Arc::clone(self.heap.registry());
                let mut chain: Vec<_> = registry.ancestors(*class_id).collect();
                chain.reverse();

                let mut map = Map::new();
                for class in chain {
                    for field in &class.fields {
                        if field
                            .modifiers
                            .intersects(Modifiers::STATIC | Modifiers::TRANSIENT)
                        {
                            continue;
                        }
                        match slots.get(field.slot) {
                            Some(Value::Null) | None => {}
                            Some(value) => {
                                map.insert(field.name.clone(), self.encode(value)?);
                            }
                        }
                    }
                }
                serde_json::Value::Object(map)
            }
            ObjectKind::Map { keys, slots, .. } => {
                let mut map = Map::new();
                for (key, value) in keys.iter().zip(slots.values()) {
                    map.insert(key.clone(), self.encode(value)?);
                }
                serde_json::Value::Object(map)
            }
            _ => {
                let elements = object.elements().unwrap_or_default();
                let mut array = Vec::with_capacity(elements.len());
                for element in elements {
                    array.push(self.encode(element)?);
                }
                serde_json::Value::Array(array)
            }
        };
        self.in_progress.remove(&object.addr());

        Ok(json)
    }

    fn class_name(&self, class_id: ClassId) -> String {
        TypeRef::Class(class_id)
            .display(self.heap.registry())
            .to_string()
    }
}

/// Non-finite floats have no JSON form and encode as null
fn float(x: f64) -> serde_json::Value {
    Number::from_f64(x)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn decode_shape(heap: &mut Heap, json: &serde_json::Value, shape: &Shape) -> Result<Value, JsonError> {
    match &shape.raw {
        TypeRef::Class(class_id) => decode_instance(heap, json, *class_id, &shape.args),
        TypeRef::Array(_) | TypeRef::List(_) | TypeRef::Map(_) if shape.is_generic() => {
            let container = match &shape.raw {
                TypeRef::Array(_) => TypeRef::array(TypeRef::Any),
                TypeRef::List(_) => TypeRef::list(TypeRef::Any),
                _ => TypeRef::map(TypeRef::Any),
            };
            let element = shape.element_shape().unwrap_or_else(|| Shape::new(TypeRef::Any));
            decode_elements(heap, json, &container, &shape.to_type(), |heap, json| {
                decode_shape(heap, json, &element)
            })
        }
        raw => decode_type(heap, json, raw, &[]),
    }
}

fn decode_type(
    heap: &mut Heap,
    json: &serde_json::Value,
    ty: &TypeRef,
    env: &[Shape],
) -> Result<Value, JsonError> {
    if json.is_null() && ty.is_reference() {
        return Ok(Value::null());
    }

    match ty {
        TypeRef::Scalar(kind) => decode_scalar(json, *kind),
        TypeRef::Boxed(kind) => {
            let scalar = decode_scalar(json, *kind)?;
            Ok(heap.alloc_boxed(scalar))
        }
        TypeRef::String => match json {
            serde_json::Value::String(text) => Ok(heap.alloc_str(text.clone())),
            other => Err(mismatch("String", other)),
        },
        TypeRef::Array(element) | TypeRef::List(element) | TypeRef::Map(element) => {
            let element = (**element).clone();
            let env = env.to_vec();
            decode_elements(heap, json, ty, &ty.substitute(&erased(&env)), |heap, json| {
                decode_type(heap, json, &element, &env)
            })
        }
        TypeRef::Class(class_id) => decode_instance(heap, json, *class_id, &[]),
        TypeRef::Param(index) => match env.get(*index) {
            Some(shape) => decode_shape(heap, json, shape),
            None => decode_dynamic(heap, json),
        },
        TypeRef::Any => decode_dynamic(heap, json),
    }
}

/// Container decoding; `ty` selects the container kind and `stored` is the
/// element type recorded on the new object
fn decode_elements<F>(
    heap: &mut Heap,
    json: &serde_json::Value,
    ty: &TypeRef,
    stored: &TypeRef,
    mut element: F,
) -> Result<Value, JsonError>
where
    F: FnMut(&mut Heap, &serde_json::Value) -> Result<Value, JsonError>,
{
    let stored = stored.element().cloned().unwrap_or(TypeRef::Any);
    match (ty, json) {
        (TypeRef::Map(_), serde_json::Value::Object(entries)) => {
            let mut values = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                values.push((key.clone(), element(heap, value)?));
            }
            Ok(heap.alloc_map(stored, values))
        }
        (TypeRef::Array(_) | TypeRef::List(_), serde_json::Value::Array(items)) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(element(heap, item)?);
            }
            Ok(match ty {
                TypeRef::Array(_) => heap.alloc_array(stored, values),
                _ => heap.alloc_list(stored, values),
            })
        }
        (_, other) => Err(mismatch(
            &ty.display(heap.registry()).to_string(),
            other,
        )),
    }
}

fn decode_instance(
    heap: &mut Heap,
    json: &serde_json::Value,
    class_id: ClassId,
    args: &[Shape],
) -> Result<Value, JsonError> {
    let entries = match json {
        serde_json::Value::Null => return Ok(Value::null()),
        serde_json::Value::Object(entries) => entries,
        other => {
            let name = TypeRef::Class(class_id).display(heap.registry()).to_string();
            return Err(mismatch(&name, other));
        }
    };

    let object = heap.new_instance(class_id)?;
    let owner = FieldOwner::Instance(object);
    let registry = Arc::clone(heap.registry());
    for class in registry.ancestors(class_id) {
        // Type arguments belong to the requested class only
        let env: &[Shape] = if class.id == class_id { args } else { &[] };
        for field in &class.fields {
            if field
                .modifiers
                .intersects(Modifiers::STATIC | Modifiers::TRANSIENT)
            {
                continue;
            }
            let Some(value) = entries.get(&field.name) else {
                continue;
            };
            let decoded = decode_type(heap, value, &field.ty, env)?;
            set_field_with(heap, owner, &FieldDescriptor::new(class, field), decoded)?;
        }
    }

    Ok(Value::Ref(object))
}

fn decode_scalar(json: &serde_json::Value, kind: ScalarKind) -> Result<Value, JsonError> {
    let value = match kind {
        ScalarKind::Bool => json.as_bool().map(Value::Bool),
        ScalarKind::I8 => json.as_i64().and_then(|i| i8::try_from(i).ok()).map(Value::I8),
        ScalarKind::I16 => json.as_i64().and_then(|i| i16::try_from(i).ok()).map(Value::I16),
        ScalarKind::I32 => json.as_i64().and_then(|i| i32::try_from(i).ok()).map(Value::I32),
        ScalarKind::I64 => json.as_i64().map(Value::I64),
        ScalarKind::F32 => json.as_f64().map(|x| Value::F32(x as f32)),
        ScalarKind::F64 => json.as_f64().map(Value::F64),
        ScalarKind::Char => json.as_str().and_then(|s| {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Value::Char(c)),
                _ => None,
            }
        }),
    };
    value.ok_or_else(|| mismatch(kind.primitive_name(), json))
}

/// Decode without a static type: numbers and booleans are boxed, arrays
/// become lists and objects become maps
fn decode_dynamic(heap: &mut Heap, json: &serde_json::Value) -> Result<Value, JsonError> {
    Ok(match json {
        serde_json::Value::Null => Value::null(),
        serde_json::Value::Bool(b) => heap.alloc_boxed(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            let scalar = match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => match i32::try_from(i) {
                    Ok(small) => Value::I32(small),
                    Err(_) => Value::I64(i),
                },
                (None, Some(x)) => Value::F64(x),
                (None, None) => return Err(mismatch("number", json)),
            };
            heap.alloc_boxed(scalar)
        }
        serde_json::Value::String(text) => heap.alloc_str(text.clone()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            let ty = if json.is_array() {
                TypeRef::list(TypeRef::Any)
            } else {
                TypeRef::map(TypeRef::Any)
            };
            decode_elements(heap, json, &ty, &ty, decode_dynamic)?
        }
    })
}

fn erased(env: &[Shape]) -> Vec<TypeRef> {
    env.iter().map(Shape::to_type).collect()
}

fn mismatch(expected: &str, found: &serde_json::Value) -> JsonError {
    let found = match found {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    };
    JsonError::TypeMismatch {
        expected: expected.to_string(),
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Constructor, FieldDecl, Literal, Param};
    use crate::reflect::{get_field, set_field};
    use crate::types::{ClassDef, ClassRegistry};
    use serde_json::json;

    fn heap() -> Heap {
        let mut builder = ClassRegistry::builder();
        let people = builder.declare("People");
        builder.define(
            people,
            ClassDef::new()
                .field(FieldDecl::new("name", TypeRef::String))
                .field(FieldDecl::new("age", TypeRef::Scalar(ScalarKind::I32)))
                .field(FieldDecl::new("initial", TypeRef::Scalar(ScalarKind::Char)))
                .field(
                    FieldDecl::new("species", TypeRef::String)
                        .with_modifiers(Modifiers::STATIC)
                        .with_default(Literal::Str("human".to_string())),
                )
                .field(
                    FieldDecl::new("session", TypeRef::String)
                        .with_modifiers(Modifiers::TRANSIENT),
                )
                .field(FieldDecl::new("friend", TypeRef::Class(people)))
                .field(FieldDecl::new("extra", TypeRef::Any)),
        );
        builder.class(
            "Pair",
            ClassDef::new()
                .type_params(["L", "R"])
                .field(FieldDecl::new("left", TypeRef::Param(0)))
                .field(FieldDecl::new("right", TypeRef::list(TypeRef::Param(1))))
                .constructor(Constructor::public(vec![
                    Param::new(TypeRef::Param(0), "left"),
                    Param::new(TypeRef::list(TypeRef::Param(1)), "right"),
                ])),
        );
        Heap::new(Arc::new(builder.build().unwrap()))
    }

    fn people(heap: &mut Heap, name: &str) -> Value {
        let id = heap.registry().by_name("People").unwrap();
        let value = Value::Ref(heap.new_instance(id).unwrap());
        let text = heap.alloc_str(name);
        let owner = FieldOwner::from_value(value).unwrap();
        set_field(heap, owner, "name", text).unwrap();
        set_field(heap, owner, "age", Value::I32(30)).unwrap();
        set_field(heap, owner, "initial", Value::Char(name.chars().next().unwrap())).unwrap();
        let session = heap.alloc_str("secret");
        set_field(heap, owner, "session", session).unwrap();
        value
    }

    #[test]
    fn test_encode_instance() {
        let mut heap = heap();
        let ann = people(&mut heap, "ann");
        assert_eq!(
            to_json(&heap, ann).unwrap(),
            json!({"name": "ann", "age": 30, "initial": "a"})
        );
    }

    #[test]
    fn test_encode_cycle_is_an_error() {
        let mut heap = heap();
        let ann = people(&mut heap, "ann");
        set_field(&heap, FieldOwner::from_value(ann).unwrap(), "friend", ann).unwrap();
        assert!(matches!(to_json(&heap, ann), Err(JsonError::Cycle(name)) if name == "People"));
    }

    #[test]
    fn test_encode_shared_value() {
        let mut heap = heap();
        let ann = people(&mut heap, "ann");
        let list = heap.alloc_list(TypeRef::Any, vec![ann, ann]);
        let json = to_json(&heap, list).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_round_trip_instance() {
        let mut heap = heap();
        let ann = people(&mut heap, "ann");
        let bob = people(&mut heap, "bob");
        set_field(&heap, FieldOwner::from_value(ann).unwrap(), "friend", bob).unwrap();

        let text = to_json_string(&heap, ann).unwrap();
        let registry = Arc::clone(heap.registry());
        let shape = Shape::parse(&registry, "People").unwrap();
        let decoded = from_json_str(&mut heap, &text, &shape).unwrap();

        assert_ne!(decoded, ann);
        assert_eq!(to_json(&heap, decoded).unwrap(), to_json(&heap, ann).unwrap());
        let session = get_field(&heap, FieldOwner::from_value(decoded).unwrap(), "session");
        assert_eq!(session, Ok(Some(Value::null())));
    }

    #[test]
    fn test_decode_with_type_arguments() {
        let mut heap = heap();
        let registry = Arc::clone(heap.registry());
        let shape = Shape::parse(&registry, "Pair<People, Long>").unwrap();
        let json = json!({"left": {"name": "cy", "extra": [1, 2.5, "x"]}, "right": [1, 2]});
        let pair = from_json(&mut heap, &json, &shape).unwrap();
        let owner = FieldOwner::from_value(pair).unwrap();

        let left = get_field(&heap, owner, "left").unwrap().unwrap();
        assert_eq!(left.runtime_type(), Some(TypeRef::Class(registry.by_name("People").unwrap())));
        let extra = get_field(&heap, FieldOwner::from_value(left).unwrap(), "extra")
            .unwrap()
            .unwrap();
        let extra = extra.as_object().unwrap().elements().unwrap();
        assert_eq!(extra[0].unboxed(), Some(Value::I32(1)));
        assert_eq!(extra[1].unboxed(), Some(Value::F64(2.5)));
        assert_eq!(extra[2].as_str(), Some("x"));

        let right = get_field(&heap, owner, "right").unwrap().unwrap();
        assert_eq!(right.runtime_type(), Some(TypeRef::list(TypeRef::Boxed(ScalarKind::I64))));
        let right = right.as_object().unwrap().elements().unwrap();
        assert_eq!(right[1].unboxed(), Some(Value::I64(2)));
    }

    #[test]
    fn test_decode_mismatch() {
        let mut heap = heap();
        let registry = Arc::clone(heap.registry());
        let shape = Shape::parse(&registry, "People").unwrap();
        let err = from_json(&mut heap, &json!({"age": "old"}), &shape).unwrap_err();
        assert_eq!(err.to_string(), "Expected int, found JSON string");
        assert!(matches!(
            from_json_str(&mut heap, "{", &shape),
            Err(JsonError::Syntax(_))
        ));
    }
}
