//! End-to-end materialization of generic shapes, and JSON round trips of
//! the results

use fixtura_core::json::{from_json_str, to_json, to_json_string};
use fixtura_core::object::{Constructor, FieldDecl, Modifiers, Param};
use fixtura_core::reflect::{get_field, FieldOwner};
use fixtura_core::{
    has_cycle, ClassDef, ClassRegistry, Heap, Materializer, RandomConfig, ScalarKind, Shape,
    TypeRef, Value,
};
use std::sync::Arc;

fn registry() -> Arc<ClassRegistry> {
    let mut builder = ClassRegistry::builder();
    builder.class(
        "Pair",
        ClassDef::new()
            .type_params(["A", "B"])
            .field(FieldDecl::new("first", TypeRef::Param(0)).with_modifiers(Modifiers::FINAL))
            .field(FieldDecl::new("second", TypeRef::Param(1)).with_modifiers(Modifiers::FINAL))
            .constructor(Constructor::public(vec![
                Param::new(TypeRef::Param(0), "first"),
                Param::new(TypeRef::Param(1), "second"),
            ])),
    );
    builder.class(
        "TestCase",
        ClassDef::new()
            .type_params(["I", "O"])
            .field(FieldDecl::new("input", TypeRef::Param(0)))
            .field(FieldDecl::new("output", TypeRef::Param(1)))
            .constructor(Constructor::public(vec![]))
            .constructor(Constructor::public(vec![
                Param::new(TypeRef::Param(0), "input"),
                Param::new(TypeRef::Param(1), "output"),
            ])),
    );
    let node = builder.declare("Node");
    builder.define(
        node,
        ClassDef::new()
            .field(FieldDecl::new("weight", TypeRef::Scalar(ScalarKind::I64)))
            .field(FieldDecl::new("next", TypeRef::Class(node)))
            .field(FieldDecl::new("peers", TypeRef::list(TypeRef::Class(node)))),
    );
    let base = builder.declare("Base");
    builder.define(base, ClassDef::new().field(FieldDecl::new("next", TypeRef::Class(base))));
    builder.class(
        "Derived",
        ClassDef::new()
            .extends(base)
            .field(FieldDecl::new("tag", TypeRef::String)),
    );
    Arc::new(builder.build().unwrap())
}

fn field(heap: &Heap, owner: Value, name: &str) -> Value {
    get_field(heap, FieldOwner::from_value(owner).unwrap(), name)
        .unwrap()
        .unwrap()
}

#[test]
fn test_pair_of_integers() {
    let registry = registry();
    let mut heap = Heap::new(Arc::clone(&registry));
    let shape = Shape::parse(&registry, "Pair<Integer, Integer>").unwrap();

    let pair = Materializer::default().materialize(&mut heap, &shape).unwrap();

    assert!(pair.is_ref());
    for name in ["first", "second"] {
        let component = field(&heap, pair, name);
        assert_eq!(component.runtime_type(), Some(TypeRef::Boxed(ScalarKind::I32)));
        assert!(component.as_i32().is_some());
    }
}

#[test]
fn test_nested_generic_arguments() {
    let registry = registry();
    let mut heap = Heap::new(Arc::clone(&registry));
    let shape = Shape::parse(&registry, "TestCase<List<Integer>, Pair<String, Node>>").unwrap();

    let test_case = Materializer::default().materialize(&mut heap, &shape).unwrap();

    let input = field(&heap, test_case, "input");
    let elements = input.as_object().unwrap().elements().unwrap();
    assert!(!elements.is_empty());
    assert!(elements.iter().all(|e| e.as_i32().is_some()));

    let output = field(&heap, test_case, "output");
    assert!(field(&heap, output, "first").as_str().is_some());
    let node = field(&heap, output, "second");
    assert!(node.is_ref());
    assert!(!has_cycle(&heap, test_case));
}

#[test]
fn test_round_trip_through_json() {
    let registry = registry();
    let mut heap = Heap::new(Arc::clone(&registry));
    let shape = Shape::parse(&registry, "TestCase<Node, Map<String, Long>>").unwrap();
    let config = RandomConfig {
        seed: 99,
        ..RandomConfig::default()
    };

    let original = Materializer::new(config).materialize(&mut heap, &shape).unwrap();
    let text = to_json_string(&heap, original).unwrap();
    let decoded = from_json_str(&mut heap, &text, &shape).unwrap();

    assert_eq!(to_json(&heap, decoded).unwrap(), to_json(&heap, original).unwrap());
    let output = field(&heap, decoded, "output");
    assert_eq!(
        output.runtime_type(),
        Some(TypeRef::map(TypeRef::Boxed(ScalarKind::I64)))
    );
}

#[test]
fn test_subclass_with_inherited_cycles_encodes() {
    let registry = registry();
    let shape = Shape::parse(&registry, "Derived").unwrap();
    for seed in [1, 2, 3, 99] {
        let mut heap = Heap::new(Arc::clone(&registry));
        let config = RandomConfig {
            seed,
            object_pool_size: 2,
            ..RandomConfig::default()
        };

        let derived = Materializer::new(config).materialize(&mut heap, &shape).unwrap();

        assert!(!has_cycle(&heap, derived));
        let json = to_json(&heap, derived).unwrap();
        assert!(json.get("tag").is_some());
    }
}
