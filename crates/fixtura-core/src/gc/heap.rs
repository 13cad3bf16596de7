//! Heap allocator for fixture objects
//!
//! The heap owns every object it allocates and frees them all when dropped,
//! so cyclic object graphs need no special handling. It also owns one
//! class-level field block per class that declares static fields.

use super::header::GcHeader;
use super::ptr::GcPtr;
use crate::object::{FieldDecl, Literal, Object, ObjectKind, Slots};
use crate::types::{ClassId, ClassRegistry, TypeRef};
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;
use std::sync::Arc;

/// Heap errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HeapError {
    /// Class ID not present in the registry
    #[error("Unknown class #{0}")]
    UnknownClass(ClassId),

    /// Abstract class or interface
    #[error("Cannot instantiate abstract class or interface \"{0}\"")]
    NotInstantiable(String),
}

/// Heap allocator for objects
pub struct Heap {
    /// Class metadata shared with other heaps
    registry: Arc<ClassRegistry>,

    /// All allocations (pointer to GcHeader)
    allocations: Vec<NonNull<GcHeader>>,

    /// Class-level field blocks
    statics: FxHashMap<ClassId, GcPtr<Object>>,

    /// Total bytes allocated
    allocated_bytes: usize,
}

impl Heap {
    /// Create a new heap, initializing the static fields of every class
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        let mut heap = Self {
            registry: Arc::clone(&registry),
            allocations: Vec::new(),
            statics: FxHashMap::default(),
            allocated_bytes: 0,
        };

        for class in registry.classes() {
            if class.static_slots == 0 {
                continue;
            }
            let slots = Slots::new(class.static_slots);
            for field in class.fields.iter().filter(|f| f.is_static()) {
                let value = heap.initial_value(field);
                let _ = slots.set(field.slot, value);
            }
            let block = heap.allocate(Object::new(ObjectKind::Statics {
                class_id: class.id,
                slots,
            }));
            heap.statics.insert(class.id, block);
        }

        heap
    }

    /// Get the class registry
    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    /// Layout of one allocation, and the offset of the object within it
    fn object_layout() -> (Layout, usize) {
        Layout::new::<GcHeader>()
            .extend(Layout::new::<Object>())
            .expect("Failed to calculate layout")
    }

    /// Allocate an object on the heap
    pub fn allocate(&mut self, object: Object) -> GcPtr<Object> {
        let (layout, value_offset) = Self::object_layout();

        let ptr = unsafe { alloc(layout) };
        if ptr.is_null() {
            handle_alloc_error(layout);
        }

        let header_ptr = ptr as *mut GcHeader;
        unsafe {
            header_ptr.write(GcHeader::new(layout.size(), layout.align()));
        }

        let value_ptr = unsafe { ptr.add(value_offset) as *mut Object };
        unsafe {
            value_ptr.write(object);
        }

        self.allocated_bytes += layout.size();
        self.allocations
            .push(unsafe { NonNull::new_unchecked(header_ptr) });

        unsafe { GcPtr::new(NonNull::new_unchecked(value_ptr)) }
    }

    /// Allocate a string
    pub fn alloc_str(&mut self, text: impl Into<String>) -> Value {
        Value::Ref(self.allocate(Object::new(ObjectKind::Str(text.into()))))
    }

    /// Box an unboxed scalar; other values are returned unchanged
    pub fn alloc_boxed(&mut self, value: Value) -> Value {
        if value.scalar_kind().is_none() {
            return value;
        }
        Value::Ref(self.allocate(Object::new(ObjectKind::Boxed(value))))
    }

    /// Allocate a list
    pub fn alloc_list(&mut self, element: TypeRef, values: Vec<Value>) -> Value {
        Value::Ref(self.allocate(Object::new(ObjectKind::List {
            element,
            slots: Slots::from_values(values),
        })))
    }

    /// Allocate an array
    pub fn alloc_array(&mut self, element: TypeRef, values: Vec<Value>) -> Value {
        Value::Ref(self.allocate(Object::new(ObjectKind::Array {
            element,
            slots: Slots::from_values(values),
        })))
    }

    /// Allocate a string-keyed map
    pub fn alloc_map(&mut self, value: TypeRef, entries: Vec<(String, Value)>) -> Value {
        let (keys, values): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        Value::Ref(self.allocate(Object::new(ObjectKind::Map {
            value,
            keys,
            slots: Slots::from_values(values),
        })))
    }

    /// Allocate an instance of `class_id` with every instance field set to
    /// its initial value
    pub fn new_instance(&mut self, class_id: ClassId) -> Result<GcPtr<Object>, HeapError> {
        let registry = Arc::clone(&self.registry);
        let class = registry
            .class(class_id)
            .ok_or(HeapError::UnknownClass(class_id))?;
        if !class.is_instantiable() {
            return Err(HeapError::NotInstantiable(class.name.clone()));
        }

        let slots = Slots::new(class.instance_slots);
        for ancestor in registry.ancestors(class_id) {
            for field in ancestor.fields.iter().filter(|f| !f.is_static()) {
                let value = self.initial_value(field);
                let _ = slots.set(field.slot, value);
            }
        }

        Ok(self.allocate(Object::new(ObjectKind::Instance { class_id, slots })))
    }

    /// Class-level field block of `class_id`, if the class has static fields
    pub fn static_block(&self, class_id: ClassId) -> Option<GcPtr<Object>> {
        self.statics.get(&class_id).copied()
    }

    /// Initial value of a field: its declared default, else zero or null
    pub fn initial_value(&mut self, field: &FieldDecl) -> Value {
        match (&field.ty, &field.default) {
            (TypeRef::Scalar(kind), Some(literal)) => literal
                .to_scalar(*kind)
                .unwrap_or_else(|| Value::zero(*kind)),
            (TypeRef::Scalar(kind), None) => Value::zero(*kind),
            (TypeRef::Boxed(kind), Some(literal)) => match literal.to_scalar(*kind) {
                Some(scalar) => self.alloc_boxed(scalar),
                None => Value::null(),
            },
            (_, Some(Literal::Str(text))) => self.alloc_str(text.clone()),
            _ => Value::null(),
        }
    }

    /// Get total allocated bytes
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// Get number of allocations
    pub fn allocation_count(&self) -> usize {
        self.allocations.len()
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        let (_, value_offset) = Self::object_layout();
        for header_ptr in self.allocations.drain(..) {
            unsafe {
                let header = *header_ptr.as_ptr();
                let base = header_ptr.as_ptr() as *mut u8;
                std::ptr::drop_in_place(base.add(value_offset) as *mut Object);
                dealloc(
                    base,
                    Layout::from_size_align_unchecked(header.size(), header.align()),
                );
            }
        }
    }
}

impl std::fmt::Debug for Heap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heap")
            .field("allocations", &self.allocations.len())
            .field("allocated_bytes", &self.allocated_bytes)
            .field("classes", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{FieldDecl, Modifiers};
    use crate::types::ScalarKind;

    fn registry() -> Arc<ClassRegistry> {
        let mut builder = ClassRegistry::builder();
        let base = builder.declare("Base");
        builder.define(
            base,
            crate::types::ClassDef::new()
                .field(FieldDecl::new("id", TypeRef::Scalar(ScalarKind::I32)).with_default(Literal::Int(7)))
                .field(
                    FieldDecl::new("COUNTRY", TypeRef::String)
                        .with_modifiers(Modifiers::STATIC | Modifiers::FINAL)
                        .with_default(Literal::Str("wuwei".to_string())),
                ),
        );
        let derived = builder.declare("Derived");
        builder.define(
            derived,
            crate::types::ClassDef::new()
                .extends(base)
                .field(FieldDecl::new("name", TypeRef::String)),
        );
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn test_heap_creation() {
        let heap = Heap::new(Arc::new(ClassRegistry::new()));
        assert_eq!(heap.allocated_bytes(), 0);
        assert_eq!(heap.allocation_count(), 0);
    }

    #[test]
    fn test_heap_allocate_distinct_identities() {
        let mut heap = Heap::new(Arc::new(ClassRegistry::new()));
        let a = heap.alloc_str("same");
        let b = heap.alloc_str("same");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), Some("same"));
        assert_eq!(heap.allocation_count(), 2);
        assert!(heap.allocated_bytes() > 0);
    }

    #[test]
    fn test_heap_boxing() {
        let mut heap = Heap::new(Arc::new(ClassRegistry::new()));
        let boxed = heap.alloc_boxed(Value::I32(5));
        assert!(boxed.is_ref());
        assert_eq!(boxed.as_i32(), Some(5));
        assert_eq!(boxed.runtime_type(), Some(TypeRef::Boxed(ScalarKind::I32)));

        // Non-scalars pass through
        assert_eq!(heap.alloc_boxed(boxed), boxed);
        assert_eq!(heap.alloc_boxed(Value::null()), Value::null());
    }

    #[test]
    fn test_new_instance_applies_defaults() {
        let registry = registry();
        let derived = registry.by_name("Derived").unwrap();
        let mut heap = Heap::new(registry);

        let obj = heap.new_instance(derived).unwrap();
        let slots = obj.slots().unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.get(0), Some(Value::I32(7)));
        assert_eq!(slots.get(1), Some(Value::null()));
    }

    #[test]
    fn test_static_blocks() {
        let registry = registry();
        let base = registry.by_name("Base").unwrap();
        let derived = registry.by_name("Derived").unwrap();
        let heap = Heap::new(registry);

        let block = heap.static_block(base).unwrap();
        assert_eq!(block.slots().unwrap().get(0).unwrap().as_str(), Some("wuwei"));
        assert!(heap.static_block(derived).is_none());
    }

    #[test]
    fn test_unknown_class() {
        let mut heap = Heap::new(Arc::new(ClassRegistry::new()));
        assert_eq!(heap.new_instance(9).unwrap_err(), HeapError::UnknownClass(9));
    }
}
