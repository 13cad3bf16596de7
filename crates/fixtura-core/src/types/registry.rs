//! Class registry
//!
//! The registry holds every class a heap can instantiate. It is built once,
//! validated, and then shared read-only (usually through an `Arc`) by every
//! heap and every worker thread.

use super::ty::{ClassId, TypeRef};
use crate::object::{Class, Constructor, FieldDecl, Literal, Modifiers};
use rustc_hash::FxHashMap;

/// Registry construction errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// A declared class was never defined
    #[error("Class \"{0}\" was declared but never defined")]
    Undefined(String),

    /// A class extends an unknown class ID
    #[error("Class \"{class}\" extends unknown class #{parent}")]
    UnknownParent {
        /// Class name
        class: String,
        /// Parent class ID
        parent: ClassId,
    },

    /// The parent chain of a class loops
    #[error("Inheritance cycle through class \"{0}\"")]
    InheritanceCycle(String),

    /// A field or parameter references an unknown class ID
    #[error("Class \"{class}\" references unknown class #{target} in \"{member}\"")]
    UnknownClassRef {
        /// Class name
        class: String,
        /// Field or parameter name
        member: String,
        /// Referenced class ID
        target: ClassId,
    },

    /// A default literal does not fit the field's type
    #[error("Default value of field \"{class}.{field}\" does not match its type")]
    InvalidDefault {
        /// Class name
        class: String,
        /// Field name
        field: String,
    },

    /// A constructor parameter binds a field the class does not have
    #[error("Constructor of \"{class}\" binds unknown instance field \"{field}\"")]
    UnknownConstructorField {
        /// Class name
        class: String,
        /// Field name
        field: String,
    },
}

/// Definition of a class, before layout
#[derive(Debug, Clone, Default)]
pub struct ClassDef {
    parent: Option<ClassId>,
    modifiers: Modifiers,
    type_params: Vec<String>,
    fields: Vec<FieldDecl>,
    constructors: Vec<Constructor>,
}

impl ClassDef {
    /// Empty root class
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parent class
    pub fn extends(mut self, parent: ClassId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Add class modifiers (ABSTRACT, INTERFACE)
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = self.modifiers | modifiers;
        self
    }

    /// Declare type parameters, referenced by fields as `TypeRef::Param(i)`
    pub fn type_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Declare a field
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare a constructor
    pub fn constructor(mut self, constructor: Constructor) -> Self {
        self.constructors.push(constructor);
        self
    }
}

/// Registry of class metadata
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: Vec<Class>,
    by_name: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry builder
    pub fn builder() -> ClassRegistryBuilder {
        ClassRegistryBuilder::default()
    }

    /// Get a class by ID
    pub fn class(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(id)
    }

    /// Look up a class ID by name
    pub fn by_name(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// All classes, in ID order
    pub fn classes(&self) -> impl Iterator<Item = &Class> {
        self.classes.iter()
    }

    /// The class and its ancestors, nearest first
    pub fn ancestors(&self, id: ClassId) -> Ancestors<'_> {
        Ancestors {
            registry: self,
            next: self.class(id),
        }
    }

    /// Get the number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Iterator over a class's ancestor chain
pub struct Ancestors<'a> {
    registry: &'a ClassRegistry,
    next: Option<&'a Class>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Class;

    fn next(&mut self) -> Option<&'a Class> {
        let current = self.next?;
        self.next = current.parent_id.and_then(|id| self.registry.class(id));
        Some(current)
    }
}

/// Builder for ClassRegistry
///
/// Classes are declared first (reserving an ID, so fields can refer to
/// classes that are defined later, including the class itself) and defined
/// afterwards.
#[derive(Debug, Default)]
pub struct ClassRegistryBuilder {
    names: Vec<String>,
    defs: Vec<Option<ClassDef>>,
    by_name: FxHashMap<String, ClassId>,
}

impl ClassRegistryBuilder {
    /// Reserve an ID for `name` (returns the existing ID if already declared)
    pub fn declare(&mut self, name: &str) -> ClassId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.defs.push(None);
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Define a declared class
    pub fn define(&mut self, id: ClassId, def: ClassDef) -> &mut Self {
        if let Some(slot) = self.defs.get_mut(id) {
            *slot = Some(def);
        }
        self
    }

    /// Declare and define a class in one step
    pub fn class(&mut self, name: &str, def: ClassDef) -> ClassId {
        let id = self.declare(name);
        self.define(id, def);
        id
    }

    /// Validate definitions and lay out fields
    pub fn build(self) -> Result<ClassRegistry, RegistryError> {
        let count = self.names.len();
        let mut classes = Vec::with_capacity(count);

        for (id, (name, def)) in self.names.iter().zip(self.defs).enumerate() {
            let def = def.ok_or_else(|| RegistryError::Undefined(name.clone()))?;
            if let Some(parent) = def.parent {
                if parent >= count {
                    return Err(RegistryError::UnknownParent {
                        class: name.clone(),
                        parent,
                    });
                }
            }
            let mut class = Class::new(id, name.clone());
            class.parent_id = def.parent;
            class.modifiers = def.modifiers;
            class.type_params = def.type_params;
            class.fields = def.fields;
            class.constructors = def.constructors;
            classes.push(class);
        }

        // Parents must be laid out before children.
        let order = layout_order(&classes)?;
        for id in order {
            let base = classes[id]
                .parent_id
                .map(|parent| classes[parent].instance_slots)
                .unwrap_or(0);
            let class = &mut classes[id];
            let mut instance = base;
            let mut statics = 0;
            for field in &mut class.fields {
                if field.is_static() {
                    field.slot = statics;
                    statics += 1;
                } else {
                    field.slot = instance;
                    instance += 1;
                }
            }
            class.instance_slots = instance;
            class.static_slots = statics;
        }

        let registry = ClassRegistry {
            by_name: self.by_name,
            classes,
        };
        for class in &registry.classes {
            validate_members(&registry, class)?;
        }
        Ok(registry)
    }
}

fn layout_order(classes: &[Class]) -> Result<Vec<ClassId>, RegistryError> {
    let mut order = Vec::with_capacity(classes.len());
    let mut placed = vec![false; classes.len()];

    for class in classes {
        let mut chain = Vec::new();
        let mut current = Some(class.id);
        while let Some(id) = current {
            if placed[id] {
                break;
            }
            if chain.len() > classes.len() {
                return Err(RegistryError::InheritanceCycle(class.name.clone()));
            }
            chain.push(id);
            current = classes[id].parent_id;
        }
        for id in chain.into_iter().rev() {
            if !placed[id] {
                placed[id] = true;
                order.push(id);
            }
        }
    }

    Ok(order)
}

fn validate_members(registry: &ClassRegistry, class: &Class) -> Result<(), RegistryError> {
    for field in &class.fields {
        check_class_ref(registry, class, &field.name, &field.ty)?;
        if let Some(literal) = &field.default {
            if !literal_fits(&field.ty, literal) {
                return Err(RegistryError::InvalidDefault {
                    class: class.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
    }

    for ctor in &class.constructors {
        for param in &ctor.params {
            check_class_ref(registry, class, &param.field, &param.ty)?;
            let bound = registry
                .ancestors(class.id)
                .flat_map(|c| c.fields.iter())
                .any(|f| f.name == param.field && !f.is_static());
            if !bound {
                return Err(RegistryError::UnknownConstructorField {
                    class: class.name.clone(),
                    field: param.field.clone(),
                });
            }
        }
    }

    Ok(())
}

fn check_class_ref(
    registry: &ClassRegistry,
    class: &Class,
    member: &str,
    ty: &TypeRef,
) -> Result<(), RegistryError> {
    match ty {
        TypeRef::Class(target) if registry.class(*target).is_none() => {
            Err(RegistryError::UnknownClassRef {
                class: class.name.clone(),
                member: member.to_string(),
                target: *target,
            })
        }
        TypeRef::Array(inner) | TypeRef::List(inner) | TypeRef::Map(inner) => {
            check_class_ref(registry, class, member, inner)
        }
        _ => Ok(()),
    }
}

fn literal_fits(ty: &TypeRef, literal: &Literal) -> bool {
    match ty {
        TypeRef::Scalar(kind) | TypeRef::Boxed(kind) => literal.to_scalar(*kind).is_some(),
        TypeRef::String | TypeRef::Any | TypeRef::Param(_) => matches!(literal, Literal::Str(_)),
        _ => false,
    }
}
