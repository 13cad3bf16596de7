//! Type references and the class registry

mod registry;
mod ty;

pub use registry::{Ancestors, ClassDef, ClassRegistry, ClassRegistryBuilder, RegistryError};
pub use ty::{ClassId, ScalarKind, TypeDisplay, TypeRef};
