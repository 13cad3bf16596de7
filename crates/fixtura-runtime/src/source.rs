//! Fixture argument sources
//!
//! A [`FixtureSource`] names the JSON resources that feed one parameterized
//! test. Each resource becomes one argument, decoded against the shape of
//! the test's parameter. Resources that do not exist yet are synthesized
//! first and then read back like any other.

use crate::provision::{ProvisionError, ResourceProvisioner};
use fixtura_core::json::{self, JsonError};
use fixtura_core::{Heap, Shape, Value};
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Separator of resource path segments
const SEPARATOR: char = '/';

/// Argument loading failures
#[derive(Debug, Error)]
pub enum SourceError {
    /// Reading a resource failed
    #[error("Failed to read resource {resource}: {source}")]
    Io {
        /// Logical resource path
        resource: String,
        /// Underlying error
        source: io::Error,
    },

    /// Synthesis of a missing resource did not complete
    #[error("Resource {resource} does not exist and auto-creation did not complete: {source}")]
    Provision {
        /// Logical resource path
        resource: String,
        /// Underlying error
        source: ProvisionError,
    },

    /// The resource is still absent after synthesis reported success
    #[error("Resource {resource} does not exist and auto-creation did not complete")]
    ResourceMissing {
        /// Logical resource path
        resource: String,
    },

    /// The resource does not decode to the requested shape
    #[error("Failed to decode resource {resource}: {source}")]
    Decode {
        /// Logical resource path
        resource: String,
        /// Underlying error
        source: JsonError,
    },
}

/// JSON resources feeding one parameterized test
pub struct FixtureSource {
    namespace: String,
    resources: Vec<String>,
    provisioner: Arc<ResourceProvisioner>,
}

impl FixtureSource {
    /// Create a source for `resources`, relative to a dotted `namespace`
    ///
    /// A resource starting with `/` is absolute and ignores the namespace.
    pub fn new<I, S>(namespace: &str, resources: I, provisioner: Arc<ResourceProvisioner>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespace: namespace.to_string(),
            resources: resources.into_iter().map(Into::into).collect(),
            provisioner,
        }
    }

    /// Logical paths of the resources, in declaration order
    pub fn resource_paths(&self) -> Vec<String> {
        let prefix = self.namespace.replace('.', "/");
        self.resources
            .iter()
            .map(|name| {
                if name.starts_with(SEPARATOR) {
                    name.clone()
                } else if prefix.is_empty() {
                    format!("{}{}", SEPARATOR, name)
                } else {
                    format!("{}{}{}{}", SEPARATOR, prefix, SEPARATOR, name)
                }
            })
            .collect()
    }

    /// Load one argument per resource, decoded against `shape`
    pub fn provide_arguments(&self, heap: &mut Heap, shape: &Shape) -> Result<Vec<Value>, SourceError> {
        self.resource_paths()
            .into_iter()
            .map(|resource| {
                let text = self.open(heap, &resource, shape)?;
                json::from_json_str(heap, &text, shape)
                    .map_err(|source| SourceError::Decode { resource, source })
            })
            .collect()
    }

    fn open(&self, heap: &Heap, resource: &str, shape: &Shape) -> Result<String, SourceError> {
        if let Some(text) = self.load(resource)? {
            debug!(resource, "Loaded resource");
            return Ok(text);
        }

        self.provisioner
            .provision(heap.registry(), resource, shape)
            .map_err(|source| SourceError::Provision {
                resource: resource.to_string(),
                source,
            })?;

        self.load(resource)?.ok_or_else(|| SourceError::ResourceMissing {
            resource: resource.to_string(),
        })
    }

    fn load(&self, resource: &str) -> Result<Option<String>, SourceError> {
        self.provisioner
            .store()
            .load(resource)
            .map_err(|source| SourceError::Io {
                resource: resource.to_string(),
                source,
            })
    }
}
