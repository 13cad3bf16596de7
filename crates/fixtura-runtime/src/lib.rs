//! Fixtura Runtime
//!
//! Serves fixture arguments to a test runner from stored JSON resources,
//! synthesizing a resource on first use when it does not exist yet:
//! - **Configuration**: `fixtura.toml` settings (`config`)
//! - **Storage**: resource lookup and persistence (`store`)
//! - **Provisioning**: time-bounded synthesis of missing resources (`provision`)
//! - **Sources**: resource name mapping and argument decoding (`source`)

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Runtime configuration
pub mod config;

/// Synthesis of missing resources
pub mod provision;

/// Fixture argument sources
pub mod source;

/// Resource storage
pub mod store;

pub use config::{ConfigError, FixtureConfig};
pub use provision::{ProvisionError, ResourceProvisioner, SynthesisError};
pub use source::{FixtureSource, SourceError};
pub use store::{FsResourceStore, ResourceStore};
