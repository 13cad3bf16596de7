//! Synthesis of missing fixture resources
//!
//! A missing resource is generated on a dedicated worker thread with its own
//! heap: materialize the requested shape, encode it as JSON and save it. The
//! caller blocks for at most the configured timeout. When the deadline
//! passes the task is cancelled; a task that has not reached its write yet
//! skips it.
//!
//! Two callers provisioning the same resource at once may both write it.
//! Both writes hold a complete document, so the last one wins.

use crate::config::FixtureConfig;
use crate::store::ResourceStore;
use crossbeam::channel::{self, RecvTimeoutError};
use fixtura_core::json::{self, JsonError};
use fixtura_core::{ClassRegistry, Heap, MaterializeError, Materializer, RandomConfig, Shape};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Provisioning failures
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The worker did not finish before the deadline
    #[error("Timed out after {timeout:?} while creating resource {resource}")]
    TimedOut {
        /// Logical resource path
        resource: String,
        /// Deadline that passed
        timeout: Duration,
    },

    /// The worker failed
    #[error("Failed to create resource {resource}: {reason}")]
    Failed {
        /// Logical resource path
        resource: String,
        /// Underlying failure
        #[source]
        reason: SynthesisError,
    },
}

/// Failures inside the provisioning worker
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Materialization failed
    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    /// Encoding failed
    #[error(transparent)]
    Json(#[from] JsonError),

    /// Writing failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The caller gave up before the write
    #[error("Synthesis was cancelled")]
    Cancelled,

    /// The worker stopped without reporting a result
    #[error("Worker exited without a result")]
    WorkerLost,
}

/// Creates missing resources from random fixtures
pub struct ResourceProvisioner {
    store: Arc<dyn ResourceStore>,
    random: RandomConfig,
    timeout: Duration,
}

impl ResourceProvisioner {
    /// Create a provisioner writing into `store`
    pub fn new(store: Arc<dyn ResourceStore>, config: &FixtureConfig) -> Self {
        Self {
            store,
            random: config.random.clone(),
            timeout: config.provision_timeout(),
        }
    }

    /// Override the deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Backing store
    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    /// Deadline for one synthesis
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Synthesize `resource` as a fixture of `shape` and save it
    ///
    /// Blocks until the worker reports or the deadline passes.
    pub fn provision(
        &self,
        registry: &Arc<ClassRegistry>,
        resource: &str,
        shape: &Shape,
    ) -> Result<(), ProvisionError> {
        debug!(
            resource,
            shape = %shape.display(registry),
            "Provisioning missing resource"
        );

        let cancelled = Arc::new(AtomicBool::new(false));
        let task = Synthesis {
            registry: Arc::clone(registry),
            store: Arc::clone(&self.store),
            random: self.random.clone(),
            resource: resource.to_string(),
            shape: shape.clone(),
            cancelled: Arc::clone(&cancelled),
        };

        let (tx, rx) = channel::bounded(1);
        thread::Builder::new()
            .name("fixtura-provision".to_string())
            .spawn(move || {
                // The caller may already have given up
                let _ = tx.send(task.run());
            })
            .map_err(|e| ProvisionError::Failed {
                resource: resource.to_string(),
                reason: SynthesisError::Io(e),
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(())) => {
                info!(resource, "Created missing resource");
                Ok(())
            }
            Ok(Err(reason)) => Err(ProvisionError::Failed {
                resource: resource.to_string(),
                reason,
            }),
            Err(RecvTimeoutError::Timeout) => {
                cancelled.store(true, Ordering::Release);
                warn!(resource, timeout = ?self.timeout, "Resource creation timed out");
                Err(ProvisionError::TimedOut {
                    resource: resource.to_string(),
                    timeout: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(ProvisionError::Failed {
                resource: resource.to_string(),
                reason: SynthesisError::WorkerLost,
            }),
        }
    }
}

/// One unit of work for the provisioning thread
struct Synthesis {
    registry: Arc<ClassRegistry>,
    store: Arc<dyn ResourceStore>,
    random: RandomConfig,
    resource: String,
    shape: Shape,
    cancelled: Arc<AtomicBool>,
}

impl Synthesis {
    fn run(self) -> Result<(), SynthesisError> {
        let mut heap = Heap::new(self.registry);
        let value = Materializer::new(self.random).materialize(&mut heap, &self.shape)?;
        let text = json::to_json_string(&heap, value)?;

        if self.cancelled.load(Ordering::Acquire) {
            return Err(SynthesisError::Cancelled);
        }
        self.store.save(&self.resource, &text)?;
        Ok(())
    }
}
