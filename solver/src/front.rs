//! The solver front-end builder.
//!
//! Consumes a configuration and a domain handle, probes capabilities,
//! binds the proxy (with any per-worker replicas), and runs the
//! instantiation resolver. On any configuration error nothing is
//! constructed and nothing partial escapes.

use quarry_core::{ObjectRef, WorkerId};
use quarry_proxy::CapabilityProbe;

use crate::config::SolverConfig;
use crate::contract::Solver;
use crate::error::ConfigError;
use crate::resolve;
use crate::SolverProxy;

/// Builds one resolved solver from a configuration and a domain handle.
pub struct SolverBuilder {
    config: SolverConfig,
    replicas: Vec<(WorkerId, ObjectRef)>,
}

impl SolverBuilder {
    /// Start from a configuration.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            replicas: Vec::new(),
        }
    }

    /// Register a per-worker private domain replica, obtained at
    /// configuration time. Workers without one use the shared handle.
    #[must_use]
    pub fn replica(mut self, worker: WorkerId, handle: ObjectRef) -> Self {
        self.replicas.push((worker, handle));
        self
    }

    /// Probe the domain, resolve the configuration, construct the solver.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the offending axis, missing
    /// capability, or missing callback. No partial solver is returned.
    pub fn build(self, domain: ObjectRef) -> Result<Box<dyn Solver>, ConfigError> {
        tracing::info!(config = %self.config.snapshot(), "resolving solver configuration");
        let probe = CapabilityProbe::snapshot(&domain);
        let mut proxy = SolverProxy::new(domain);
        for (worker, replica) in self.replicas {
            proxy.register_replica(worker, replica);
        }
        resolve::resolve(self.config, proxy, &probe)
    }
}

impl Default for SolverBuilder {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}
