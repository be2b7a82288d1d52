//! Per-worker domain replicas.
//!
//! True parallel speed-up despite the global host lock requires each worker
//! thread to own a private copy of the domain, so critical sections stay
//! short and replica-local. The table is populated at configuration time;
//! a worker without a registered replica falls back to the shared handle.

use crate::handle::ObjectRef;

/// Identifier of one native worker thread in the solve pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(usize);

impl WorkerId {
    /// Wrap a worker index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The worker index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Per-worker private domain copies with a shared fallback.
#[derive(Debug)]
pub struct ReplicaTable {
    shared: ObjectRef,
    replicas: Vec<Option<ObjectRef>>,
}

impl ReplicaTable {
    /// Create a table around the shared domain handle, with no replicas.
    #[must_use]
    pub fn new(shared: ObjectRef) -> Self {
        Self {
            shared,
            replicas: Vec::new(),
        }
    }

    /// Register a private replica for one worker. Replaces any previous
    /// registration for the same worker.
    pub fn register(&mut self, worker: WorkerId, replica: ObjectRef) {
        if self.replicas.len() <= worker.index() {
            self.replicas.resize_with(worker.index() + 1, || None);
        }
        self.replicas[worker.index()] = Some(replica);
    }

    /// Resolve the domain handle for a worker.
    ///
    /// `None`, or a worker with no registered replica, resolves to the
    /// shared handle.
    #[must_use]
    pub fn resolve(&self, worker: Option<WorkerId>) -> &ObjectRef {
        match worker {
            Some(w) => match self.replicas.get(w.index()).and_then(Option::as_ref) {
                Some(replica) => replica,
                None => {
                    tracing::debug!(
                        worker = w.index(),
                        "no replica registered; using shared domain handle"
                    );
                    &self.shared
                }
            },
            None => &self.shared,
        }
    }

    /// The shared domain handle.
    #[must_use]
    pub fn shared(&self) -> &ObjectRef {
        &self.shared
    }

    /// Number of registered replicas.
    #[must_use]
    pub fn replica_count(&self) -> usize {
        self.replicas.iter().filter(|r| r.is_some()).count()
    }
}
