//! Memory variant axis: Markovian vs history memory.
//!
//! Markovian domains condition transitions on the single latest situation;
//! `Memory<S>` collapses to `S`. History domains condition on an ordered,
//! optionally bounded sequence; the bound is fixed at construction and the
//! oldest entry is evicted first on overflow.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;

use quarry_core::{HostSession, ObjectRef, RawHandle};

use crate::error::ProxyError;
use crate::values::HostValue;

/// Compile-time memory axis.
pub trait MemoryMode: 'static {
    /// The situation context passed to transition operations.
    type Memory<S: HostValue>;

    /// Marshal the memory to its host representation, as a fresh reference.
    ///
    /// Callers hold the session lock for the duration of the operation that
    /// consumes the result; nested acquisition here is reentrant.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host cannot materialize the memory.
    fn as_host<S: HostValue>(
        memory: &Self::Memory<S>,
        session: &Arc<HostSession>,
    ) -> Result<ObjectRef, ProxyError>;

    /// Advance the memory with the next situation.
    fn advance<S: HostValue>(memory: &mut Self::Memory<S>, next: S);
}

/// Memory is the latest situation alone.
#[derive(Debug, Clone, Copy)]
pub struct Markovian;

impl MemoryMode for Markovian {
    type Memory<S: HostValue> = S;

    fn as_host<S: HostValue>(
        memory: &S,
        _session: &Arc<HostSession>,
    ) -> Result<ObjectRef, ProxyError> {
        Ok(memory.as_host().clone())
    }

    fn advance<S: HostValue>(memory: &mut S, next: S) {
        *memory = next;
    }
}

/// Memory is an ordered history of situations.
#[derive(Debug, Clone, Copy)]
pub struct Historical;

impl MemoryMode for Historical {
    type Memory<S: HostValue> = History<S>;

    fn as_host<S: HostValue>(
        memory: &History<S>,
        session: &Arc<HostSession>,
    ) -> Result<ObjectRef, ProxyError> {
        let _guard = session.lock().acquire();
        let raws: Vec<RawHandle> = memory.iter().map(|s| s.as_host().raw()).collect();
        let raw = session
            .runtime()
            .make_list(&raws)
            .map_err(|source| ProxyError::host("memory.as_host", source))?;
        Ok(ObjectRef::adopt(Arc::clone(session), raw))
    }

    fn advance<S: HostValue>(memory: &mut History<S>, next: S) {
        memory.push(next);
    }
}

/// An ordered, optionally bounded sequence of situations.
///
/// A bounded history holds at most `bound` entries; pushing past the bound
/// evicts the oldest entry (FIFO). The bound is fixed at construction.
#[derive(Debug, Clone)]
pub struct History<S> {
    entries: VecDeque<S>,
    bound: Option<NonZeroUsize>,
}

impl<S> History<S> {
    /// An unbounded history seeded with the initial situation.
    #[must_use]
    pub fn unbounded(initial: S) -> Self {
        let mut entries = VecDeque::new();
        entries.push_back(initial);
        Self {
            entries,
            bound: None,
        }
    }

    /// A bounded history seeded with the initial situation.
    #[must_use]
    pub fn bounded(initial: S, max_len: NonZeroUsize) -> Self {
        let mut entries = VecDeque::with_capacity(max_len.get());
        entries.push_back(initial);
        Self {
            entries,
            bound: Some(max_len),
        }
    }

    /// Append a situation, evicting the oldest entry if the bound is hit.
    pub fn push(&mut self, situation: S) {
        if let Some(bound) = self.bound {
            if self.entries.len() == bound.get() {
                self.entries.pop_front();
            }
        }
        self.entries.push_back(situation);
    }

    /// The most recent situation.
    #[must_use]
    pub fn latest(&self) -> Option<&S> {
        self.entries.back()
    }

    /// Oldest-to-newest iteration.
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.entries.iter()
    }

    /// Number of retained situations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history holds no situations. Construction seeds one
    /// entry, so this is only true for a drained history.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The bound, if any.
    #[must_use]
    pub fn bound(&self) -> Option<NonZeroUsize> {
        self.bound
    }
}
