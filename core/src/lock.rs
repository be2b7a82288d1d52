//! Host lock bridge: the single global lock serializing host access.
//!
//! The external runtime guards its entire object graph with one lock. This
//! module models that lock explicitly as a reentrant mutual-exclusion
//! primitive with scoped acquire/release guards, rather than assuming the
//! embedding provides one.
//!
//! # Contract
//!
//! - At most one thread owns the lock at any instant.
//! - A thread already holding the lock may acquire it again without
//!   deadlocking itself (depth counting); other threads block until the
//!   owner's depth returns to zero.
//! - [`HostLock::unlocked`] fully releases the calling thread's ownership
//!   for the duration of a closure and restores the saved depth on exit,
//!   including the unwind path.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Ownership record: which thread holds the lock, and how many times over.
#[derive(Debug, Default)]
struct OwnerState {
    owner: Option<ThreadId>,
    depth: usize,
}

/// The global host lock. One instance per [`HostSession`].
///
/// [`HostSession`]: crate::handle::HostSession
#[derive(Debug, Default)]
pub struct HostLock {
    inner: Mutex<OwnerState>,
    cv: Condvar,
}

impl HostLock {
    /// Create an unheld lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, OwnerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scoped acquisition. Blocks until the lock is free or already owned
    /// by the calling thread; released on all exit paths via [`HostGuard`].
    pub fn acquire(&self) -> HostGuard<'_> {
        let me = thread::current().id();
        let mut st = self.state();
        loop {
            match st.owner {
                None => {
                    st.owner = Some(me);
                    st.depth = 1;
                    break;
                }
                Some(owner) if owner == me => {
                    st.depth += 1;
                    break;
                }
                Some(_) => {
                    st = self.cv.wait(st).unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
        tracing::trace!(depth = st.depth, "host lock acquired");
        drop(st);
        HostGuard { lock: self }
    }

    /// Run `f` with the calling thread's ownership fully released,
    /// restoring the saved depth afterwards.
    ///
    /// A no-op wrapper when the calling thread does not hold the lock.
    /// Used around blocking phases that must not pin the lock while other
    /// native threads perform host calls (e.g. the parallel solve join).
    pub fn unlocked<R>(&self, f: impl FnOnce() -> R) -> R {
        let me = thread::current().id();
        let saved = {
            let mut st = self.state();
            if st.owner == Some(me) {
                let depth = st.depth;
                st.owner = None;
                st.depth = 0;
                Some(depth)
            } else {
                None
            }
        };
        if saved.is_some() {
            tracing::trace!("host lock released for unlocked scope");
            self.cv.notify_all();
        }
        let _restore = saved.map(|depth| Reacquire { lock: self, depth });
        f()
    }
}

/// Scoped ownership of a [`HostLock`]. Dropping decrements the depth and
/// wakes waiters when the depth reaches zero.
#[must_use = "dropping the guard releases the host lock"]
pub struct HostGuard<'a> {
    lock: &'a HostLock,
}

impl Drop for HostGuard<'_> {
    fn drop(&mut self) {
        let mut st = self.lock.state();
        st.depth = st.depth.saturating_sub(1);
        let free = st.depth == 0;
        if free {
            st.owner = None;
        }
        drop(st);
        if free {
            self.lock.cv.notify_all();
        }
    }
}

/// Restores a saved ownership depth when an [`HostLock::unlocked`] scope
/// ends, on both the normal and the unwind path.
struct Reacquire<'a> {
    lock: &'a HostLock,
    depth: usize,
}

impl Drop for Reacquire<'_> {
    fn drop(&mut self) {
        let me = thread::current().id();
        let mut st = self.lock.state();
        while st.owner.is_some() {
            st = self.lock.cv.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
        st.owner = Some(me);
        st.depth = self.depth;
        tracing::trace!(depth = self.depth, "host lock reacquired after unlocked scope");
    }
}
