//! Node keying policies.
//!
//! `StateKeyed` builds a transposition graph keyed by the host runtime's
//! own hash and equality of states. `PathKeyed` keys nodes by a native
//! digest of the action path, keeping host hashing off the node-map hot
//! path entirely.

use std::fmt;
use std::hash::{Hash, Hasher};

use quarry_proxy::{Action, HostValue, State};
use sha2::{Digest, Sha256};

use crate::error::SolveError;

/// Domain prefix for path-key digests.
const DOMAIN_PATH_NODE: &[u8] = b"QUARRY::PATH_NODE::V1\0";

/// Compile-time hashing-policy axis.
pub trait NodeKeyPolicy: 'static {
    /// The node-map key.
    type Key: Clone + Eq + Hash + Send + fmt::Debug;

    /// Key for the root of a search over `state`.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if keying required a host call that failed.
    fn root_key(state: &State) -> Result<Self::Key, SolveError>;

    /// Key for the node reached from `parent` by `action` into `child`.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if keying required a host call that failed.
    fn child_key(parent: &Self::Key, action: &Action, child: &State)
        -> Result<Self::Key, SolveError>;
}

/// Key states by host hash and host equality (transposition graph).
#[derive(Debug, Clone, Copy)]
pub struct StateKeyed;

/// A state plus its cached host hash.
///
/// Equality delegates to the host runtime. A host-raised comparison error
/// is logged and treated as "distinct", which at worst duplicates a node;
/// it never corrupts the map.
#[derive(Debug, Clone)]
pub struct StateKey {
    state: State,
    hash: u64,
}

impl StateKey {
    /// Cache the host hash for a state.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if the state is unhashable on the host side.
    pub fn new(state: State) -> Result<Self, SolveError> {
        let hash = state.try_hash()?;
        Ok(Self { state, hash })
    }

    /// The keyed state.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }
}

impl PartialEq for StateKey {
    fn eq(&self, other: &Self) -> bool {
        if self.hash != other.hash {
            return false;
        }
        match self.state.try_eq(&other.state) {
            Ok(eq) => eq,
            Err(error) => {
                tracing::warn!(%error, "host equality failed inside the node map; treating keys as distinct");
                false
            }
        }
    }
}

impl Eq for StateKey {}

impl Hash for StateKey {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        hasher.write_u64(self.hash);
    }
}

impl NodeKeyPolicy for StateKeyed {
    type Key = StateKey;

    fn root_key(state: &State) -> Result<StateKey, SolveError> {
        StateKey::new(state.clone())
    }

    fn child_key(
        _parent: &StateKey,
        _action: &Action,
        child: &State,
    ) -> Result<StateKey, SolveError> {
        StateKey::new(child.clone())
    }
}

/// Key nodes by a domain-separated digest of the action path (tree shape,
/// no transpositions). Queries are positional: every situation maps to the
/// current root.
#[derive(Debug, Clone, Copy)]
pub struct PathKeyed;

/// A sha-256 digest identifying one position in the search tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathDigest([u8; 32]);

impl fmt::Debug for PathDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathDigest({})", hex::encode(self.0))
    }
}

fn digest(parts: &[&[u8]]) -> PathDigest {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_PATH_NODE);
    for part in parts {
        hasher.update(part);
    }
    PathDigest(hasher.finalize().into())
}

impl NodeKeyPolicy for PathKeyed {
    type Key = PathDigest;

    fn root_key(_state: &State) -> Result<PathDigest, SolveError> {
        Ok(digest(&[b"root"]))
    }

    fn child_key(
        parent: &PathDigest,
        action: &Action,
        _child: &State,
    ) -> Result<PathDigest, SolveError> {
        let action_hash = action.try_hash()?;
        Ok(digest(&[&parent.0, &action_hash.to_le_bytes()]))
    }
}
