//! Rollout-policy strategies.
//!
//! Rollout policies are values, not just types: the custom policy carries
//! the user-supplied host callable, threaded through resolution once the
//! final engine type is known.

use quarry_core::{ObjectRef, WorkerId};
use quarry_proxy::{Action, HostValue, State};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::RolloutTag;
use crate::error::{ConfigError, SolveError};
use crate::SolverProxy;

/// Compile-time rollout-policy axis.
pub trait RolloutPolicy: Send + Sync + Sized + 'static {
    /// Construct the policy from its side data.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCallback`] if the tag requires a
    /// callback that was not supplied.
    fn build(custom: Option<ObjectRef>) -> Result<Self, ConfigError>;

    /// Pick the next rollout action. `applicable` is never empty.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if a host operation failed.
    fn pick(
        &self,
        proxy: &SolverProxy,
        state: &State,
        applicable: &[Action],
        worker: Option<WorkerId>,
        rng: &mut ChaCha8Rng,
    ) -> Result<Action, SolveError>;
}

/// Uniform choice among applicable actions, on the native RNG so seeded
/// runs reproduce.
#[derive(Debug, Clone, Copy)]
pub struct RandomRollout;

impl RolloutPolicy for RandomRollout {
    fn build(_custom: Option<ObjectRef>) -> Result<Self, ConfigError> {
        Ok(Self)
    }

    fn pick(
        &self,
        _proxy: &SolverProxy,
        _state: &State,
        applicable: &[Action],
        _worker: Option<WorkerId>,
        rng: &mut ChaCha8Rng,
    ) -> Result<Action, SolveError> {
        Ok(applicable[rng.gen_range(0..applicable.len())].clone())
    }
}

/// A user-supplied host callable `(state) -> action`.
#[derive(Debug)]
pub struct CustomRollout {
    callable: ObjectRef,
}

impl RolloutPolicy for CustomRollout {
    fn build(custom: Option<ObjectRef>) -> Result<Self, ConfigError> {
        custom
            .map(|callable| Self { callable })
            .ok_or(ConfigError::MissingCallback {
                axis: RolloutTag::AXIS,
            })
    }

    fn pick(
        &self,
        proxy: &SolverProxy,
        state: &State,
        _applicable: &[Action],
        _worker: Option<WorkerId>,
        _rng: &mut ChaCha8Rng,
    ) -> Result<Action, SolveError> {
        let result = proxy.call_callback(&self.callable, &[state.as_host().raw()])?;
        Action::from_host(result).map_err(SolveError::from)
    }
}
