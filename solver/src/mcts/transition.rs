//! Transition-semantics strategies.
//!
//! Each mode knows how a simulation advances by one action and which
//! domain capabilities that requires. The requirement lists feed capability
//! validation during resolution, before any engine is constructed.

use quarry_core::WorkerId;
use quarry_proxy::capability::methods;
use quarry_proxy::{Action, ProxyError, State};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::error::SolveError;
use crate::SolverProxy;

/// The result of advancing one transition.
#[derive(Debug, Clone)]
pub struct SimStep {
    /// The situation reached.
    pub next: State,
    /// The immediate reward.
    pub reward: f64,
    /// Whether the reached situation is terminal.
    pub terminal: bool,
}

/// Compile-time transition-semantics axis.
pub trait TransitionMode: 'static {
    /// Capabilities the domain must expose for this mode.
    const REQUIRED: &'static [&'static str];

    /// Prepare the domain for one simulation from the root.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if a host operation failed.
    fn begin(proxy: &SolverProxy, worker: Option<WorkerId>) -> Result<(), SolveError>;

    /// Advance one transition from `state` by `action`.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if a host operation failed or the outcome is
    /// malformed.
    fn advance(
        proxy: &SolverProxy,
        state: &State,
        action: &Action,
        worker: Option<WorkerId>,
        rng: &mut ChaCha8Rng,
    ) -> Result<SimStep, SolveError>;
}

/// Stateful environment interaction: each simulation resets the domain and
/// replays its way down with `step`.
#[derive(Debug, Clone, Copy)]
pub struct StepTransition;

impl TransitionMode for StepTransition {
    const REQUIRED: &'static [&'static str] = &[
        methods::RESET,
        methods::STEP,
        methods::GET_APPLICABLE_ACTIONS,
        methods::IS_TERMINAL,
    ];

    fn begin(proxy: &SolverProxy, worker: Option<WorkerId>) -> Result<(), SolveError> {
        proxy.reset(worker)?;
        Ok(())
    }

    fn advance(
        proxy: &SolverProxy,
        _state: &State,
        action: &Action,
        worker: Option<WorkerId>,
        _rng: &mut ChaCha8Rng,
    ) -> Result<SimStep, SolveError> {
        let outcome = proxy.step(action, worker)?;
        let reward = outcome.value.reward()?;
        let terminal = outcome.is_terminal()?;
        Ok(SimStep {
            next: outcome.situation,
            reward,
            terminal,
        })
    }
}

/// Memoryless transition sampling with `sample`.
#[derive(Debug, Clone, Copy)]
pub struct SampleTransition;

impl TransitionMode for SampleTransition {
    const REQUIRED: &'static [&'static str] = &[
        methods::SAMPLE,
        methods::GET_APPLICABLE_ACTIONS,
        methods::IS_TERMINAL,
    ];

    fn begin(_proxy: &SolverProxy, _worker: Option<WorkerId>) -> Result<(), SolveError> {
        Ok(())
    }

    fn advance(
        proxy: &SolverProxy,
        state: &State,
        action: &Action,
        worker: Option<WorkerId>,
        _rng: &mut ChaCha8Rng,
    ) -> Result<SimStep, SolveError> {
        let outcome = proxy.sample(state, action, worker)?;
        let reward = outcome.value.reward()?;
        let terminal = outcome.is_terminal()?;
        Ok(SimStep {
            next: outcome.situation,
            reward,
            terminal,
        })
    }
}

/// Explicit successor distributions: sample natively from the enumerated
/// distribution, then evaluate the transition.
#[derive(Debug, Clone, Copy)]
pub struct DistributionTransition;

impl TransitionMode for DistributionTransition {
    const REQUIRED: &'static [&'static str] = &[
        methods::GET_APPLICABLE_ACTIONS,
        methods::SAMPLE,
        methods::GET_NEXT_STATE_DISTRIBUTION,
        methods::GET_TRANSITION_VALUE,
        methods::IS_TERMINAL,
    ];

    fn begin(_proxy: &SolverProxy, _worker: Option<WorkerId>) -> Result<(), SolveError> {
        Ok(())
    }

    fn advance(
        proxy: &SolverProxy,
        state: &State,
        action: &Action,
        worker: Option<WorkerId>,
        rng: &mut ChaCha8Rng,
    ) -> Result<SimStep, SolveError> {
        let distribution = proxy.get_next_state_distribution(state, action, worker)?;
        let entries = distribution.entries()?;
        if entries.is_empty() {
            return Err(SolveError::Proxy(ProxyError::Shape {
                op: methods::GET_NEXT_STATE_DISTRIBUTION,
                expected: "non-empty (situation, weight) list",
            }));
        }

        let next = draw(&entries, rng).clone();
        let reward = proxy
            .get_transition_value(state, action, Some(&next), worker)?
            .reward()?;
        let terminal = proxy.is_terminal(&next, worker)?;
        Ok(SimStep {
            next,
            reward,
            terminal,
        })
    }
}

/// Weighted draw over distribution entries. Non-positive total weight
/// degenerates to the first entry.
fn draw<'a>(entries: &'a [(State, f64)], rng: &mut ChaCha8Rng) -> &'a State {
    let total: f64 = entries.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return &entries[0].0;
    }
    let mut remaining = rng.gen_range(0.0..total);
    for (state, weight) in entries {
        let weight = weight.max(0.0);
        if remaining < weight {
            return state;
        }
        remaining -= weight;
    }
    &entries[entries.len() - 1].0
}
