//! The instantiation resolver.
//!
//! Folds the ordered axis-selector list into one nested continuation
//! chain: each stage resolves one axis and nests the next, and the
//! terminal factory receives the complete compile-time parameter pack plus
//! every runtime constructor argument. Exactly one concrete engine is
//! instantiated per resolution; nothing partially resolved escapes this
//! module. Validation errors surface in the stage order below.

use std::marker::PhantomData;

use quarry_proxy::CapabilityProbe;

use crate::axis::{
    select_backprop, select_execution, select_execution_selection, select_expansion,
    select_hashing, select_rollout, select_selection, select_transition, select_tree,
    BackpropCont, ExecutionCont, ExecutionSelectionCont, ExpansionCont, HashingCont, RolloutCont,
    SelectionCont, TransitionCont, TreeCont,
};
use crate::config::SolverConfig;
use crate::contract::Solver;
use crate::error::ConfigError;
use crate::mcts::{
    BackpropPolicy, EngineSettings, ExecutionMode, ExecutionSelectionPolicy, ExpansionPolicy,
    MctsEngine, NodeKeyPolicy, RolloutPolicy, SelectionPolicy, TransitionMode, TreePolicy,
};
use crate::SolverProxy;

/// Fold every axis and construct the one resolved solver.
///
/// # Errors
///
/// Returns [`ConfigError`] naming the offending axis; no partial solver is
/// returned.
pub fn resolve(
    config: SolverConfig,
    proxy: SolverProxy,
    probe: &CapabilityProbe,
) -> Result<Box<dyn Solver>, ConfigError> {
    let tag = config.execution;
    select_execution(tag, ExecutionStage { config, proxy, probe })
}

struct ExecutionStage<'p> {
    config: SolverConfig,
    proxy: SolverProxy,
    probe: &'p CapabilityProbe,
}

impl ExecutionCont for ExecutionStage<'_> {
    type Out = Box<dyn Solver>;

    fn with<X: ExecutionMode>(self) -> Result<Self::Out, ConfigError> {
        let tag = self.config.transition;
        select_transition(
            tag,
            self.probe,
            TransitionStage::<X> {
                config: self.config,
                proxy: self.proxy,
                _pack: PhantomData,
            },
        )
    }
}

struct TransitionStage<X> {
    config: SolverConfig,
    proxy: SolverProxy,
    _pack: PhantomData<fn() -> X>,
}

impl<X: ExecutionMode> TransitionCont for TransitionStage<X> {
    type Out = Box<dyn Solver>;

    fn with<Tr: TransitionMode>(self) -> Result<Self::Out, ConfigError> {
        let tag = self.config.tree_policy;
        select_tree(
            tag,
            TreeStage::<X, Tr> {
                config: self.config,
                proxy: self.proxy,
                _pack: PhantomData,
            },
        )
    }
}

struct TreeStage<X, Tr> {
    config: SolverConfig,
    proxy: SolverProxy,
    _pack: PhantomData<fn() -> (X, Tr)>,
}

impl<X: ExecutionMode, Tr: TransitionMode> TreeCont for TreeStage<X, Tr> {
    type Out = Box<dyn Solver>;

    fn with<Ts: TreePolicy>(self) -> Result<Self::Out, ConfigError> {
        let tag = self.config.expansion;
        select_expansion(
            tag,
            ExpansionStage::<X, Tr, Ts> {
                config: self.config,
                proxy: self.proxy,
                _pack: PhantomData,
            },
        )
    }
}

struct ExpansionStage<X, Tr, Ts> {
    config: SolverConfig,
    proxy: SolverProxy,
    _pack: PhantomData<fn() -> (X, Tr, Ts)>,
}

impl<X: ExecutionMode, Tr: TransitionMode, Ts: TreePolicy> ExpansionCont
    for ExpansionStage<X, Tr, Ts>
{
    type Out = Box<dyn Solver>;

    fn with<EX: ExpansionPolicy>(self) -> Result<Self::Out, ConfigError> {
        let tag = self.config.selection;
        select_selection(
            tag,
            SelectionStage::<X, Tr, Ts, EX> {
                config: self.config,
                proxy: self.proxy,
                _pack: PhantomData,
            },
        )
    }
}

struct SelectionStage<X, Tr, Ts, EX> {
    config: SolverConfig,
    proxy: SolverProxy,
    _pack: PhantomData<fn() -> (X, Tr, Ts, EX)>,
}

impl<X: ExecutionMode, Tr: TransitionMode, Ts: TreePolicy, EX: ExpansionPolicy> SelectionCont
    for SelectionStage<X, Tr, Ts, EX>
{
    type Out = Box<dyn Solver>;

    fn with<AS: SelectionPolicy>(self) -> Result<Self::Out, ConfigError> {
        let tag = self.config.execution_selection;
        select_execution_selection(
            tag,
            ExecutionSelectionStage::<X, Tr, Ts, EX, AS> {
                config: self.config,
                proxy: self.proxy,
                _pack: PhantomData,
            },
        )
    }
}

struct ExecutionSelectionStage<X, Tr, Ts, EX, AS> {
    config: SolverConfig,
    proxy: SolverProxy,
    _pack: PhantomData<fn() -> (X, Tr, Ts, EX, AS)>,
}

impl<X, Tr, Ts, EX, AS> ExecutionSelectionCont for ExecutionSelectionStage<X, Tr, Ts, EX, AS>
where
    X: ExecutionMode,
    Tr: TransitionMode,
    Ts: TreePolicy,
    EX: ExpansionPolicy,
    AS: SelectionPolicy,
{
    type Out = Box<dyn Solver>;

    fn with<AE: ExecutionSelectionPolicy>(self) -> Result<Self::Out, ConfigError> {
        let tag = self.config.rollout;
        let has_callback = self.config.custom_rollout.is_some();
        select_rollout(
            tag,
            has_callback,
            RolloutStage::<X, Tr, Ts, EX, AS, AE> {
                config: self.config,
                proxy: self.proxy,
                _pack: PhantomData,
            },
        )
    }
}

struct RolloutStage<X, Tr, Ts, EX, AS, AE> {
    config: SolverConfig,
    proxy: SolverProxy,
    _pack: PhantomData<fn() -> (X, Tr, Ts, EX, AS, AE)>,
}

impl<X, Tr, Ts, EX, AS, AE> RolloutCont for RolloutStage<X, Tr, Ts, EX, AS, AE>
where
    X: ExecutionMode,
    Tr: TransitionMode,
    Ts: TreePolicy,
    EX: ExpansionPolicy,
    AS: SelectionPolicy,
    AE: ExecutionSelectionPolicy,
{
    type Out = Box<dyn Solver>;

    fn with<RO: RolloutPolicy>(self) -> Result<Self::Out, ConfigError> {
        let tag = self.config.backprop;
        select_backprop(
            tag,
            BackpropStage::<X, Tr, Ts, EX, AS, AE, RO> {
                config: self.config,
                proxy: self.proxy,
                _pack: PhantomData,
            },
        )
    }
}

struct BackpropStage<X, Tr, Ts, EX, AS, AE, RO> {
    config: SolverConfig,
    proxy: SolverProxy,
    _pack: PhantomData<fn() -> (X, Tr, Ts, EX, AS, AE, RO)>,
}

impl<X, Tr, Ts, EX, AS, AE, RO> BackpropCont for BackpropStage<X, Tr, Ts, EX, AS, AE, RO>
where
    X: ExecutionMode,
    Tr: TransitionMode,
    Ts: TreePolicy,
    EX: ExpansionPolicy,
    AS: SelectionPolicy,
    AE: ExecutionSelectionPolicy,
    RO: RolloutPolicy,
{
    type Out = Box<dyn Solver>;

    fn with<BP: BackpropPolicy>(self) -> Result<Self::Out, ConfigError> {
        let tag = self.config.hashing;
        select_hashing(
            tag,
            HashingStage::<X, Tr, Ts, EX, AS, AE, RO, BP> {
                config: self.config,
                proxy: self.proxy,
                _pack: PhantomData,
            },
        )
    }
}

struct HashingStage<X, Tr, Ts, EX, AS, AE, RO, BP> {
    config: SolverConfig,
    proxy: SolverProxy,
    _pack: PhantomData<fn() -> (X, Tr, Ts, EX, AS, AE, RO, BP)>,
}

impl<X, Tr, Ts, EX, AS, AE, RO, BP> HashingCont for HashingStage<X, Tr, Ts, EX, AS, AE, RO, BP>
where
    X: ExecutionMode,
    Tr: TransitionMode,
    Ts: TreePolicy,
    EX: ExpansionPolicy,
    AS: SelectionPolicy,
    AE: ExecutionSelectionPolicy,
    RO: RolloutPolicy,
    BP: BackpropPolicy,
{
    type Out = Box<dyn Solver>;

    fn with<K: NodeKeyPolicy>(self) -> Result<Self::Out, ConfigError> {
        finish::<X, Tr, Ts, EX, AS, AE, RO, BP, K>(self.config, self.proxy)
    }
}

/// The terminal factory: all axes resolved, construct the one engine.
fn finish<X, Tr, Ts, EX, AS, AE, RO, BP, K>(
    config: SolverConfig,
    proxy: SolverProxy,
) -> Result<Box<dyn Solver>, ConfigError>
where
    X: ExecutionMode,
    Tr: TransitionMode,
    Ts: TreePolicy,
    EX: ExpansionPolicy,
    AS: SelectionPolicy,
    AE: ExecutionSelectionPolicy,
    RO: RolloutPolicy,
    BP: BackpropPolicy,
    K: NodeKeyPolicy,
{
    let settings = EngineSettings::from_config(&config);
    let SolverConfig {
        custom_rollout,
        heuristic,
        watchdog,
        ..
    } = config;
    let rollout = RO::build(custom_rollout)?;
    let engine = MctsEngine::<X, Tr, Ts, EX, AS, AE, RO, BP, K>::new(
        proxy, settings, rollout, heuristic, watchdog,
    );
    Ok(Box::new(engine))
}
