//! Configuration axis selectors.
//!
//! One selector per axis. Each knows only its own closed tag set, the
//! capability prerequisites of each tag, and the side data its tags need;
//! none knows how many axes precede or follow it. A selector matches its
//! runtime tag to a marker type and hands that type to a caller-supplied
//! continuation, so the growing parameter pack is purely compile-time
//! while tag selection stays purely runtime.

use quarry_proxy::CapabilityProbe;

use crate::config::{
    BackpropTag, ExecutionSelectionTag, ExecutionTag, ExpansionTag, HashingTag, RolloutTag,
    SelectionTag, TransitionTag, TreePolicyTag,
};
use crate::error::ConfigError;
use crate::mcts::{
    BackpropPolicy, BestQValue, CustomRollout, DefaultTreePolicy, DistributionTransition,
    ExecutionMode, ExecutionSelectionPolicy, ExpansionPolicy, FullExpansion, GraphBackup,
    MostVisited, NodeKeyPolicy, ParallelExecution, PartialExpansion, PathKeyed, RandomRollout,
    RandomSelection, RolloutPolicy, SampleTransition, SelectionPolicy, SequentialExecution,
    StateKeyed, StepTransition, TransitionMode, TreePolicy, Ucb1Selection,
};

/// Continuation over a resolved execution mode.
pub trait ExecutionCont {
    type Out;
    fn with<X: ExecutionMode>(self) -> Result<Self::Out, ConfigError>;
}

/// Resolve the execution-mode axis.
///
/// # Errors
///
/// Propagates the continuation's error.
pub fn select_execution<C: ExecutionCont>(tag: ExecutionTag, cont: C) -> Result<C::Out, ConfigError> {
    match tag {
        ExecutionTag::Sequential => cont.with::<SequentialExecution>(),
        ExecutionTag::Parallel => cont.with::<ParallelExecution>(),
    }
}

/// Continuation over a resolved transition mode.
pub trait TransitionCont {
    type Out;
    fn with<Tr: TransitionMode>(self) -> Result<Self::Out, ConfigError>;
}

/// Resolve the transition-semantics axis, validating the tag's capability
/// requirements against the probe snapshot first.
///
/// # Errors
///
/// Returns [`ConfigError::MissingCapability`] if the domain lacks a
/// required method.
pub fn select_transition<C: TransitionCont>(
    tag: TransitionTag,
    probe: &CapabilityProbe,
    cont: C,
) -> Result<C::Out, ConfigError> {
    match tag {
        TransitionTag::Step => {
            probe.require(TransitionTag::AXIS, StepTransition::REQUIRED)?;
            cont.with::<StepTransition>()
        }
        TransitionTag::Sample => {
            probe.require(TransitionTag::AXIS, SampleTransition::REQUIRED)?;
            cont.with::<SampleTransition>()
        }
        TransitionTag::Distribution => {
            probe.require(TransitionTag::AXIS, DistributionTransition::REQUIRED)?;
            cont.with::<DistributionTransition>()
        }
    }
}

/// Continuation over a resolved tree policy.
pub trait TreeCont {
    type Out;
    fn with<Ts: TreePolicy>(self) -> Result<Self::Out, ConfigError>;
}

/// Resolve the tree-policy axis.
///
/// # Errors
///
/// Propagates the continuation's error.
pub fn select_tree<C: TreeCont>(tag: TreePolicyTag, cont: C) -> Result<C::Out, ConfigError> {
    match tag {
        TreePolicyTag::Default => cont.with::<DefaultTreePolicy>(),
    }
}

/// Continuation over a resolved expansion policy.
pub trait ExpansionCont {
    type Out;
    fn with<EX: ExpansionPolicy>(self) -> Result<Self::Out, ConfigError>;
}

/// Resolve the expansion-policy axis.
///
/// # Errors
///
/// Propagates the continuation's error.
pub fn select_expansion<C: ExpansionCont>(tag: ExpansionTag, cont: C) -> Result<C::Out, ConfigError> {
    match tag {
        ExpansionTag::Full => cont.with::<FullExpansion>(),
        ExpansionTag::Partial => cont.with::<PartialExpansion>(),
    }
}

/// Continuation over a resolved optimization-time selection policy.
pub trait SelectionCont {
    type Out;
    fn with<AS: SelectionPolicy>(self) -> Result<Self::Out, ConfigError>;
}

/// Resolve the optimization-time action-selection axis.
///
/// # Errors
///
/// Propagates the continuation's error.
pub fn select_selection<C: SelectionCont>(tag: SelectionTag, cont: C) -> Result<C::Out, ConfigError> {
    match tag {
        SelectionTag::Ucb1 => cont.with::<Ucb1Selection>(),
        SelectionTag::Random => cont.with::<RandomSelection>(),
    }
}

/// Continuation over a resolved execution-time selection policy.
pub trait ExecutionSelectionCont {
    type Out;
    fn with<AE: ExecutionSelectionPolicy>(self) -> Result<Self::Out, ConfigError>;
}

/// Resolve the execution-time action-selection axis.
///
/// # Errors
///
/// Propagates the continuation's error.
pub fn select_execution_selection<C: ExecutionSelectionCont>(
    tag: ExecutionSelectionTag,
    cont: C,
) -> Result<C::Out, ConfigError> {
    match tag {
        ExecutionSelectionTag::BestQValue => cont.with::<BestQValue>(),
        ExecutionSelectionTag::MostVisited => cont.with::<MostVisited>(),
    }
}

/// Continuation over a resolved rollout policy.
pub trait RolloutCont {
    type Out;
    fn with<RO: RolloutPolicy>(self) -> Result<Self::Out, ConfigError>;
}

/// Resolve the rollout-policy axis. The `custom` tag carries side data (the
/// user callback); its absence fails here, at this axis's position in the
/// resolution order.
///
/// # Errors
///
/// Returns [`ConfigError::MissingCallback`] for `custom` without a
/// callback.
pub fn select_rollout<C: RolloutCont>(
    tag: RolloutTag,
    has_custom_callback: bool,
    cont: C,
) -> Result<C::Out, ConfigError> {
    match tag {
        RolloutTag::Random => cont.with::<RandomRollout>(),
        RolloutTag::Custom => {
            if !has_custom_callback {
                return Err(ConfigError::MissingCallback {
                    axis: RolloutTag::AXIS,
                });
            }
            cont.with::<CustomRollout>()
        }
    }
}

/// Continuation over a resolved back-propagation policy.
pub trait BackpropCont {
    type Out;
    fn with<BP: BackpropPolicy>(self) -> Result<Self::Out, ConfigError>;
}

/// Resolve the back-propagation axis.
///
/// # Errors
///
/// Propagates the continuation's error.
pub fn select_backprop<C: BackpropCont>(tag: BackpropTag, cont: C) -> Result<C::Out, ConfigError> {
    match tag {
        BackpropTag::Graph => cont.with::<GraphBackup>(),
    }
}

/// Continuation over a resolved node-key policy.
pub trait HashingCont {
    type Out;
    fn with<K: NodeKeyPolicy>(self) -> Result<Self::Out, ConfigError>;
}

/// Resolve the hashing-policy axis.
///
/// # Errors
///
/// Propagates the continuation's error.
pub fn select_hashing<C: HashingCont>(tag: HashingTag, cont: C) -> Result<C::Out, ConfigError> {
    match tag {
        HashingTag::StateKey => cont.with::<StateKeyed>(),
        HashingTag::PathKey => cont.with::<PathKeyed>(),
    }
}
