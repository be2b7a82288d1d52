//! Instantiation-resolver locks.
//!
//! Proves:
//! 1. Every legal combination of configuration axes resolves to exactly
//!    one solver, with no host calls beyond the capability probe.
//! 2. An out-of-range tag string fails with an error naming the axis and
//!    its legal set, before any host call.

use lock_tests::{CallbackBehavior, ChainWorld};
use quarry_solver::{
    BackpropTag, ConfigError, ExecutionSelectionTag, ExecutionTag, ExpansionTag, HashingTag,
    RolloutTag, SelectionTag, SolverBuilder, SolverConfig, TransitionTag, TreePolicyTag,
};

#[test]
fn every_legal_axis_combination_resolves() {
    let executions = [ExecutionTag::Sequential, ExecutionTag::Parallel];
    let transitions = [
        TransitionTag::Step,
        TransitionTag::Sample,
        TransitionTag::Distribution,
    ];
    let trees = [TreePolicyTag::Default];
    let expansions = [ExpansionTag::Full, ExpansionTag::Partial];
    let selections = [SelectionTag::Ucb1, SelectionTag::Random];
    let exec_selections = [
        ExecutionSelectionTag::BestQValue,
        ExecutionSelectionTag::MostVisited,
    ];
    let rollouts = [RolloutTag::Random, RolloutTag::Custom];
    let backprops = [BackpropTag::Graph];
    let hashings = [HashingTag::StateKey, HashingTag::PathKey];

    let mut combinations = 0u32;
    for execution in executions {
        for transition in transitions {
            for tree_policy in trees {
                for expansion in expansions {
                    for selection in selections {
                        for execution_selection in exec_selections {
                            for rollout in rollouts {
                                for backprop in backprops {
                                    for hashing in hashings {
                                        let world = ChainWorld::new();
                                        let config = SolverConfig {
                                            execution,
                                            transition,
                                            tree_policy,
                                            expansion,
                                            selection,
                                            execution_selection,
                                            rollout,
                                            backprop,
                                            hashing,
                                            custom_rollout: Some(
                                                world.callable(CallbackBehavior::AlwaysRight),
                                            ),
                                            ..SolverConfig::default()
                                        };
                                        let built =
                                            SolverBuilder::new(config).build(world.domain(3));
                                        assert!(
                                            built.is_ok(),
                                            "legal combination failed to resolve"
                                        );
                                        combinations += 1;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    assert_eq!(combinations, 192, "expected the full legal product");
}

#[test]
fn out_of_range_tag_fails_before_any_host_call() {
    let world = ChainWorld::new();

    let err = "uct-ish".parse::<SelectionTag>().unwrap_err();
    match err {
        ConfigError::IllegalTag { axis, tag, legal } => {
            assert_eq!(axis, "action_selection_optimization");
            assert_eq!(tag, "uct-ish");
            assert!(legal.contains("ucb1"));
        }
        other => panic!("expected IllegalTag, got {other:?}"),
    }

    // Parsing is pure native: the host saw nothing at all.
    assert_eq!(world.host.call_count("__has_method__"), 0);
    assert_eq!(world.host.call_count("sample"), 0);
}

#[test]
fn custom_rollout_without_callback_names_the_rollout_axis() {
    let world = ChainWorld::new();
    let config = SolverConfig {
        execution: ExecutionTag::Parallel,
        rollout: RolloutTag::Custom,
        custom_rollout: None,
        ..SolverConfig::default()
    };
    let err = SolverBuilder::new(config).build(world.domain(3)).unwrap_err();
    match err {
        ConfigError::MissingCallback { axis } => assert_eq!(axis, "rollout_policy"),
        other => panic!("expected MissingCallback, got {other:?}"),
    }
}
