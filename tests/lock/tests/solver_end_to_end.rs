//! End-to-end solver locks on the chain fixture.
//!
//! The chain rewards reaching its far end; with a discount below one the
//! right-moving action dominates at the root under every transition mode.

use lock_tests::{CallbackBehavior, ChainWorld};
use quarry_proxy::{HostValue, State};
use quarry_solver::{
    RolloutTag, SolveError, Solver, SolverBuilder, SolverConfig, TransitionTag,
};

fn chain_config(transition: TransitionTag) -> SolverConfig {
    SolverConfig {
        transition,
        rollout_budget: 300,
        max_depth: 30,
        discount: 0.9,
        seed: 7,
        ..SolverConfig::default()
    }
}

fn solve_chain(world: &ChainWorld, config: SolverConfig) -> Box<dyn Solver> {
    let mut solver = SolverBuilder::new(config).build(world.domain(3)).unwrap();
    let root = State::from_host(world.int(0)).unwrap();
    solver.solve(&root).unwrap();
    solver
}

#[test]
fn sample_mode_prefers_moving_right_at_the_root() {
    let world = ChainWorld::new();
    let mut solver = solve_chain(&world, chain_config(TransitionTag::Sample));
    let root = State::from_host(world.int(0)).unwrap();

    assert!(solver.is_solution_defined_for(&root).unwrap());
    let action = solver.get_next_action(&root).unwrap().expect("defined at root");
    assert_eq!(world.int_value(action.as_host()), 1, "right is optimal");

    let utility = solver.get_utility(&root).unwrap().expect("explored");
    assert!(utility > 0.0, "positive expected return at the root");

    let diag = solver.diagnostics();
    assert_eq!(diag.rollouts, 300, "sequential mode runs the exact budget");
    assert!(diag.explored_states > 0);

    let policy = solver.get_policy().unwrap();
    assert!(!policy.is_empty());
}

#[test]
fn step_mode_replays_through_the_stateful_environment() {
    let world = ChainWorld::new();
    let mut solver = solve_chain(&world, chain_config(TransitionTag::Step));
    let root = State::from_host(world.int(0)).unwrap();

    let action = solver.get_next_action(&root).unwrap().expect("defined at root");
    assert_eq!(world.int_value(action.as_host()), 1);
    assert!(world.host.call_count("reset") > 0, "each simulation resets");
    assert!(world.host.call_count("step") > 0);
}

#[test]
fn distribution_mode_samples_enumerated_successors() {
    let world = ChainWorld::new();
    let mut solver = solve_chain(&world, chain_config(TransitionTag::Distribution));
    let root = State::from_host(world.int(0)).unwrap();

    let action = solver.get_next_action(&root).unwrap().expect("defined at root");
    assert_eq!(world.int_value(action.as_host()), 1);
    assert!(world.host.call_count("get_next_state_distribution") > 0);
    assert!(world.host.call_count("get_transition_value") > 0);
}

#[test]
fn watchdog_terminates_between_rollouts() {
    let world = ChainWorld::new();
    let mut config = chain_config(TransitionTag::Sample);
    config.rollout_budget = 10_000;
    config.watchdog = Some(Box::new(|stats| stats.rollouts < 10));

    let solver = solve_chain(&world, config);
    let rollouts = solver.diagnostics().rollouts;
    assert!(rollouts >= 10, "in-flight rollouts always finish");
    assert!(rollouts < 10_000, "watchdog cut the budget short");
}

#[test]
fn custom_rollout_policy_drives_rollouts_through_the_callback() {
    let world = ChainWorld::new();
    let mut config = chain_config(TransitionTag::Sample);
    config.rollout = RolloutTag::Custom;
    config.custom_rollout = Some(world.callable(CallbackBehavior::AlwaysRight));

    let mut solver = solve_chain(&world, config);
    let root = State::from_host(world.int(0)).unwrap();
    let action = solver.get_next_action(&root).unwrap().expect("defined at root");
    assert_eq!(world.int_value(action.as_host()), 1);
    assert!(world.host.call_count("__call__") > 0, "callback was consulted");
}

#[test]
fn heuristic_replaces_rollout_walks() {
    let world = ChainWorld::new();
    let mut config = chain_config(TransitionTag::Sample);
    config.heuristic = Some(world.callable(CallbackBehavior::HeuristicPair(0.5, 2)));

    let solver = solve_chain(&world, config);
    assert!(world.host.call_count("__call__") > 0, "heuristic was consulted");
    assert!(solver.diagnostics().explored_states > 0);
}

#[test]
fn malformed_heuristic_surfaces_a_shape_error() {
    let world = ChainWorld::new();
    let mut config = chain_config(TransitionTag::Sample);
    config.heuristic = Some(world.callable(CallbackBehavior::HeuristicWrongShape));

    let mut solver = SolverBuilder::new(config).build(world.domain(3)).unwrap();
    let root = State::from_host(world.int(0)).unwrap();
    let err = solver.solve(&root).unwrap_err();
    match err {
        SolveError::CallbackShape { expected } => {
            assert!(expected.contains("(value, rollout_count)"));
        }
        other => panic!("expected CallbackShape, got {other:?}"),
    }
}

#[test]
fn online_pruning_records_the_prefix_and_discards_unreachable_nodes() {
    let world = ChainWorld::new();
    let mut config = chain_config(TransitionTag::Sample);
    config.online_pruning = true;

    let mut solver = SolverBuilder::new(config).build(world.domain(3)).unwrap();
    let root = State::from_host(world.int(0)).unwrap();
    solver.solve(&root).unwrap();

    let action = solver.get_next_action(&root).unwrap().expect("defined at root");
    let prefix = solver.get_action_prefix();
    assert_eq!(prefix.len(), 1);
    assert_eq!(
        world.int_value(prefix[0].as_host()),
        world.int_value(action.as_host())
    );

    // Re-rooting at the terminal end strands everything else.
    let terminal = State::from_host(world.int(3)).unwrap();
    let at_terminal = solver.get_next_action(&terminal).unwrap();
    assert!(at_terminal.is_none(), "terminal node has no edges");
    assert!(
        solver.diagnostics().pruned_states > 0,
        "unreachable nodes were discarded"
    );
}

#[test]
fn clear_discards_all_search_state() {
    let world = ChainWorld::new();
    let mut solver = solve_chain(&world, chain_config(TransitionTag::Sample));
    assert!(solver.diagnostics().explored_states > 0);

    solver.clear();
    let diag = solver.diagnostics();
    assert_eq!(diag.explored_states, 0);
    assert_eq!(diag.rollouts, 0);

    let root = State::from_host(world.int(0)).unwrap();
    assert!(!solver.is_solution_defined_for(&root).unwrap());
}
