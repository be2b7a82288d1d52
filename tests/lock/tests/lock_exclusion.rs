//! Host-lock exclusion locks.
//!
//! Proves:
//! 1. Under parallel execution with K workers, no two threads are ever
//!    inside the host simultaneously (the critical-section probe on the
//!    scripted host never observes a concurrency above 1).
//! 2. Per-worker replicas are honored when registered.

use lock_tests::ChainWorld;
use quarry_core::WorkerId;
use quarry_proxy::{HostValue, State};
use quarry_solver::{ExecutionTag, Solver, SolverBuilder, SolverConfig};

#[test]
fn parallel_workers_never_overlap_inside_the_host() {
    let world = ChainWorld::new();
    let config = SolverConfig {
        execution: ExecutionTag::Parallel,
        workers: 4,
        rollout_budget: 200,
        discount: 0.9,
        seed: 11,
        ..SolverConfig::default()
    };
    let mut solver = SolverBuilder::new(config).build(world.domain(3)).unwrap();

    let root = State::from_host(world.int(0)).unwrap();
    solver.solve(&root).unwrap();

    assert!(solver.diagnostics().rollouts > 0, "workers made progress");
    assert_eq!(
        world.host.max_concurrency(),
        1,
        "host lock must serialize all host access"
    );
    assert!(!world.host.overlap_seen());
}

#[test]
fn registered_replicas_receive_the_worker_calls() {
    let world = ChainWorld::new();
    let config = SolverConfig {
        execution: ExecutionTag::Parallel,
        workers: 2,
        rollout_budget: 50,
        discount: 0.9,
        seed: 3,
        ..SolverConfig::default()
    };
    let mut solver = SolverBuilder::new(config)
        .replica(WorkerId::new(0), world.domain(3))
        .replica(WorkerId::new(1), world.domain(3))
        .build(world.domain(3))
        .unwrap();

    let root = State::from_host(world.int(0)).unwrap();
    solver.solve(&root).unwrap();

    assert!(solver.diagnostics().rollouts > 0);
    assert_eq!(world.host.max_concurrency(), 1);
}
