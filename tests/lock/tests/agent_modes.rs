//! Agent-variant locks.
//!
//! Proves:
//! 1. Single-agent `Keyed<State>` is `State` itself — no indirection.
//! 2. Multi-agent `Keyed<State>` supports lookup by agent and iteration.
//! 3. The multi-agent-only applicable-actions operation is reachable with
//!    the multi-agent proxy shape and absent from the single-agent shape.

use lock_tests::ChainWorld;
use quarry_proxy::{
    Agent, AgentMap, AgentMode, DomainProxy, FullyControllable, FullyObservable, HostValue,
    Markovian, MultiAgent, SingleAgent, State,
};

fn takes_state(_: &State) {}

#[test]
fn single_agent_keyed_state_collapses_to_state() {
    let world = ChainWorld::new();
    // Compiles only because the projection is the bare wrapper type.
    let keyed: <SingleAgent as AgentMode>::Keyed<State> =
        State::from_host(world.int(5)).unwrap();
    takes_state(&keyed);
    assert_eq!(world.int_value(keyed.as_host()), 5);
}

#[test]
fn multi_agent_map_supports_lookup_and_iteration() {
    let world = ChainWorld::new();
    let agent_a = world.int(100);
    let agent_b = world.int(101);
    let state_a = world.int(1);
    let state_b = world.int(2);
    let dict = world.dict(&[(&agent_a, &state_a), (&agent_b, &state_b)]);

    let map: <MultiAgent as AgentMode>::Keyed<State> = AgentMap::from_host(dict).unwrap();

    let key = Agent::from_host(agent_a.clone()).unwrap();
    let looked_up = map.get(&key).unwrap();
    assert_eq!(world.int_value(looked_up.as_host()), 1);

    let entries = map.entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(map.len().unwrap(), 2);
    assert!(!map.is_empty().unwrap());
}

#[test]
fn multi_agent_proxy_exposes_per_agent_applicable_actions() {
    let world = ChainWorld::new();
    let proxy: DomainProxy<MultiAgent, FullyObservable, Markovian, FullyControllable> =
        DomainProxy::new(world.domain(3));

    let agent_a = world.int(100);
    let state_a = world.int(0);
    let memory: AgentMap<State> = AgentMap::from_host(world.dict(&[(&agent_a, &state_a)])).unwrap();
    let others: AgentMap<quarry_proxy::Action> = AgentMap::from_host(world.dict(&[])).unwrap();
    let agent = Agent::from_host(agent_a.clone()).unwrap();

    let space = proxy
        .get_agent_applicable_actions(&memory, &others, &agent, None)
        .unwrap();
    assert_eq!(space.elements().unwrap().len(), 2);
}
