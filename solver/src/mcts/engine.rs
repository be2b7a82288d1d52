//! The specialized MCTS engine and its execution modes.
//!
//! One engine value exists per resolution. Sequential execution runs
//! simulations on the calling thread; parallel execution runs a fixed pool
//! of native workers over the shared graph, with every host call bracketed
//! by the session lock and the dispatching thread's own lock depth
//! released for the duration of the join.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use quarry_core::{ObjectRef, WorkerId};
use quarry_proxy::{Action, HostValue, State};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::SolverConfig;
use crate::contract::{Diagnostics, Solver};
use crate::error::SolveError;
use crate::mcts::backprop::BackpropPolicy;
use crate::mcts::expand::ExpansionPolicy;
use crate::mcts::graph::SearchGraph;
use crate::mcts::key::NodeKeyPolicy;
use crate::mcts::rollout::RolloutPolicy;
use crate::mcts::select::{ExecutionSelectionPolicy, SelectionPolicy};
use crate::mcts::transition::TransitionMode;
use crate::mcts::tree::{lock_graph, open_node, Descent, SimContext, TreePolicy};
use crate::watchdog::{ImprovementTracker, WatchdogFn, WatchdogStats};
use crate::SolverProxy;

/// Scalar engine parameters, copied out of the front-end configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub time_budget_ms: u64,
    pub rollout_budget: u64,
    pub max_depth: u32,
    pub discount: f64,
    pub exploration: f64,
    pub seed: u64,
    pub workers: usize,
    pub online_pruning: bool,
}

impl EngineSettings {
    /// Copy the scalar fields out of a [`SolverConfig`].
    #[must_use]
    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            time_budget_ms: config.time_budget_ms,
            rollout_budget: config.rollout_budget,
            max_depth: config.max_depth,
            discount: config.discount,
            exploration: config.exploration,
            seed: config.seed,
            workers: config.workers,
            online_pruning: config.online_pruning,
        }
    }
}

/// The engine-facing contract an execution mode drives.
///
/// Implemented by [`MctsEngine`]; public only because [`ExecutionMode`]
/// names it.
pub trait SimulationRunner: Sync {
    /// Run one complete simulation (descent, leaf evaluation, backup).
    ///
    /// # Errors
    ///
    /// Returns [`SolveError`] if a host operation failed.
    fn run_one(&self, worker: Option<WorkerId>) -> Result<(), SolveError>;

    /// Whether a time or rollout budget is exhausted.
    fn budget_exhausted(&self) -> bool;

    /// Whether early termination has been requested.
    fn stop_requested(&self) -> bool;

    /// Request early termination of every worker.
    fn request_stop(&self);

    /// Consult the watchdog; `false` requests termination.
    fn check_watchdog(&self) -> bool;

    /// Worker pool size for parallel dispatch.
    fn worker_count(&self) -> usize;
}

/// Compile-time execution-mode axis.
pub trait ExecutionMode: 'static {
    /// Drive simulations until a budget, stop request, or watchdog verdict.
    ///
    /// # Errors
    ///
    /// Returns the first [`SolveError`] any worker hit.
    fn dispatch<E: SimulationRunner>(engine: &E) -> Result<(), SolveError>;
}

/// Run every simulation on the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct SequentialExecution;

impl ExecutionMode for SequentialExecution {
    fn dispatch<E: SimulationRunner>(engine: &E) -> Result<(), SolveError> {
        while !engine.stop_requested() && !engine.budget_exhausted() {
            engine.run_one(None)?;
            if !engine.check_watchdog() {
                engine.request_stop();
            }
        }
        Ok(())
    }
}

/// Run simulations on a fixed pool of native worker threads.
#[derive(Debug, Clone, Copy)]
pub struct ParallelExecution;

impl ExecutionMode for ParallelExecution {
    fn dispatch<E: SimulationRunner>(engine: &E) -> Result<(), SolveError> {
        let first_error: Mutex<Option<SolveError>> = Mutex::new(None);
        std::thread::scope(|scope| {
            for index in 0..engine.worker_count().max(1) {
                let first_error = &first_error;
                scope.spawn(move || {
                    let worker = WorkerId::new(index);
                    while !engine.stop_requested() && !engine.budget_exhausted() {
                        match engine.run_one(Some(worker)) {
                            Ok(()) => {
                                if !engine.check_watchdog() {
                                    engine.request_stop();
                                    break;
                                }
                            }
                            Err(error) => {
                                let mut slot =
                                    first_error.lock().unwrap_or_else(PoisonError::into_inner);
                                if slot.is_none() {
                                    *slot = Some(error);
                                }
                                engine.request_stop();
                                break;
                            }
                        }
                    }
                });
            }
        });
        match first_error
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// The fully specialized engine behind the type-erased [`Solver`] surface.
pub struct MctsEngine<X, Tr, Ts, EX, AS, AE, RO, BP, K>
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
    proxy: SolverProxy,
    graph: Mutex<SearchGraph<K>>,
    rollout: RO,
    heuristic: Option<ObjectRef>,
    watchdog: Option<WatchdogFn>,
    settings: EngineSettings,
    draws: AtomicU64,
    rollouts: AtomicU64,
    pruned: AtomicU64,
    stop: AtomicBool,
    started: Mutex<Option<Instant>>,
    tracker: Mutex<ImprovementTracker>,
    prefix: Mutex<Vec<Action>>,
    _strategies: PhantomData<fn() -> (X, Tr, Ts, EX, AS, AE, BP)>,
}

impl<X, Tr, Ts, EX, AS, AE, RO, BP, K> MctsEngine<X, Tr, Ts, EX, AS, AE, RO, BP, K>
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
    /// Assemble an engine from its resolved parts.
    #[must_use]
    pub fn new(
        proxy: SolverProxy,
        settings: EngineSettings,
        rollout: RO,
        heuristic: Option<ObjectRef>,
        watchdog: Option<WatchdogFn>,
    ) -> Self {
        Self {
            proxy,
            graph: Mutex::new(SearchGraph::new()),
            rollout,
            heuristic,
            watchdog,
            settings,
            draws: AtomicU64::new(0),
            rollouts: AtomicU64::new(0),
            pruned: AtomicU64::new(0),
            stop: AtomicBool::new(false),
            started: Mutex::new(None),
            tracker: Mutex::new(ImprovementTracker::new()),
            prefix: Mutex::new(Vec::new()),
            _strategies: PhantomData,
        }
    }

    fn graph_lock(&self) -> MutexGuard<'_, SearchGraph<K>> {
        lock_graph(&self.graph)
    }

    fn elapsed(&self) -> Duration {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map_or(Duration::ZERO, |t| t.elapsed())
    }

    fn best_root_value(&self) -> f64 {
        let g = self.graph_lock();
        g.root()
            .and_then(|root| g.node(root))
            .map_or(0.0, |node| node.best_q().unwrap_or(node.value_estimate))
    }

    fn stats(&self) -> WatchdogStats {
        let best = self.best_root_value();
        let ema = self
            .tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(best);
        WatchdogStats {
            elapsed: self.elapsed(),
            rollouts: self.rollouts.load(Ordering::SeqCst),
            best_value: best,
            improvement_ema: ema,
        }
    }

    /// Key the initial situation, open its node if unexplored, and make it
    /// the root.
    fn ensure_root(&self, initial: &State) -> Result<K::Key, SolveError> {
        let key = K::root_key(initial)?;
        if !self.graph_lock().contains(&key) {
            let terminal = self.proxy.is_terminal(initial, None)?;
            let node = open_node::<EX, K>(&self.proxy, initial.clone(), terminal, None)?;
            self.graph_lock().insert(key.clone(), node);
        }
        self.graph_lock().set_root(key.clone());
        Ok(key)
    }

    fn call_heuristic(&self, heuristic: &ObjectRef, state: &State) -> Result<(f64, u64), SolveError> {
        const EXPECTED: &str = "(value, rollout_count) 2-tuple";
        let result = self.proxy.call_callback(heuristic, &[state.as_host().raw()])?;
        let session = self.proxy.session();
        let _guard = session.lock().acquire();
        let runtime = session.runtime();

        let shape_err = || SolveError::CallbackShape { expected: EXPECTED };
        let arity = runtime.tuple_len(result.raw()).map_err(|_| shape_err())?;
        if arity != 2 {
            return Err(shape_err());
        }
        let value_obj = ObjectRef::adopt(
            Arc::clone(session),
            runtime.tuple_get(result.raw(), 0).map_err(|_| shape_err())?,
        );
        let value = runtime.as_float(value_obj.raw()).map_err(|_| shape_err())?;
        let visits_obj = ObjectRef::adopt(
            Arc::clone(session),
            runtime.tuple_get(result.raw(), 1).map_err(|_| shape_err())?,
        );
        let visits = runtime.as_int(visits_obj.raw()).map_err(|_| shape_err())?;
        Ok((value, u64::try_from(visits.max(0)).unwrap_or(0)))
    }

    fn rollout_walk(
        &self,
        start: &State,
        worker: Option<WorkerId>,
        rng: &mut ChaCha8Rng,
    ) -> Result<f64, SolveError> {
        let mut state = start.clone();
        let mut ret = 0.0;
        let mut discount = 1.0;
        for _ in 0..self.settings.max_depth {
            if self.proxy.is_terminal(&state, worker)? {
                break;
            }
            let applicable = self.proxy.get_applicable_actions(&state, worker)?.elements()?;
            if applicable.is_empty() {
                break;
            }
            let action = self
                .rollout
                .pick(&self.proxy, &state, &applicable, worker, rng)?;
            let step = Tr::advance(&self.proxy, &state, &action, worker, rng)?;
            ret += discount * step.reward;
            discount *= self.settings.discount;
            if step.terminal {
                break;
            }
            state = step.next;
        }
        Ok(ret)
    }

    fn evaluate_leaf(
        &self,
        descent: &Descent<K>,
        worker: Option<WorkerId>,
        rng: &mut ChaCha8Rng,
    ) -> Result<f64, SolveError> {
        if let Some(heuristic) = &self.heuristic {
            let (value, virtual_visits) = self.call_heuristic(heuristic, &descent.leaf_state)?;
            let mut g = self.graph_lock();
            if let Some(node) = g.node_mut(&descent.leaf) {
                node.value_estimate = value;
                node.visits += virtual_visits;
            }
            return Ok(value);
        }
        self.rollout_walk(&descent.leaf_state, worker, rng)
    }
}

impl<X, Tr, Ts, EX, AS, AE, RO, BP, K> SimulationRunner
    for MctsEngine<X, Tr, Ts, EX, AS, AE, RO, BP, K>
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
    fn run_one(&self, worker: Option<WorkerId>) -> Result<(), SolveError> {
        let draw = self.draws.fetch_add(1, Ordering::Relaxed);
        let mut rng = ChaCha8Rng::seed_from_u64(self.settings.seed.wrapping_add(draw));

        Tr::begin(&self.proxy, worker)?;
        let root = self
            .graph_lock()
            .root()
            .cloned()
            .ok_or(SolveError::Invariant {
                detail: "simulation dispatched without a root",
            })?;

        let ctx = SimContext {
            proxy: &self.proxy,
            exploration: self.settings.exploration,
            max_depth: self.settings.max_depth,
            worker,
        };
        let descent = Ts::descend::<Tr, EX, AS, K>(&ctx, &self.graph, &root, &mut rng)?;

        let leaf_value = if descent.leaf_terminal {
            0.0
        } else {
            self.evaluate_leaf(&descent, worker, &mut rng)?
        };
        BP::update(
            &mut self.graph_lock(),
            &descent.path,
            leaf_value,
            self.settings.discount,
        );
        self.rollouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn budget_exhausted(&self) -> bool {
        if self.rollouts.load(Ordering::SeqCst) >= self.settings.rollout_budget {
            return true;
        }
        self.settings.time_budget_ms > 0
            && self.elapsed() >= Duration::from_millis(self.settings.time_budget_ms)
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn check_watchdog(&self) -> bool {
        let Some(watchdog) = &self.watchdog else {
            return true;
        };
        let stats = self.stats();
        let keep_going = watchdog(&stats);
        if !keep_going {
            tracing::info!(
                rollouts = stats.rollouts,
                best_value = stats.best_value,
                "watchdog requested early termination"
            );
        }
        keep_going
    }

    fn worker_count(&self) -> usize {
        self.settings.workers
    }
}

impl<X, Tr, Ts, EX, AS, AE, RO, BP, K> Solver for MctsEngine<X, Tr, Ts, EX, AS, AE, RO, BP, K>
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
    fn clear(&mut self) {
        self.graph_lock().clear();
        self.draws.store(0, Ordering::SeqCst);
        self.rollouts.store(0, Ordering::SeqCst);
        self.pruned.store(0, Ordering::SeqCst);
        self.stop.store(false, Ordering::SeqCst);
        *self.started.lock().unwrap_or_else(PoisonError::into_inner) = None;
        *self.tracker.lock().unwrap_or_else(PoisonError::into_inner) = ImprovementTracker::new();
        self.prefix
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn solve(&mut self, initial: &State) -> Result<(), SolveError> {
        self.stop.store(false, Ordering::SeqCst);
        self.rollouts.store(0, Ordering::SeqCst);
        *self.started.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        *self.tracker.lock().unwrap_or_else(PoisonError::into_inner) = ImprovementTracker::new();

        self.ensure_root(initial)?;
        tracing::info!(
            rollout_budget = self.settings.rollout_budget,
            workers = self.settings.workers,
            "solve started"
        );

        // The dispatching thread must not pin the host lock across the
        // blocking phase; workers bracket their own calls.
        let session = Arc::clone(self.proxy.session());
        let outcome = session.lock().unlocked(|| X::dispatch(&*self));
        tracing::info!(
            rollouts = self.rollouts.load(Ordering::SeqCst),
            explored = self.graph_lock().len(),
            "solve finished"
        );
        outcome
    }

    fn is_solution_defined_for(&self, situation: &State) -> Result<bool, SolveError> {
        let key = K::root_key(situation)?;
        let g = self.graph_lock();
        Ok(g.node(&key).is_some_and(|node| AE::choose(node).is_some()))
    }

    fn get_next_action(&mut self, situation: &State) -> Result<Option<Action>, SolveError> {
        let key = K::root_key(situation)?;

        if self.settings.online_pruning {
            let mut g = self.graph_lock();
            let moved_root = g.root().is_some_and(|root| *root != key);
            if moved_root && g.contains(&key) {
                g.set_root(key.clone());
                let dropped = g.retain_reachable(&key);
                self.pruned.fetch_add(dropped, Ordering::SeqCst);
            }
        }

        let chosen = {
            let g = self.graph_lock();
            let Some(node) = g.node(&key) else {
                return Ok(None);
            };
            AE::choose(node).map(|i| node.edges[i].action.clone())
        };
        if let Some(action) = &chosen {
            if self.settings.online_pruning {
                self.prefix
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(action.clone());
            }
        }
        Ok(chosen)
    }

    fn get_utility(&self, situation: &State) -> Result<Option<f64>, SolveError> {
        let key = K::root_key(situation)?;
        let g = self.graph_lock();
        Ok(g.node(&key)
            .map(|node| node.best_q().unwrap_or(node.value_estimate)))
    }

    fn get_policy(&self) -> Result<Vec<(State, (Action, f64))>, SolveError> {
        let g = self.graph_lock();
        let mut out = Vec::new();
        for (_, node) in g.iter() {
            if let Some(i) = AE::choose(node) {
                let edge = &node.edges[i];
                out.push((node.state.clone(), (edge.action.clone(), edge.q())));
            }
        }
        Ok(out)
    }

    fn get_action_prefix(&self) -> Vec<Action> {
        self.prefix
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            explored_states: self.graph_lock().len() as u64,
            pruned_states: self.pruned.load(Ordering::SeqCst),
            rollouts: self.rollouts.load(Ordering::SeqCst),
        }
    }
}
