//! A scripted in-memory host runtime.
//!
//! Objects live in a refcounted table keyed by raw handle. Every trait
//! method passes through a critical-section probe so tests can assert that
//! no two threads are ever inside the host simultaneously, and domain
//! method calls are counted by name so tests can assert fail-fast
//! validation ordering.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use quarry_core::{HostError, HostRuntime, RawHandle};

/// Scripted behavior of a host callable.
#[derive(Debug, Clone, Copy)]
pub enum CallbackBehavior {
    /// A rollout policy `(state) -> action` that always moves right.
    AlwaysRight,
    /// A heuristic `(state) -> (value, rollout_count)`.
    HeuristicPair(f64, i64),
    /// A heuristic returning a 3-tuple (wrong arity).
    HeuristicWrongShape,
}

/// The stub decision domain: a chain of integer states `0..=length`,
/// actions `0` (left) and `1` (right), reward `1.0` on first reaching
/// `length`, terminal at `length`.
#[derive(Debug, Clone)]
pub struct ChainDomain {
    pub length: i64,
    pub cursor: i64,
    pub exposed: BTreeSet<String>,
}

/// One host object.
#[derive(Debug, Clone)]
pub enum HostObject {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Tuple(Vec<u64>),
    List(Vec<u64>),
    Dict(Vec<(u64, u64)>),
    Domain(ChainDomain),
    Space { elems: Vec<u64>, empty_marker: bool },
    Distribution(Vec<(u64, f64)>),
    Callable(CallbackBehavior),
}

struct Entry {
    obj: HostObject,
    refs: usize,
}

/// The scripted runtime.
pub struct ScriptedHost {
    objects: Mutex<HashMap<u64, Entry>>,
    next_id: AtomicU64,
    calls: Mutex<BTreeMap<String, u64>>,
    in_critical: AtomicUsize,
    max_critical: AtomicUsize,
    overlap_seen: AtomicBool,
}

struct CriticalGuard<'a> {
    host: &'a ScriptedHost,
}

impl Drop for CriticalGuard<'_> {
    fn drop(&mut self) {
        self.host.in_critical.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Snapshot of a call target, copied out of the table so follow-up
/// allocations don't fight the borrow.
enum Target {
    Domain {
        length: i64,
        cursor: i64,
        exposes: bool,
    },
    Space {
        elems: Vec<u64>,
        empty_marker: bool,
    },
    Distribution(Vec<(u64, f64)>),
    Other,
}

fn raised(op: &str, message: impl Into<String>) -> HostError {
    HostError::Raised {
        op: op.to_string(),
        message: message.into(),
    }
}

/// One chain transition: `(next, reward, terminal)`.
fn chain_step(length: i64, state: i64, action: i64) -> (i64, f64, bool) {
    let delta = if action == 1 { 1 } else { -1 };
    let next = (state + delta).clamp(0, length);
    let reward = if next == length && state != length {
        1.0
    } else {
        0.0
    };
    (next, reward, next == length)
}

impl ScriptedHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            calls: Mutex::new(BTreeMap::new()),
            in_critical: AtomicUsize::new(0),
            max_critical: AtomicUsize::new(0),
            overlap_seen: AtomicBool::new(false),
        }
    }

    fn enter(&self) -> CriticalGuard<'_> {
        let now = self.in_critical.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_critical.fetch_max(now, Ordering::SeqCst);
        if now > 1 {
            self.overlap_seen.store(true, Ordering::SeqCst);
        }
        CriticalGuard { host: self }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<u64, Entry>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn count(&self, name: &str) {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        *calls.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Times a named method was invoked (domain calls and `has_method`
    /// probes alike).
    #[must_use]
    pub fn call_count(&self, name: &str) -> u64 {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of threads ever observed inside the host at once.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_critical.load(Ordering::SeqCst)
    }

    /// Whether two threads were ever inside the host simultaneously.
    #[must_use]
    pub fn overlap_seen(&self) -> bool {
        self.overlap_seen.load(Ordering::SeqCst)
    }

    /// Number of live objects in the table.
    #[must_use]
    pub fn live_objects(&self) -> usize {
        self.table().len()
    }

    /// Allocate a new object with one owned reference.
    pub fn alloc(&self, obj: HostObject) -> RawHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.table().insert(id, Entry { obj, refs: 1 });
        RawHandle::new(id)
    }

    fn alloc_locked(&self, table: &mut HashMap<u64, Entry>, obj: HostObject) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        table.insert(id, Entry { obj, refs: 1 });
        id
    }

    fn int_of(table: &HashMap<u64, Entry>, handle: u64, op: &str) -> Result<i64, HostError> {
        match table.get(&handle).map(|e| &e.obj) {
            Some(HostObject::Int(v)) => Ok(*v),
            _ => Err(raised(op, "expected an integer argument")),
        }
    }

    fn bump(table: &mut HashMap<u64, Entry>, handle: u64) {
        if let Some(entry) = table.get_mut(&handle) {
            entry.refs += 1;
        }
    }

    fn snapshot(table: &HashMap<u64, Entry>, handle: u64, name: &str) -> Target {
        match table.get(&handle).map(|e| &e.obj) {
            Some(HostObject::Domain(d)) => Target::Domain {
                length: d.length,
                cursor: d.cursor,
                exposes: d.exposed.contains(name),
            },
            Some(HostObject::Space { elems, empty_marker }) => Target::Space {
                elems: elems.clone(),
                empty_marker: *empty_marker,
            },
            Some(HostObject::Distribution(entries)) => Target::Distribution(entries.clone()),
            _ => Target::Other,
        }
    }

    fn outcome_tuple(
        &self,
        table: &mut HashMap<u64, Entry>,
        next: i64,
        reward: f64,
        terminal: bool,
    ) -> u64 {
        let state = self.alloc_locked(table, HostObject::Int(next));
        let value = self.alloc_locked(table, HostObject::Float(reward));
        let done = self.alloc_locked(table, HostObject::Bool(terminal));
        let info = self.alloc_locked(table, HostObject::None);
        self.alloc_locked(table, HostObject::Tuple(vec![state, value, done, info]))
    }

    fn action_space(&self, table: &mut HashMap<u64, Entry>) -> u64 {
        let left = self.alloc_locked(table, HostObject::Int(0));
        let right = self.alloc_locked(table, HostObject::Int(1));
        self.alloc_locked(
            table,
            HostObject::Space {
                elems: vec![left, right],
                empty_marker: true,
            },
        )
    }

    fn domain_call(
        &self,
        target: u64,
        name: &str,
        args: &[RawHandle],
        length: i64,
        cursor: i64,
    ) -> Result<u64, HostError> {
        let mut table = self.table();
        let arg = |i: usize| -> Result<u64, HostError> {
            args.get(i)
                .map(|h| h.get())
                .ok_or_else(|| raised(name, "missing argument"))
        };
        match name {
            "reset" => {
                if let Some(entry) = table.get_mut(&target) {
                    if let HostObject::Domain(d) = &mut entry.obj {
                        d.cursor = 0;
                    }
                }
                Ok(self.alloc_locked(&mut table, HostObject::Int(0)))
            }
            "step" => {
                let action = Self::int_of(&table, arg(0)?, name)?;
                let (next, reward, terminal) = chain_step(length, cursor, action);
                if let Some(entry) = table.get_mut(&target) {
                    if let HostObject::Domain(d) = &mut entry.obj {
                        d.cursor = next;
                    }
                }
                Ok(self.outcome_tuple(&mut table, next, reward, terminal))
            }
            "sample" => {
                let state = Self::int_of(&table, arg(0)?, name)?;
                let action = Self::int_of(&table, arg(1)?, name)?;
                let (next, reward, terminal) = chain_step(length, state, action);
                Ok(self.outcome_tuple(&mut table, next, reward, terminal))
            }
            "get_applicable_actions" | "get_agent_applicable_actions" => {
                Ok(self.action_space(&mut table))
            }
            "get_enabled_events" => Ok(self.action_space(&mut table)),
            "get_next_state" => {
                let state = Self::int_of(&table, arg(0)?, name)?;
                let action = Self::int_of(&table, arg(1)?, name)?;
                let (next, _, _) = chain_step(length, state, action);
                Ok(self.alloc_locked(&mut table, HostObject::Int(next)))
            }
            "get_next_state_distribution" => {
                let state = Self::int_of(&table, arg(0)?, name)?;
                let action = Self::int_of(&table, arg(1)?, name)?;
                let (next, _, _) = chain_step(length, state, action);
                let next_id = self.alloc_locked(&mut table, HostObject::Int(next));
                Ok(self.alloc_locked(&mut table, HostObject::Distribution(vec![(next_id, 1.0)])))
            }
            "get_transition_value" => {
                let state = Self::int_of(&table, arg(0)?, name)?;
                let action = Self::int_of(&table, arg(1)?, name)?;
                let (_, reward, _) = chain_step(length, state, action);
                Ok(self.alloc_locked(&mut table, HostObject::Float(reward)))
            }
            "is_terminal" => {
                let state = Self::int_of(&table, arg(0)?, name)?;
                Ok(self.alloc_locked(&mut table, HostObject::Bool(state >= length)))
            }
            _ => Err(raised(name, format!("domain has no method `{name}`"))),
        }
    }

    fn space_call(
        &self,
        name: &str,
        args: &[RawHandle],
        elems: &[u64],
        empty_marker: bool,
    ) -> Result<u64, HostError> {
        let mut table = self.table();
        match name {
            "sample" => {
                let first = *elems
                    .first()
                    .ok_or_else(|| raised(name, "sampled an empty space"))?;
                Self::bump(&mut table, first);
                Ok(first)
            }
            "contains" => {
                let probe = args
                    .first()
                    .map(|h| h.get())
                    .ok_or_else(|| raised(name, "missing argument"))?;
                let probe_val = Self::int_of(&table, probe, name)?;
                let found = elems
                    .iter()
                    .any(|e| matches!(table.get(e).map(|x| &x.obj), Some(HostObject::Int(v)) if *v == probe_val));
                Ok(self.alloc_locked(&mut table, HostObject::Bool(found)))
            }
            "get_elements" => {
                for e in elems {
                    Self::bump(&mut table, *e);
                }
                Ok(self.alloc_locked(&mut table, HostObject::List(elems.to_vec())))
            }
            "is_empty" if empty_marker => {
                Ok(self.alloc_locked(&mut table, HostObject::Bool(elems.is_empty())))
            }
            _ => Err(raised(name, format!("space has no method `{name}`"))),
        }
    }
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRuntime for ScriptedHost {
    fn call_method(
        &self,
        target: RawHandle,
        name: &str,
        args: &[RawHandle],
    ) -> Result<RawHandle, HostError> {
        let _probe = self.enter();
        self.count(name);
        let snapshot = Self::snapshot(&self.table(), target.get(), name);
        let id = match snapshot {
            Target::Domain {
                length,
                cursor,
                exposes,
            } => {
                if !exposes {
                    return Err(raised(name, format!("domain has no method `{name}`")));
                }
                self.domain_call(target.get(), name, args, length, cursor)?
            }
            Target::Space { elems, empty_marker } => {
                self.space_call(name, args, &elems, empty_marker)?
            }
            Target::Distribution(entries) => {
                if name != "get_values" {
                    return Err(raised(name, "distribution has no such method"));
                }
                let mut table = self.table();
                let mut pairs = Vec::with_capacity(entries.len());
                for (state, weight) in entries {
                    Self::bump(&mut table, state);
                    let w = self.alloc_locked(&mut table, HostObject::Float(weight));
                    pairs.push(self.alloc_locked(&mut table, HostObject::Tuple(vec![state, w])));
                }
                self.alloc_locked(&mut table, HostObject::List(pairs))
            }
            Target::Other => return Err(raised(name, "object has no methods")),
        };
        Ok(RawHandle::new(id))
    }

    fn call_function(
        &self,
        callable: RawHandle,
        args: &[RawHandle],
    ) -> Result<RawHandle, HostError> {
        let _probe = self.enter();
        self.count("__call__");
        let behavior = match self.table().get(&callable.get()).map(|e| &e.obj) {
            Some(HostObject::Callable(b)) => *b,
            _ => return Err(raised("__call__", "object is not callable")),
        };
        let mut table = self.table();
        let id = match behavior {
            CallbackBehavior::AlwaysRight => self.alloc_locked(&mut table, HostObject::Int(1)),
            CallbackBehavior::HeuristicPair(value, visits) => {
                let v = self.alloc_locked(&mut table, HostObject::Float(value));
                let n = self.alloc_locked(&mut table, HostObject::Int(visits));
                self.alloc_locked(&mut table, HostObject::Tuple(vec![v, n]))
            }
            CallbackBehavior::HeuristicWrongShape => {
                let a = self.alloc_locked(&mut table, HostObject::Float(0.0));
                let b = self.alloc_locked(&mut table, HostObject::Int(0));
                let c = self.alloc_locked(&mut table, HostObject::Int(0));
                self.alloc_locked(&mut table, HostObject::Tuple(vec![a, b, c]))
            }
        };
        let _ = args;
        Ok(RawHandle::new(id))
    }

    fn has_method(&self, target: RawHandle, name: &str) -> bool {
        let _probe = self.enter();
        self.count("__has_method__");
        match self.table().get(&target.get()).map(|e| &e.obj) {
            Some(HostObject::Domain(d)) => d.exposed.contains(name),
            Some(HostObject::Space { empty_marker, .. }) => {
                matches!(name, "sample" | "contains" | "get_elements")
                    || (name == "is_empty" && *empty_marker)
            }
            Some(HostObject::Distribution(_)) => name == "get_values",
            _ => false,
        }
    }

    fn is_none(&self, handle: RawHandle) -> bool {
        let _probe = self.enter();
        matches!(
            self.table().get(&handle.get()).map(|e| &e.obj),
            Some(HostObject::None)
        )
    }

    fn truthy(&self, handle: RawHandle) -> Result<bool, HostError> {
        let _probe = self.enter();
        match self.table().get(&handle.get()).map(|e| &e.obj) {
            Some(HostObject::Bool(b)) => Ok(*b),
            Some(HostObject::Int(v)) => Ok(*v != 0),
            Some(HostObject::Float(v)) => Ok(*v != 0.0),
            Some(HostObject::None) => Ok(false),
            Some(_) => Ok(true),
            None => Err(HostError::UnknownHandle(handle)),
        }
    }

    fn as_float(&self, handle: RawHandle) -> Result<f64, HostError> {
        let _probe = self.enter();
        match self.table().get(&handle.get()).map(|e| &e.obj) {
            Some(HostObject::Float(v)) => Ok(*v),
            #[allow(clippy::cast_precision_loss)]
            Some(HostObject::Int(v)) => Ok(*v as f64),
            _ => Err(HostError::TypeMismatch { expected: "float" }),
        }
    }

    fn as_int(&self, handle: RawHandle) -> Result<i64, HostError> {
        let _probe = self.enter();
        match self.table().get(&handle.get()).map(|e| &e.obj) {
            Some(HostObject::Int(v)) => Ok(*v),
            _ => Err(HostError::TypeMismatch { expected: "int" }),
        }
    }

    fn tuple_len(&self, handle: RawHandle) -> Result<usize, HostError> {
        let _probe = self.enter();
        match self.table().get(&handle.get()).map(|e| &e.obj) {
            Some(HostObject::Tuple(items)) => Ok(items.len()),
            _ => Err(HostError::TypeMismatch { expected: "tuple" }),
        }
    }

    fn tuple_get(&self, handle: RawHandle, index: usize) -> Result<RawHandle, HostError> {
        let _probe = self.enter();
        let mut table = self.table();
        let item = match table.get(&handle.get()).map(|e| &e.obj) {
            Some(HostObject::Tuple(items)) => items.get(index).copied(),
            _ => return Err(HostError::TypeMismatch { expected: "tuple" }),
        };
        let item = item.ok_or(HostError::UnknownHandle(handle))?;
        Self::bump(&mut table, item);
        Ok(RawHandle::new(item))
    }

    fn list_elems(&self, handle: RawHandle) -> Result<Vec<RawHandle>, HostError> {
        let _probe = self.enter();
        let mut table = self.table();
        let items = match table.get(&handle.get()).map(|e| &e.obj) {
            Some(HostObject::List(items)) => items.clone(),
            _ => return Err(HostError::TypeMismatch { expected: "list" }),
        };
        for item in &items {
            Self::bump(&mut table, *item);
        }
        Ok(items.into_iter().map(RawHandle::new).collect())
    }

    fn make_list(&self, elems: &[RawHandle]) -> Result<RawHandle, HostError> {
        let _probe = self.enter();
        let mut table = self.table();
        let ids: Vec<u64> = elems.iter().map(|h| h.get()).collect();
        for id in &ids {
            Self::bump(&mut table, *id);
        }
        Ok(RawHandle::new(
            self.alloc_locked(&mut table, HostObject::List(ids)),
        ))
    }

    fn dict_keys(&self, handle: RawHandle) -> Result<Vec<RawHandle>, HostError> {
        let _probe = self.enter();
        let mut table = self.table();
        let keys = match table.get(&handle.get()).map(|e| &e.obj) {
            Some(HostObject::Dict(pairs)) => pairs.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            _ => return Err(HostError::TypeMismatch { expected: "dict" }),
        };
        for key in &keys {
            Self::bump(&mut table, *key);
        }
        Ok(keys.into_iter().map(RawHandle::new).collect())
    }

    fn dict_get(&self, handle: RawHandle, key: RawHandle) -> Result<RawHandle, HostError> {
        let _probe = self.enter();
        let mut table = self.table();
        let pairs = match table.get(&handle.get()).map(|e| &e.obj) {
            Some(HostObject::Dict(pairs)) => pairs.clone(),
            _ => return Err(HostError::TypeMismatch { expected: "dict" }),
        };
        for (k, v) in pairs {
            let equal = match (
                table.get(&k).map(|e| &e.obj),
                table.get(&key.get()).map(|e| &e.obj),
            ) {
                (Some(HostObject::Int(a)), Some(HostObject::Int(b))) => a == b,
                _ => k == key.get(),
            };
            if equal {
                Self::bump(&mut table, v);
                return Ok(RawHandle::new(v));
            }
        }
        Err(raised("dict_get", "key not found"))
    }

    fn equals(&self, a: RawHandle, b: RawHandle) -> Result<bool, HostError> {
        let _probe = self.enter();
        let table = self.table();
        let lhs = table.get(&a.get()).map(|e| &e.obj);
        let rhs = table.get(&b.get()).map(|e| &e.obj);
        Ok(match (lhs, rhs) {
            (Some(HostObject::Int(x)), Some(HostObject::Int(y))) => x == y,
            (Some(HostObject::Float(x)), Some(HostObject::Float(y))) => {
                (x - y).abs() < f64::EPSILON
            }
            (Some(HostObject::Bool(x)), Some(HostObject::Bool(y))) => x == y,
            (Some(HostObject::None), Some(HostObject::None)) => true,
            _ => a == b,
        })
    }

    fn hash_value(&self, handle: RawHandle) -> Result<u64, HostError> {
        let _probe = self.enter();
        match self.table().get(&handle.get()).map(|e| &e.obj) {
            #[allow(clippy::cast_sign_loss)]
            Some(HostObject::Int(v)) => Ok(*v as u64),
            Some(HostObject::Float(v)) => Ok(v.to_bits()),
            Some(HostObject::Bool(b)) => Ok(u64::from(*b)),
            Some(HostObject::None) => Ok(0),
            Some(_) => Ok(handle.get()),
            None => Err(HostError::UnknownHandle(handle)),
        }
    }

    fn clone_ref(&self, handle: RawHandle) -> RawHandle {
        let _probe = self.enter();
        Self::bump(&mut self.table(), handle.get());
        handle
    }

    fn release(&self, handle: RawHandle) {
        let _probe = self.enter();
        let mut table = self.table();
        if let Some(entry) = table.get_mut(&handle.get()) {
            entry.refs = entry.refs.saturating_sub(1);
            if entry.refs == 0 {
                table.remove(&handle.get());
            }
        }
    }
}
