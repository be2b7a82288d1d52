//! Host space wrappers: applicable-action / enabled-event spaces and
//! next-state distributions.

use std::marker::PhantomData;
use std::sync::Arc;

use quarry_core::{ObjectRef, RawHandle};

use crate::error::ProxyError;
use crate::values::HostValue;

/// Capability names a host space object may expose.
mod ops {
    pub const SAMPLE: &str = "sample";
    pub const CONTAINS: &str = "contains";
    pub const GET_ELEMENTS: &str = "get_elements";
    pub const IS_EMPTY: &str = "is_empty";
    pub const GET_VALUES: &str = "get_values";
}

/// A host space of elements: sample one, test membership, enumerate.
///
/// Emptiness is derived from the host's dedicated empty marker when the
/// space exposes one, otherwise by enumerating and checking the result.
#[derive(Debug)]
pub struct EventSpace<E: HostValue> {
    obj: ObjectRef,
    _elems: PhantomData<fn() -> E>,
}

impl<E: HostValue> EventSpace<E> {
    fn call(&self, op: &'static str, args: &[RawHandle]) -> Result<ObjectRef, ProxyError> {
        let session = self.obj.session();
        let _guard = session.lock().acquire();
        let raw = session
            .runtime()
            .call_method(self.obj.raw(), op, args)
            .map_err(|source| ProxyError::host(op, source))?;
        Ok(ObjectRef::adopt(Arc::clone(session), raw))
    }

    /// Sample one element from the space.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised or returned none.
    pub fn sample_element(&self) -> Result<E, ProxyError> {
        let obj = self.call(ops::SAMPLE, &[])?;
        E::from_host(obj)
    }

    /// Test whether the space contains an element.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised.
    pub fn contains(&self, elem: &E) -> Result<bool, ProxyError> {
        let session = self.obj.session();
        let _guard = session.lock().acquire();
        let verdict = self.call(ops::CONTAINS, &[elem.as_host().raw()])?;
        session
            .runtime()
            .truthy(verdict.raw())
            .map_err(|source| ProxyError::host(ops::CONTAINS, source))
    }

    /// Enumerate all elements of the space.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised during enumeration.
    pub fn elements(&self) -> Result<Vec<E>, ProxyError> {
        let session = self.obj.session();
        let _guard = session.lock().acquire();
        let list = self.call(ops::GET_ELEMENTS, &[])?;
        let raws = session
            .runtime()
            .list_elems(list.raw())
            .map_err(|source| ProxyError::host(ops::GET_ELEMENTS, source))?;
        raws.into_iter()
            .map(|raw| E::from_host(ObjectRef::adopt(Arc::clone(session), raw)))
            .collect()
    }

    /// Whether the space is empty.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the host raised.
    pub fn is_empty(&self) -> Result<bool, ProxyError> {
        let session = self.obj.session();
        let has_marker = {
            let _guard = session.lock().acquire();
            session.runtime().has_method(self.obj.raw(), ops::IS_EMPTY)
        };
        if has_marker {
            let verdict = self.call(ops::IS_EMPTY, &[])?;
            let _guard = session.lock().acquire();
            return session
                .runtime()
                .truthy(verdict.raw())
                .map_err(|source| ProxyError::host(ops::IS_EMPTY, source));
        }
        Ok(self.elements()?.is_empty())
    }
}

impl<E: HostValue> Clone for EventSpace<E> {
    fn clone(&self) -> Self {
        Self {
            obj: self.obj.clone(),
            _elems: PhantomData,
        }
    }
}

impl<E: HostValue> HostValue for EventSpace<E> {
    const KIND: &'static str = "EventSpace";

    fn from_trusted(obj: ObjectRef) -> Self {
        Self {
            obj,
            _elems: PhantomData,
        }
    }

    fn as_host(&self) -> &ObjectRef {
        &self.obj
    }

    fn into_host(self) -> ObjectRef {
        self.obj
    }
}

/// A host distribution over successor situations.
#[derive(Debug)]
pub struct NextStateDistribution<S: HostValue> {
    obj: ObjectRef,
    _situations: PhantomData<fn() -> S>,
}

impl<S: HostValue> NextStateDistribution<S> {
    /// Enumerate `(situation, weight)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Shape`] if an entry is not a 2-tuple, or
    /// [`ProxyError::HostCall`] if the host raised.
    pub fn entries(&self) -> Result<Vec<(S, f64)>, ProxyError> {
        const OP: &str = "distribution.entries";
        let session = self.obj.session();
        let _guard = session.lock().acquire();
        let runtime = session.runtime();
        let list_raw = runtime
            .call_method(self.obj.raw(), ops::GET_VALUES, &[])
            .map_err(|source| ProxyError::host(OP, source))?;
        let list = ObjectRef::adopt(Arc::clone(session), list_raw);
        let raws = runtime
            .list_elems(list.raw())
            .map_err(|source| ProxyError::host(OP, source))?;

        let mut out = Vec::with_capacity(raws.len());
        for raw in raws {
            let pair = ObjectRef::adopt(Arc::clone(session), raw);
            let arity = runtime
                .tuple_len(pair.raw())
                .map_err(|source| ProxyError::host(OP, source))?;
            if arity != 2 {
                return Err(ProxyError::Shape {
                    op: OP,
                    expected: "(situation, weight) 2-tuple",
                });
            }
            let situation_raw = runtime
                .tuple_get(pair.raw(), 0)
                .map_err(|source| ProxyError::host(OP, source))?;
            let situation = S::from_host(ObjectRef::adopt(Arc::clone(session), situation_raw))?;
            let weight_raw = runtime
                .tuple_get(pair.raw(), 1)
                .map_err(|source| ProxyError::host(OP, source))?;
            let weight_obj = ObjectRef::adopt(Arc::clone(session), weight_raw);
            let weight = runtime
                .as_float(weight_obj.raw())
                .map_err(|source| ProxyError::host(OP, source))?;
            out.push((situation, weight));
        }
        Ok(out)
    }
}

impl<S: HostValue> Clone for NextStateDistribution<S> {
    fn clone(&self) -> Self {
        Self {
            obj: self.obj.clone(),
            _situations: PhantomData,
        }
    }
}

impl<S: HostValue> HostValue for NextStateDistribution<S> {
    const KIND: &'static str = "NextStateDistribution";

    fn from_trusted(obj: ObjectRef) -> Self {
        Self {
            obj,
            _situations: PhantomData,
        }
    }

    fn as_host(&self) -> &ObjectRef {
        &self.obj
    }

    fn into_host(self) -> ObjectRef {
        self.obj
    }
}
