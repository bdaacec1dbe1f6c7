//! The tracing interpreter
//!
//! A model body is ordinary Rust that calls two primitives on a [`Tracer`]:
//! `trace` (invoke a callee generative function at an address) and `cache`
//! (memoize a deterministic computation at an address). What those
//! primitives *mean* is decided by the active [`Handler`].
//!
//! The handler is a type parameter of [`Model::call`], so every generative
//! function operation instantiates the model body with one concrete handler.
//! Handler selection happens at compile time and the compiled body calls the
//! handler's methods directly.
//!
//! The tracer is the invocation-scoped interpretation context. It is created
//! by [`interpret`] for one call of one model and dropped when that call
//! returns, on success and on error alike, so nested and concurrent
//! invocations never observe each other's state.

use crate::datatypes::address::Address;
use crate::datatypes::trie::Trie;
use crate::datatypes::value::Value;
use crate::error::{GenError, GenResult};
use crate::generative::traits::{GenFn, GenerativeFunction};
use crate::random::Key;

/// A reinterpretation of the `trace` and `cache` primitives
pub trait Handler {
    /// Short name of the operation this handler realizes, for logging
    fn kind(&self) -> &'static str;

    /// Interpret `trace(addr, callee)(key, args)`
    fn handle_trace(
        &mut self,
        addr: &Address,
        callee: &GenFn,
        key: Key,
        args: &[Value],
    ) -> GenResult<(Key, Value)>;

    /// Interpret `cache(addr, f)(key, args)`; `key` is already split off
    /// for `f`, so only the value flows back
    fn handle_cache<F>(
        &mut self,
        addr: &Address,
        key: Key,
        args: &[Value],
        f: F,
    ) -> GenResult<Value>
    where
        F: FnOnce(Key, &[Value]) -> GenResult<(Key, Value)>;
}

/// A model body written against the tracing primitives.
///
/// ```rust
/// use fugue_gen::prelude::*;
///
/// struct TwoFlips;
///
/// impl Model for TwoFlips {
///     fn call<H: Handler>(
///         &self,
///         t: &mut Tracer<'_, H>,
///         key: Key,
///         args: &[Value],
///     ) -> GenResult<(Key, Value)> {
///         let p = args[0].clone();
///         let (key, m1) = t.trace("m1", &bernoulli(), key, &[p.clone()])?;
///         let (key, m2) = t.trace("m2", &bernoulli(), key, &[p])?;
///         Ok((key, Value::Int(m1.as_int()? + m2.as_int()?)))
///     }
/// }
///
/// let model = gen(TwoFlips);
/// let trace = model.simulate(Key::new(0), &[Value::real(0.3)]).unwrap();
/// assert_eq!(trace.get_choices().len(), 2);
/// ```
pub trait Model: Send + Sync + 'static {
    /// Run the body; thread `key` through every primitive call
    fn call<H: Handler>(
        &self,
        tracer: &mut Tracer<'_, H>,
        key: Key,
        args: &[Value],
    ) -> GenResult<(Key, Value)>;
}

/// Invocation-scoped interpretation context handed to a model body
pub struct Tracer<'h, H> {
    handler: &'h mut H,
    visited: Trie<()>,
}

impl<'h, H: Handler> Tracer<'h, H> {
    fn new(handler: &'h mut H) -> Self {
        Self {
            handler,
            visited: Trie::new(),
        }
    }

    /// Invoke `callee` at `addr`
    pub fn trace(
        &mut self,
        addr: impl Into<Address>,
        callee: &GenFn,
        key: Key,
        args: &[Value],
    ) -> GenResult<(Key, Value)> {
        let addr = addr.into();
        self.claim(&addr)?;
        tracing::trace!(address = %addr, callee = callee.name(), handler = self.handler.kind(), "trace");
        self.handler
            .handle_trace(&addr, callee, key, args)
            .map_err(|e| e.within(&addr))
    }

    /// Memoize `f(key, args)` at `addr`.
    ///
    /// `f` receives a key split from `key`, and the key it returns is not
    /// threaded further. The returned key is the same whether the value was
    /// computed or reused from a previous trace.
    pub fn cache<F>(
        &mut self,
        addr: impl Into<Address>,
        key: Key,
        args: &[Value],
        f: F,
    ) -> GenResult<(Key, Value)>
    where
        F: FnOnce(Key, &[Value]) -> GenResult<(Key, Value)>,
    {
        let addr = addr.into();
        self.claim(&addr)?;
        tracing::trace!(address = %addr, handler = self.handler.kind(), "cache");
        let (key, sub_key) = key.split();
        let value = self.handler.handle_cache(&addr, sub_key, args, f)?;
        Ok((key, value))
    }

    /// Addresses claimed so far in this invocation
    pub fn visited(&self) -> &Trie<()> {
        &self.visited
    }

    fn claim(&mut self, addr: &Address) -> GenResult<()> {
        if addr.is_empty() {
            return Err(GenError::ShapeConflict(Address::root()));
        }
        if self.visited.is_occupied(addr) {
            return Err(GenError::DuplicateAddress(addr.clone()));
        }
        self.visited = self.visited.insert(addr, ())?;
        Ok(())
    }
}

/// Outcome of interpreting one model body
pub struct Interpreted {
    pub key: Key,
    pub retval: Value,
    /// Every address the body claimed
    pub visited: Trie<()>,
}

/// Run `model` once with `handler` interpreting its primitives
pub fn interpret<M: Model, H: Handler>(
    model: &M,
    handler: &mut H,
    name: &str,
    key: Key,
    args: &[Value],
) -> GenResult<Interpreted> {
    let span = tracing::debug_span!("interpret", handler = handler.kind(), gen_fn = name);
    let _entered = span.enter();

    let mut tracer = Tracer::new(handler);
    let (key, retval) = model.call(&mut tracer, key, args)?;
    Ok(Interpreted {
        key,
        retval,
        visited: tracer.visited,
    })
}
