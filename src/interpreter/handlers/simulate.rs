//! Forward sampling

use std::sync::Arc;

use super::TraceBuilder;
use crate::datatypes::address::Address;
use crate::datatypes::value::Value;
use crate::error::GenResult;
use crate::generative::trace::Trace;
use crate::generative::traits::{GenFn, GenerativeFunction};
use crate::interpreter::static_gen_fn::StaticGenFn;
use crate::interpreter::tracer::{interpret, Handler, Model};
use crate::random::Key;

/// Samples every traced callee from its prior and records a full trace
#[derive(Debug, Default)]
pub struct Simulate {
    builder: TraceBuilder,
}

impl Simulate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `gen_fn` forward and return its trace
    pub fn handle<M: Model>(
        mut self,
        gen_fn: Arc<StaticGenFn<M>>,
        key: Key,
        args: &[Value],
    ) -> GenResult<Trace> {
        let out = interpret(gen_fn.model(), &mut self, gen_fn.name(), key, args)?;
        let trace = self.builder.finish(gen_fn, args, out.retval);
        tracing::debug!(score = trace.get_score(), "simulated");
        Ok(trace)
    }
}

impl Handler for Simulate {
    fn kind(&self) -> &'static str {
        "simulate"
    }

    fn handle_trace(
        &mut self,
        addr: &Address,
        callee: &GenFn,
        key: Key,
        args: &[Value],
    ) -> GenResult<(Key, Value)> {
        let (key, sub_key) = key.split();
        let sub = Arc::clone(callee).simulate(sub_key, args)?;
        let retval = sub.get_retval().clone();
        self.builder.record(addr, sub)?;
        Ok((key, retval))
    }

    fn handle_cache<F>(
        &mut self,
        addr: &Address,
        key: Key,
        args: &[Value],
        f: F,
    ) -> GenResult<Value>
    where
        F: FnOnce(Key, &[Value]) -> GenResult<(Key, Value)>,
    {
        let (_, value) = f(key, args)?;
        self.builder.memoize(addr, args, &value)?;
        Ok(value)
    }
}
