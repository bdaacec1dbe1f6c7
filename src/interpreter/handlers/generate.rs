//! Importance sampling against constraints

use std::sync::Arc;

use super::{check_coverage, TraceBuilder};
use crate::ad::Real;
use crate::datatypes::address::Address;
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::value::Value;
use crate::error::GenResult;
use crate::generative::trace::Trace;
use crate::generative::traits::{GenFn, GenerativeFunction};
use crate::interpreter::static_gen_fn::StaticGenFn;
use crate::interpreter::tracer::{interpret, Handler, Model};
use crate::random::Key;

/// Runs a model with some choices fixed by a choice map.
///
/// Constrained callees contribute their log density to the weight;
/// unconstrained callees are sampled and contribute nothing.
#[derive(Debug)]
pub struct Generate<'c> {
    constraints: &'c ChoiceMap,
    builder: TraceBuilder,
    weight: Real,
}

impl<'c> Generate<'c> {
    pub fn new(constraints: &'c ChoiceMap) -> Self {
        Self {
            constraints,
            builder: TraceBuilder::default(),
            weight: Real::default(),
        }
    }

    /// Run `gen_fn` under the constraints; returns the log weight and trace
    pub fn handle<M: Model>(
        mut self,
        gen_fn: Arc<StaticGenFn<M>>,
        key: Key,
        args: &[Value],
    ) -> GenResult<(Real, Trace)> {
        let out = interpret(gen_fn.model(), &mut self, gen_fn.name(), key, args)?;
        check_coverage(
            &out.visited,
            self.constraints,
            gen_fn.config().unreached_constraints,
        )?;
        let trace = self.builder.finish(gen_fn, args, out.retval);
        tracing::debug!(weight = self.weight.value(), score = trace.get_score(), "generated");
        Ok((self.weight, trace))
    }
}

impl Handler for Generate<'_> {
    fn kind(&self) -> &'static str {
        "generate"
    }

    fn handle_trace(
        &mut self,
        addr: &Address,
        callee: &GenFn,
        key: Key,
        args: &[Value],
    ) -> GenResult<(Key, Value)> {
        let (key, sub_key) = key.split();
        let sub_constraints = self.constraints.get_submap(addr);
        let (sub, weight) = Arc::clone(callee).importance(sub_key, &sub_constraints, args)?;
        let retval = sub.get_retval().clone();
        self.weight += weight;
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
