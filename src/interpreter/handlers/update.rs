//! Incremental trace update

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

/// Moves a previous trace to new arguments and constraints.
///
/// Callees traced at an address the previous trace also used are updated in
/// place; new addresses are generated against the constraints; addresses
/// the new execution no longer reaches are dropped, their choices discarded
/// and their score removed from the weight. Cached values are reused when
/// their arguments are unchanged.
#[derive(Debug)]
pub struct Update<'a> {
    prev: &'a Trace,
    constraints: &'a ChoiceMap,
    builder: TraceBuilder,
    weight: Real,
    discard: ChoiceMap,
}

impl<'a> Update<'a> {
    pub fn new(prev: &'a Trace, constraints: &'a ChoiceMap) -> Self {
        Self {
            prev,
            constraints,
            builder: TraceBuilder::default(),
            weight: Real::default(),
            discard: ChoiceMap::Empty,
        }
    }

    /// Returns the new trace, the log weight and the discarded choices
    pub fn handle<M: Model>(
        mut self,
        gen_fn: Arc<StaticGenFn<M>>,
        key: Key,
        args: &[Value],
    ) -> GenResult<(Trace, Real, ChoiceMap)> {
        let out = interpret(gen_fn.model(), &mut self, gen_fn.name(), key, args)?;
        check_coverage(
            &out.visited,
            self.constraints,
            gen_fn.config().unreached_constraints,
        )?;

        // A previous callee survives only if this run recorded a callee at
        // exactly its address; `cache` sites and nested prefixes do not count.
        let prev = self.prev;
        for (addr, stale) in prev.subtraces() {
            if !self.builder.has_subtrace(&addr) {
                self.drop_stale(&addr, stale)?;
            }
        }

        let trace = self.builder.finish(gen_fn, args, out.retval);
        tracing::debug!(weight = self.weight.value(), score = trace.get_score(), "updated");
        Ok((trace, self.weight, self.discard))
    }

    fn drop_stale(&mut self, addr: &Address, stale: &Trace) -> GenResult<()> {
        self.weight -= stale.score();
        self.discard = self.discard.insert_submap(addr, &stale.get_choices())?;
        Ok(())
    }
}

impl Handler for Update<'_> {
    fn kind(&self) -> &'static str {
        "update"
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
        let prev = self.prev;

        let sub = match prev.subtrace_at(addr) {
            Some(prev_sub) if prev_sub.get_gen_fn().name() == callee.name() => {
                let (sub, weight, discard) =
                    Arc::clone(callee).update(sub_key, prev_sub, &sub_constraints, args)?;
                self.weight += weight;
                self.discard = self.discard.insert_submap(addr, &discard)?;
                sub
            }
            other => {
                // A different callee now owns the address: the old one is dropped.
                if let Some(stale) = other {
                    self.drop_stale(addr, stale)?;
                }
                let (sub, weight) = Arc::clone(callee).importance(sub_key, &sub_constraints, args)?;
                self.weight += weight;
                sub
            }
        };

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
        let reusable = self.prev.cached(addr).filter(|c| {
            c.args.len() == args.len() && c.args.iter().zip(args).all(|(a, b)| a.primal_eq(b))
        });
        let value = match reusable {
            Some(cached) => {
                tracing::trace!(address = %addr, "cache hit");
                cached.value.clone()
            }
            None => f(key, args)?.1,
        };
        self.builder.memoize(addr, args, &value)?;
        Ok(value)
    }
}
