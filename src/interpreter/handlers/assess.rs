//! Scoring a complete choice assignment

use super::check_coverage;
use crate::ad::Real;
use crate::datatypes::address::Address;
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::value::Value;
use crate::error::GenResult;
use crate::generative::traits::{GenFn, GenerativeFunction};
use crate::interpreter::static_gen_fn::StaticGenFn;
use crate::interpreter::tracer::{interpret, Handler, Model};
use crate::random::Key;

/// Scores choices without sampling or recording a trace
#[derive(Debug)]
pub struct Assess<'c> {
    choices: &'c ChoiceMap,
    score: Real,
}

impl<'c> Assess<'c> {
    pub fn new(choices: &'c ChoiceMap) -> Self {
        Self {
            choices,
            score: Real::default(),
        }
    }

    /// Log density of the choices and the model's return value
    pub fn handle<M: Model>(mut self, gen_fn: &StaticGenFn<M>, args: &[Value]) -> GenResult<(Real, Value)> {
        // Every callee is fully constrained, so the key is never consumed.
        let out = interpret(gen_fn.model(), &mut self, gen_fn.name(), Key::new(0), args)?;
        check_coverage(&out.visited, self.choices, gen_fn.config().unreached_constraints)?;
        Ok((self.score, out.retval))
    }
}

impl Handler for Assess<'_> {
    fn kind(&self) -> &'static str {
        "assess"
    }

    fn handle_trace(
        &mut self,
        addr: &Address,
        callee: &GenFn,
        key: Key,
        args: &[Value],
    ) -> GenResult<(Key, Value)> {
        let (score, retval) = callee.assess(&self.choices.get_submap(addr), args)?;
        self.score += score;
        Ok((key, retval))
    }

    fn handle_cache<F>(
        &mut self,
        _addr: &Address,
        key: Key,
        args: &[Value],
        f: F,
    ) -> GenResult<Value>
    where
        F: FnOnce(Key, &[Value]) -> GenResult<(Key, Value)>,
    {
        f(key, args).map(|(_, value)| value)
    }
}
