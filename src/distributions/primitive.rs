//! Distributions as generative functions

use std::sync::Arc;

use super::Distribution;
use crate::ad::Real;
use crate::datatypes::address::Address;
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::value::Value;
use crate::error::{GenError, GenResult};
use crate::generative::trace::{Trace, TraceBody};
use crate::generative::traits::{check_arity, GenerativeFunction};
use crate::random::Key;

/// A distribution lifted to a generative function with one choice at the
/// root address
#[derive(Debug)]
pub struct Primitive<D> {
    dist: D,
}

impl<D: Distribution> Primitive<D> {
    pub fn new(dist: D) -> Self {
        Self { dist }
    }

    pub fn distribution(&self) -> &D {
        &self.dist
    }

    fn trace(self: Arc<Self>, args: &[Value], value: Value, score: Real) -> Trace {
        Trace::new(
            self,
            args.to_vec(),
            value.clone(),
            ChoiceMap::Value(value),
            score,
            TraceBody::Choice,
        )
    }

    /// The constrained value, if any. Nested constraints cannot apply to a
    /// primitive and are reported at the first address they name.
    fn constrained<'c>(&self, constraints: &'c ChoiceMap) -> GenResult<Option<&'c Value>> {
        match constraints {
            ChoiceMap::Empty => Ok(None),
            ChoiceMap::Value(v) => Ok(Some(v)),
            ChoiceMap::Static(_) => Err(GenError::AddressNotFound(
                constraints
                    .addresses()
                    .into_iter()
                    .next()
                    .unwrap_or_else(Address::root),
            )),
        }
    }
}

impl<D: Distribution> GenerativeFunction for Primitive<D> {
    fn name(&self) -> &str {
        self.dist.name()
    }

    fn simulate(self: Arc<Self>, key: Key, args: &[Value]) -> GenResult<Trace> {
        check_arity(self.dist.name(), self.dist.arity(), args)?;
        let value = self.dist.sample(key, args)?;
        let score = self.dist.logpdf(&value, args)?;
        Ok(self.trace(args, value, score))
    }

    fn importance(
        self: Arc<Self>,
        key: Key,
        constraints: &ChoiceMap,
        args: &[Value],
    ) -> GenResult<(Trace, Real)> {
        match self.constrained(constraints)? {
            Some(value) => {
                check_arity(self.dist.name(), self.dist.arity(), args)?;
                let score = self.dist.logpdf(value, args)?;
                let value = value.clone();
                Ok((self.trace(args, value, score.clone()), score))
            }
            None => Ok((self.simulate(key, args)?, Real::default())),
        }
    }

    fn assess(&self, choices: &ChoiceMap, args: &[Value]) -> GenResult<(Real, Value)> {
        check_arity(self.dist.name(), self.dist.arity(), args)?;
        let value = self
            .constrained(choices)?
            .ok_or_else(|| GenError::AddressNotFound(Address::root()))?;
        Ok((self.dist.logpdf(value, args)?, value.clone()))
    }

    fn update(
        self: Arc<Self>,
        _key: Key,
        trace: &Trace,
        constraints: &ChoiceMap,
        args: &[Value],
    ) -> GenResult<(Trace, Real, ChoiceMap)> {
        check_arity(self.dist.name(), self.dist.arity(), args)?;
        let (value, discard) = match self.constrained(constraints)? {
            Some(value) => (value.clone(), trace.get_choices()),
            None => (trace.get_retval().clone(), ChoiceMap::Empty),
        };
        let score = self.dist.logpdf(&value, args)?;
        let weight = &score - trace.score();
        Ok((self.trace(args, value, score), weight, discard))
    }
}
