//! Discrete distributions

use rand_distr::Distribution as _;

use super::{invalid, Distribution};
use crate::ad::Real;
use crate::datatypes::value::Value;
use crate::error::GenResult;
use crate::random::Key;

/// Bernoulli distribution over booleans, parameterized by `P(true)`
#[derive(Clone, Debug)]
pub struct Bernoulli {
    name: &'static str,
}

impl Default for Bernoulli {
    fn default() -> Self {
        Self::named("bernoulli")
    }
}

impl Bernoulli {
    pub fn named(name: &'static str) -> Self {
        Self { name }
    }

    fn probability(&self, arg: &Value) -> GenResult<Real> {
        let p = arg.as_real()?;
        if !(0.0..=1.0).contains(&p.value()) {
            return Err(invalid(self.name, format!("p must lie in [0, 1], got {}", p.value())));
        }
        Ok(p)
    }
}

impl Distribution for Bernoulli {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        1
    }

    fn sample(&self, key: Key, args: &[Value]) -> GenResult<Value> {
        let p = self.probability(&args[0])?;
        let sampler = rand_distr::Bernoulli::new(p.value()).map_err(|e| invalid(self.name, e))?;
        Ok(Value::Bool(sampler.sample(&mut key.rng())))
    }

    fn logpdf(&self, value: &Value, args: &[Value]) -> GenResult<Real> {
        let p = self.probability(&args[0])?;
        if value.as_bool()? {
            Ok(p.ln())
        } else {
            Ok((1.0 - p).ln())
        }
    }
}
