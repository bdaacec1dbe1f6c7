//! Continuous distributions
//!
//! Sampling goes through `rand_distr` on primal parameter values; the log
//! densities are written out on dual numbers so they differentiate.

use std::f64::consts::PI;

use rand_distr::Distribution as _;

use super::{finite, invalid, positive, Distribution};
use crate::ad::Real;
use crate::datatypes::value::Value;
use crate::error::GenResult;
use crate::random::Key;

fn neg_infinity() -> Real {
    Real::constant(f64::NEG_INFINITY)
}

/// Normal distribution with mean `mu` and standard deviation `sigma`
#[derive(Clone, Copy, Debug, Default)]
pub struct Normal;

impl Distribution for Normal {
    fn name(&self) -> &str {
        "normal"
    }

    fn arity(&self) -> usize {
        2
    }

    fn sample(&self, key: Key, args: &[Value]) -> GenResult<Value> {
        let mu = finite("normal", "mu", &args[0])?;
        let sigma = positive("normal", "sigma", &args[1])?;
        let sampler =
            rand_distr::Normal::new(mu.value(), sigma.value()).map_err(|e| invalid("normal", e))?;
        Ok(Value::real(sampler.sample(&mut key.rng())))
    }

    fn logpdf(&self, value: &Value, args: &[Value]) -> GenResult<Real> {
        let x = value.as_real()?;
        let mu = finite("normal", "mu", &args[0])?;
        let sigma = positive("normal", "sigma", &args[1])?;
        let z = (&x - &mu) / &sigma;
        Ok(z.powi(2) * -0.5 - sigma.ln() - 0.5 * (2.0 * PI).ln())
    }
}

/// Uniform distribution on `[low, high]`
#[derive(Clone, Copy, Debug, Default)]
pub struct Uniform;

impl Uniform {
    fn bounds(args: &[Value]) -> GenResult<(Real, Real)> {
        let low = finite("uniform", "low", &args[0])?;
        let high = finite("uniform", "high", &args[1])?;
        if low.value() >= high.value() {
            return Err(invalid(
                "uniform",
                format!("low {} must be below high {}", low.value(), high.value()),
            ));
        }
        Ok((low, high))
    }
}

impl Distribution for Uniform {
    fn name(&self) -> &str {
        "uniform"
    }

    fn arity(&self) -> usize {
        2
    }

    fn sample(&self, key: Key, args: &[Value]) -> GenResult<Value> {
        let (low, high) = Self::bounds(args)?;
        let sampler = rand_distr::Uniform::new_inclusive(low.value(), high.value());
        Ok(Value::real(sampler.sample(&mut key.rng())))
    }

    fn logpdf(&self, value: &Value, args: &[Value]) -> GenResult<Real> {
        let x = value.as_f64()?;
        let (low, high) = Self::bounds(args)?;
        if x < low.value() || x > high.value() {
            return Ok(neg_infinity());
        }
        Ok(-(high - low).ln())
    }
}

/// Beta distribution on `(0, 1)` with shapes `alpha` and `beta`
#[derive(Clone, Copy, Debug, Default)]
pub struct Beta;

impl Distribution for Beta {
    fn name(&self) -> &str {
        "beta"
    }

    fn arity(&self) -> usize {
        2
    }

    fn sample(&self, key: Key, args: &[Value]) -> GenResult<Value> {
        let a = positive("beta", "alpha", &args[0])?;
        let b = positive("beta", "beta", &args[1])?;
        let sampler = rand_distr::Beta::new(a.value(), b.value()).map_err(|e| invalid("beta", e))?;
        Ok(Value::real(sampler.sample(&mut key.rng())))
    }

    fn logpdf(&self, value: &Value, args: &[Value]) -> GenResult<Real> {
        let x = value.as_real()?;
        let a = positive("beta", "alpha", &args[0])?;
        let b = positive("beta", "beta", &args[1])?;
        if x.value() <= 0.0 || x.value() >= 1.0 {
            return Ok(neg_infinity());
        }
        let ln_beta = a.ln_gamma() + b.ln_gamma() - (&a + &b).ln_gamma();
        Ok((&a - 1.0) * x.ln() + (&b - 1.0) * (1.0 - &x).ln() - ln_beta)
    }
}

/// Gamma distribution with `shape` and `rate`
#[derive(Clone, Copy, Debug, Default)]
pub struct Gamma;

impl Distribution for Gamma {
    fn name(&self) -> &str {
        "gamma"
    }

    fn arity(&self) -> usize {
        2
    }

    fn sample(&self, key: Key, args: &[Value]) -> GenResult<Value> {
        let shape = positive("gamma", "shape", &args[0])?;
        let rate = positive("gamma", "rate", &args[1])?;
        let sampler = rand_distr::Gamma::new(shape.value(), 1.0 / rate.value())
            .map_err(|e| invalid("gamma", e))?;
        Ok(Value::real(sampler.sample(&mut key.rng())))
    }

    fn logpdf(&self, value: &Value, args: &[Value]) -> GenResult<Real> {
        let x = value.as_real()?;
        let shape = positive("gamma", "shape", &args[0])?;
        let rate = positive("gamma", "rate", &args[1])?;
        if x.value() <= 0.0 {
            return Ok(neg_infinity());
        }
        Ok(&shape * rate.ln() + (&shape - 1.0) * x.ln() - &rate * &x - shape.ln_gamma())
    }
}

/// Exponential distribution with `rate`
#[derive(Clone, Copy, Debug, Default)]
pub struct Exponential;

impl Distribution for Exponential {
    fn name(&self) -> &str {
        "exponential"
    }

    fn arity(&self) -> usize {
        1
    }

    fn sample(&self, key: Key, args: &[Value]) -> GenResult<Value> {
        let rate = positive("exponential", "rate", &args[0])?;
        let sampler = rand_distr::Exp::new(rate.value()).map_err(|e| invalid("exponential", e))?;
        Ok(Value::real(sampler.sample(&mut key.rng())))
    }

    fn logpdf(&self, value: &Value, args: &[Value]) -> GenResult<Real> {
        let x = value.as_real()?;
        let rate = positive("exponential", "rate", &args[0])?;
        if x.value() < 0.0 {
            return Ok(neg_infinity());
        }
        Ok(rate.ln() - &rate * &x)
    }
}
