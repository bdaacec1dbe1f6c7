//! Primitive distributions
//!
//! A [`Distribution`] knows how to sample a value and score one. Wrapping it
//! in a [`Primitive`](primitive::Primitive) makes it a generative function
//! whose single choice lives at the root address, so models trace
//! distributions exactly like any other callee.
//!
//! Log densities are computed on dual numbers: gradients flow from the score
//! back into both the parameters and the scored value.

pub mod continuous;
pub mod discrete;
pub mod primitive;

use std::fmt;
use std::sync::Arc;

use crate::ad::Real;
use crate::datatypes::value::Value;
use crate::error::{GenError, GenResult};
use crate::generative::traits::GenFn;
use crate::random::Key;

pub use continuous::{Beta, Exponential, Gamma, Normal, Uniform};
pub use discrete::Bernoulli;
pub use primitive::Primitive;

/// A sampler paired with its log density
pub trait Distribution: Send + Sync + fmt::Debug + 'static {
    fn name(&self) -> &str;

    /// Number of parameters the distribution takes
    fn arity(&self) -> usize;

    /// Draw a value; `args` has already been checked against `arity`
    fn sample(&self, key: Key, args: &[Value]) -> GenResult<Value>;

    /// Log density (or mass) of `value`
    fn logpdf(&self, value: &Value, args: &[Value]) -> GenResult<Real>;
}

/// `Bernoulli(p)` over booleans
pub fn bernoulli() -> GenFn {
    Arc::new(Primitive::new(Bernoulli::default()))
}

/// A coin flip; `Bernoulli` under another name
pub fn flip() -> GenFn {
    Arc::new(Primitive::new(Bernoulli::named("flip")))
}

/// `Normal(mu, sigma)`
pub fn normal() -> GenFn {
    Arc::new(Primitive::new(Normal))
}

/// `Uniform(low, high)`
pub fn uniform() -> GenFn {
    Arc::new(Primitive::new(Uniform))
}

/// `Beta(alpha, beta)`
pub fn beta() -> GenFn {
    Arc::new(Primitive::new(Beta))
}

/// `Gamma(shape, rate)`
pub fn gamma() -> GenFn {
    Arc::new(Primitive::new(Gamma))
}

/// `Exponential(rate)`
pub fn exponential() -> GenFn {
    Arc::new(Primitive::new(Exponential))
}

fn invalid(dist: &str, detail: impl fmt::Display) -> GenError {
    GenError::InvalidParameter(format!("{}: {}", dist, detail))
}

/// Read a parameter that must be strictly positive
pub(crate) fn positive(dist: &str, param: &str, value: &Value) -> GenResult<Real> {
    let x = value.as_real()?;
    if !(x.value() > 0.0) || !x.value().is_finite() {
        return Err(invalid(dist, format!("{} must be positive, got {}", param, x.value())));
    }
    Ok(x)
}

/// Read a parameter that must be finite
pub(crate) fn finite(dist: &str, param: &str, value: &Value) -> GenResult<Real> {
    let x = value.as_real()?;
    if !x.value().is_finite() {
        return Err(invalid(dist, format!("{} must be finite, got {}", param, x.value())));
    }
    Ok(x)
}

pub mod prelude {
    pub use super::primitive::Primitive;
    pub use super::{bernoulli, beta, exponential, flip, gamma, normal, uniform, Distribution};
}
