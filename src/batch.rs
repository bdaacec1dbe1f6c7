//! Independent invocations in bulk
//!
//! Each invocation receives its own key split from the caller's, so results
//! are identical whether the batch runs sequentially or on the `rayon` pool.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::ad::Real;
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::value::Value;
use crate::error::GenResult;
use crate::generative::trace::Trace;
use crate::generative::traits::{GenFn, GenerativeFunction};
use crate::random::Key;

/// `n` independent prior samples of `gen_fn`
pub fn simulate_batch(gen_fn: &GenFn, key: Key, n: usize, args: &[Value]) -> GenResult<Vec<Trace>> {
    let keys = key.split_n(n);
    tracing::debug!(gen_fn = gen_fn.name(), n, "simulate batch");

    #[cfg(feature = "parallel")]
    let traces = keys
        .into_par_iter()
        .map(|k| gen_fn.clone().simulate(k, args))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let traces = keys
        .into_iter()
        .map(|k| gen_fn.clone().simulate(k, args))
        .collect();

    traces
}

/// `n` independent importance samples of `gen_fn` under `constraints`
pub fn importance_batch(
    gen_fn: &GenFn,
    key: Key,
    n: usize,
    constraints: &ChoiceMap,
    args: &[Value],
) -> GenResult<Vec<(Trace, Real)>> {
    let keys = key.split_n(n);
    tracing::debug!(gen_fn = gen_fn.name(), n, "importance batch");

    #[cfg(feature = "parallel")]
    let samples = keys
        .into_par_iter()
        .map(|k| gen_fn.clone().importance(k, constraints, args))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let samples = keys
        .into_iter()
        .map(|k| gen_fn.clone().importance(k, constraints, args))
        .collect();

    samples
}

/// Log of the mean of `exp(w)` over log weights; the importance sampling
/// estimate of the log marginal likelihood
pub fn log_mean_exp(log_weights: &[f64]) -> f64 {
    if log_weights.is_empty() {
        return f64::NEG_INFINITY;
    }
    let max = log_weights.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return max;
    }
    let sum: f64 = log_weights.iter().map(|w| (w - max).exp()).sum();
    max + sum.ln() - (log_weights.len() as f64).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;
    use crate::distributions::normal;
    use approx::assert_relative_eq;

    fn args() -> Vec<Value> {
        vec![Value::real(0.0), Value::real(1.0)]
    }

    #[test]
    fn test_simulate_batch_is_deterministic() {
        let a = simulate_batch(&normal(), Key::new(9), 8, &args()).unwrap();
        let b = simulate_batch(&normal(), Key::new(9), 8, &args()).unwrap();
        assert_eq!(a.len(), 8);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.get_retval(), y.get_retval());
        }
        // Different keys per invocation
        assert_ne!(a[0].get_retval(), a[1].get_retval());
    }

    #[test]
    fn test_importance_batch_constrained_weights_agree() {
        let constraints = ChoiceMap::value(0.5);
        let samples = importance_batch(&normal(), Key::new(2), 4, &constraints, &args()).unwrap();
        let expected = -0.125 - 0.5 * (2.0 * std::f64::consts::PI).ln();
        for (trace, weight) in &samples {
            assert_eq!(trace.get_choices().get(&address!()), Some(&Value::real(0.5)));
            assert_relative_eq!(weight.value(), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_log_mean_exp() {
        assert_relative_eq!(log_mean_exp(&[0.0, 0.0]), 0.0);
        assert_relative_eq!(log_mean_exp(&[1.0f64.ln(), 3.0f64.ln()]), 2.0f64.ln(), epsilon = 1e-12);
        assert_eq!(log_mean_exp(&[]), f64::NEG_INFINITY);
    }
}
