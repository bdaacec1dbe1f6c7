//! Switching a generative function's contribution on and off

use std::sync::Arc;

use crate::ad::Real;
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::value::Value;
use crate::error::{GenError, GenResult};
use crate::generative::trace::{Trace, TraceBody};
use crate::generative::traits::{GenFn, GenerativeFunction};
use crate::random::Key;

/// Runs an inner generative function under a boolean flag.
///
/// The first argument is the flag; the rest are passed to the inner
/// function. The inner function always runs and its choices are kept, but
/// with the flag unset they contribute nothing to the score or to any
/// weight. The return value is the pair `(flag, inner return value)`.
#[derive(Debug)]
pub struct Mask {
    inner: GenFn,
    name: String,
}

fn split_args(args: &[Value]) -> GenResult<(bool, &[Value])> {
    match args.split_first() {
        Some((flag, rest)) => Ok((flag.as_bool()?, rest)),
        None => Err(GenError::ArityMismatch {
            name: "mask".to_string(),
            expected: 1,
            actual: 0,
        }),
    }
}

fn gated(flag: bool, x: &Real) -> Real {
    if flag {
        x.clone()
    } else {
        Real::default()
    }
}

impl Mask {
    pub fn new(inner: GenFn) -> Self {
        let name = format!("mask({})", inner.name());
        Self { inner, name }
    }

    fn wrap(self: Arc<Self>, args: &[Value], flag: bool, inner: Trace) -> Trace {
        let retval = Value::Tuple(vec![Value::Bool(flag), inner.get_retval().clone()]);
        let choices = inner.get_choices();
        let score = gated(flag, inner.score());
        Trace::new(
            self,
            args.to_vec(),
            retval,
            choices,
            score,
            TraceBody::Masked {
                flag,
                inner: Box::new(inner),
            },
        )
    }
}

impl GenerativeFunction for Mask {
    fn name(&self) -> &str {
        &self.name
    }

    fn simulate(self: Arc<Self>, key: Key, args: &[Value]) -> GenResult<Trace> {
        let (flag, inner_args) = split_args(args)?;
        let inner = Arc::clone(&self.inner).simulate(key, inner_args)?;
        Ok(self.wrap(args, flag, inner))
    }

    fn importance(
        self: Arc<Self>,
        key: Key,
        constraints: &ChoiceMap,
        args: &[Value],
    ) -> GenResult<(Trace, Real)> {
        let (flag, inner_args) = split_args(args)?;
        let (inner, weight) = Arc::clone(&self.inner).importance(key, constraints, inner_args)?;
        Ok((self.wrap(args, flag, inner), gated(flag, &weight)))
    }

    fn assess(&self, choices: &ChoiceMap, args: &[Value]) -> GenResult<(Real, Value)> {
        let (flag, inner_args) = split_args(args)?;
        let (score, retval) = self.inner.assess(choices, inner_args)?;
        Ok((
            gated(flag, &score),
            Value::Tuple(vec![Value::Bool(flag), retval]),
        ))
    }

    /// With the inner weight `w = new - old - fresh`, the masked weight is
    /// `[flag'] (w + old) - [flag] old`: choices kept from a masked-off
    /// execution count as if they had been constrained when it is switched on.
    fn update(
        self: Arc<Self>,
        key: Key,
        trace: &Trace,
        constraints: &ChoiceMap,
        args: &[Value],
    ) -> GenResult<(Trace, Real, ChoiceMap)> {
        let (flag, inner_args) = split_args(args)?;
        let (prev_flag, prev) = match trace.body() {
            TraceBody::Masked { flag, inner } => (*flag, inner.as_ref()),
            _ => {
                return Err(GenError::InvalidParameter(format!(
                    "{} cannot update a trace of {}",
                    self.name,
                    trace.get_gen_fn().name()
                )))
            }
        };

        let (inner, weight, discard) =
            Arc::clone(&self.inner).update(key, prev, constraints, inner_args)?;
        let weight = gated(flag, &(weight + prev.score())) - gated(prev_flag, prev.score());
        Ok((self.wrap(args, flag, inner), weight, discard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;
    use crate::distributions::normal;
    use approx::assert_relative_eq;

    fn masked_normal() -> GenFn {
        Arc::new(Mask::new(normal()))
    }

    fn args(flag: bool) -> [Value; 3] {
        [Value::Bool(flag), Value::real(0.0), Value::real(1.0)]
    }

    fn logpdf(x: f64) -> f64 {
        -0.5 * x * x - 0.5 * (2.0 * std::f64::consts::PI).ln()
    }

    #[test]
    fn test_unset_flag_zeroes_score() {
        let on = masked_normal().simulate(Key::new(4), &args(true)).unwrap();
        let off = masked_normal().simulate(Key::new(4), &args(false)).unwrap();
        let x = on.get_choices().get_value().unwrap().as_f64().unwrap();
        assert_relative_eq!(on.get_score(), logpdf(x), epsilon = 1e-12);
        assert_eq!(off.get_score(), 0.0);
        // The inner execution still runs and its choice is kept
        assert_eq!(off.get_choices(), on.get_choices());
        assert_eq!(
            off.get_retval(),
            &Value::Tuple(vec![Value::Bool(false), Value::real(x)])
        );
    }

    #[test]
    fn test_importance_and_assess_gated() {
        let choices = ChoiceMap::value(0.5);
        let (_, w_on) = masked_normal().importance(Key::new(0), &choices, &args(true)).unwrap();
        let (_, w_off) = masked_normal().importance(Key::new(0), &choices, &args(false)).unwrap();
        assert_relative_eq!(w_on.value(), logpdf(0.5), epsilon = 1e-12);
        assert_eq!(w_off.value(), 0.0);

        let (s_on, _) = masked_normal().assess(&choices, &args(true)).unwrap();
        let (s_off, _) = masked_normal().assess(&choices, &args(false)).unwrap();
        assert_relative_eq!(s_on.value(), logpdf(0.5), epsilon = 1e-12);
        assert_eq!(s_off.value(), 0.0);
    }

    #[test]
    fn test_update_switching_flag() {
        let choices = ChoiceMap::value(0.5);
        let (off, _) = masked_normal().importance(Key::new(0), &choices, &args(false)).unwrap();

        let (on, weight, discard) = masked_normal()
            .update(Key::new(1), &off, &ChoiceMap::Empty, &args(true))
            .unwrap();
        assert_relative_eq!(weight.value(), logpdf(0.5), epsilon = 1e-12);
        assert_relative_eq!(on.get_score() - off.get_score(), weight.value(), epsilon = 1e-12);
        assert!(discard.is_empty());

        let (back, weight, _) = masked_normal()
            .update(Key::new(2), &on, &ChoiceMap::Empty, &args(false))
            .unwrap();
        assert_relative_eq!(weight.value(), -logpdf(0.5), epsilon = 1e-12);
        assert_eq!(back.get_score(), 0.0);
    }

    #[test]
    fn test_update_constrained_while_off() {
        let (off, _) = masked_normal()
            .importance(Key::new(0), &ChoiceMap::value(0.5), &args(false))
            .unwrap();
        let (moved, weight, discard) = masked_normal()
            .update(Key::new(1), &off, &ChoiceMap::value(1.0), &args(false))
            .unwrap();
        assert_eq!(weight.value(), 0.0);
        assert_eq!(moved.get_choices().get(&address!()), Some(&Value::real(1.0)));
        assert_eq!(discard, ChoiceMap::value(0.5));
    }

    #[test]
    fn test_missing_flag() {
        let err = masked_normal().simulate(Key::new(0), &[]).unwrap_err();
        assert!(matches!(err, GenError::ArityMismatch { .. }));
        let err = masked_normal()
            .simulate(Key::new(0), &[Value::real(1.0), Value::real(0.0), Value::real(1.0)])
            .unwrap_err();
        assert!(matches!(err, GenError::TypeMismatch { .. }));
    }
}
