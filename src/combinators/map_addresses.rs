//! Renaming a generative function's addresses

use std::sync::Arc;

use crate::ad::Real;
use crate::datatypes::bijection::AddressBijection;
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::value::Value;
use crate::error::{GenError, GenResult};
use crate::generative::trace::{Trace, TraceBody};
use crate::generative::traits::{GenFn, GenerativeFunction};
use crate::random::Key;

/// Exposes an inner generative function under renamed addresses.
///
/// Choices and discards are renamed outward; constraints and assessed
/// choices are renamed inward before they reach the inner function. Errors
/// raised inside report outer addresses. Scores, weights and return values
/// are the inner function's.
#[derive(Debug)]
pub struct MapAddresses {
    inner: GenFn,
    bijection: Arc<AddressBijection>,
    name: String,
}

impl MapAddresses {
    pub fn new(inner: GenFn, bijection: AddressBijection) -> Self {
        let name = format!("map_addresses({})", inner.name());
        Self {
            inner,
            bijection: Arc::new(bijection),
            name,
        }
    }

    pub fn bijection(&self) -> &AddressBijection {
        &self.bijection
    }

    fn outward(&self, err: GenError) -> GenError {
        err.map_address(|addr| self.bijection.forward(addr).unwrap_or_else(|| addr.clone()))
    }

    fn wrap(self: Arc<Self>, args: &[Value], inner: Trace) -> GenResult<Trace> {
        let choices = self.bijection.forward_choices(&inner.get_choices())?;
        let bijection = Arc::clone(&self.bijection);
        Ok(Trace::new(
            self,
            args.to_vec(),
            inner.get_retval().clone(),
            choices,
            inner.score().clone(),
            TraceBody::Remapped {
                inner: Box::new(inner),
                bijection,
            },
        ))
    }
}

impl GenerativeFunction for MapAddresses {
    fn name(&self) -> &str {
        &self.name
    }

    fn simulate(self: Arc<Self>, key: Key, args: &[Value]) -> GenResult<Trace> {
        let inner = Arc::clone(&self.inner)
            .simulate(key, args)
            .map_err(|e| self.outward(e))?;
        self.wrap(args, inner)
    }

    fn importance(
        self: Arc<Self>,
        key: Key,
        constraints: &ChoiceMap,
        args: &[Value],
    ) -> GenResult<(Trace, Real)> {
        let inward = self.bijection.backward_choices(constraints)?;
        let (inner, weight) = Arc::clone(&self.inner)
            .importance(key, &inward, args)
            .map_err(|e| self.outward(e))?;
        Ok((self.wrap(args, inner)?, weight))
    }

    fn assess(&self, choices: &ChoiceMap, args: &[Value]) -> GenResult<(Real, Value)> {
        let inward = self.bijection.backward_choices(choices)?;
        self.inner
            .assess(&inward, args)
            .map_err(|e| self.outward(e))
    }

    fn update(
        self: Arc<Self>,
        key: Key,
        trace: &Trace,
        constraints: &ChoiceMap,
        args: &[Value],
    ) -> GenResult<(Trace, Real, ChoiceMap)> {
        let prev = match trace.body() {
            TraceBody::Remapped { inner, .. } => inner.as_ref(),
            _ => {
                return Err(GenError::InvalidParameter(format!(
                    "{} cannot update a trace of {}",
                    self.name,
                    trace.get_gen_fn().name()
                )))
            }
        };
        let inward = self.bijection.backward_choices(constraints)?;
        let (inner, weight, discard) = Arc::clone(&self.inner)
            .update(key, prev, &inward, args)
            .map_err(|e| self.outward(e))?;
        let discard = self.bijection.forward_choices(&discard)?;
        Ok((self.wrap(args, inner)?, weight, discard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;
    use crate::datatypes::selection::Selection;
    use crate::distributions::normal;
    use crate::interpreter::prelude::*;
    use approx::assert_relative_eq;

    /// x ~ Normal(0, 1), y ~ Normal(x, 1)
    struct Pair;

    impl Model for Pair {
        fn call<H: Handler>(
            &self,
            t: &mut Tracer<'_, H>,
            key: Key,
            _args: &[Value],
        ) -> GenResult<(Key, Value)> {
            let (key, x) = t.trace("x", &normal(), key, &[Value::real(0.0), Value::real(1.0)])?;
            t.trace("y", &normal(), key, &[x, Value::real(1.0)])
        }
    }

    fn renamed() -> GenFn {
        let bijection = AddressBijection::new([
            (address!("x"), address!("latent", "x")),
            (address!("y"), address!("obs")),
        ])
        .unwrap();
        Arc::new(MapAddresses::new(gen(Pair), bijection))
    }

    fn outer_choices(x: f64, y: f64) -> ChoiceMap {
        ChoiceMap::from_pairs([
            (address!("latent", "x"), Value::real(x)),
            (address!("obs"), Value::real(y)),
        ])
        .unwrap()
    }

    #[test]
    fn test_simulate_renames_choices() {
        let trace = renamed().simulate(Key::new(3), &[]).unwrap();
        let inner = gen(Pair).simulate(Key::new(3), &[]).unwrap();
        let choices = trace.get_choices();
        assert!(choices.has_value(&address!("latent", "x")));
        assert!(choices.has_value(&address!("obs")));
        assert!(!choices.has_value(&address!("x")));
        assert_eq!(choices.get(&address!("obs")), inner.get_choices().get(&address!("y")));
        assert_relative_eq!(trace.get_score(), inner.get_score(), epsilon = 1e-12);
        assert!(trace.get_subtrace(("latent", "x")).is_some());
    }

    #[test]
    fn test_importance_and_assess_rename_inward() {
        let choices = outer_choices(0.5, 1.0);
        let (trace, weight) = renamed().importance(Key::new(0), &choices, &[]).unwrap();
        let (score, retval) = renamed().assess(&choices, &[]).unwrap();
        assert_relative_eq!(weight.value(), score.value(), epsilon = 1e-12);
        assert_relative_eq!(trace.get_score(), score.value(), epsilon = 1e-12);
        assert_eq!(retval, Value::real(1.0));
    }

    #[test]
    fn test_update_renames_discard() {
        let (trace, _) = renamed()
            .importance(Key::new(0), &outer_choices(0.5, 1.0), &[])
            .unwrap();
        let change = ChoiceMap::from_pairs([(address!("obs"), Value::real(2.0))]).unwrap();
        let (updated, weight, discard) = renamed().update(Key::new(1), &trace, &change, &[]).unwrap();
        assert_eq!(discard.get(&address!("obs")), Some(&Value::real(1.0)));
        assert_eq!(updated.get_choices().get(&address!("obs")), Some(&Value::real(2.0)));
        assert_relative_eq!(
            updated.get_score() - trace.get_score(),
            weight.value(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_errors_report_outer_addresses() {
        let partial = ChoiceMap::from_pairs([(address!("latent", "x"), Value::real(0.5))]).unwrap();
        let err = renamed().assess(&partial, &[]).unwrap_err();
        assert_eq!(err, GenError::AddressNotFound(address!("obs")));
    }

    #[test]
    fn test_project_uses_outer_addresses() {
        let trace = renamed().simulate(Key::new(8), &[]).unwrap();
        let x_only = trace.project(&Selection::at("latent"));
        let y_only = trace.project(&Selection::at("obs"));
        let x_trace = trace.get_subtrace(("latent", "x")).unwrap();
        assert_relative_eq!(x_only, x_trace.get_score(), epsilon = 1e-12);
        assert_relative_eq!(x_only + y_only, trace.get_score(), epsilon = 1e-12);
        assert_eq!(trace.project(&Selection::at("x")), 0.0);
    }
}
