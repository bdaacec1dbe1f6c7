//! Independent repetition of a generative function

use std::sync::Arc;

use crate::ad::Real;
use crate::datatypes::address::{Address, Segment};
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::value::Value;
use crate::error::{GenError, GenResult};
use crate::generative::trace::{Trace, TraceBody};
use crate::generative::traits::{GenFn, GenerativeFunction};
use crate::random::Key;

/// Calls an inner generative function `n` times with the same arguments.
///
/// Call `i` owns the addresses under index `i`; the return value is the
/// tuple of the inner return values.
#[derive(Debug)]
pub struct Repeat {
    inner: GenFn,
    n: usize,
    name: String,
}

impl Repeat {
    pub fn new(inner: GenFn, n: usize) -> Self {
        let name = format!("repeat({})", inner.name());
        Self { inner, n, name }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Constraints for each call. Addresses outside `0..n` cannot be reached.
    fn split_constraints(&self, constraints: &ChoiceMap) -> GenResult<Vec<ChoiceMap>> {
        for addr in constraints.addresses() {
            match addr.segments().first() {
                Some(Segment::Index(i)) if *i < self.n => {}
                _ => return Err(GenError::AddressNotFound(addr)),
            }
        }
        Ok((0..self.n)
            .map(|i| constraints.get_submap(&Address::from(i)))
            .collect())
    }

    fn assemble(self: Arc<Self>, args: &[Value], subtraces: Vec<Trace>) -> GenResult<Trace> {
        let mut choices = ChoiceMap::Empty;
        let mut score = Real::default();
        for (i, sub) in subtraces.iter().enumerate() {
            choices = choices.insert_submap(&Address::from(i), &sub.get_choices())?;
            score += sub.score();
        }
        let retval = Value::Tuple(subtraces.iter().map(|t| t.get_retval().clone()).collect());
        Ok(Trace::new(
            self,
            args.to_vec(),
            retval,
            choices,
            score,
            TraceBody::Vector(subtraces),
        ))
    }
}

impl GenerativeFunction for Repeat {
    fn name(&self) -> &str {
        &self.name
    }

    fn simulate(self: Arc<Self>, key: Key, args: &[Value]) -> GenResult<Trace> {
        let subtraces = key
            .split_n(self.n)
            .into_iter()
            .enumerate()
            .map(|(i, k)| {
                Arc::clone(&self.inner)
                    .simulate(k, args)
                    .map_err(|e| e.within(&Address::from(i)))
            })
            .collect::<GenResult<Vec<_>>>()?;
        self.assemble(args, subtraces)
    }

    fn importance(
        self: Arc<Self>,
        key: Key,
        constraints: &ChoiceMap,
        args: &[Value],
    ) -> GenResult<(Trace, Real)> {
        let per_call = self.split_constraints(constraints)?;
        let mut weight = Real::default();
        let mut subtraces = Vec::with_capacity(self.n);
        for (i, (k, sub_constraints)) in key.split_n(self.n).into_iter().zip(&per_call).enumerate() {
            let (sub, w) = Arc::clone(&self.inner)
                .importance(k, sub_constraints, args)
                .map_err(|e| e.within(&Address::from(i)))?;
            weight += w;
            subtraces.push(sub);
        }
        Ok((self.assemble(args, subtraces)?, weight))
    }

    fn assess(&self, choices: &ChoiceMap, args: &[Value]) -> GenResult<(Real, Value)> {
        let per_call = self.split_constraints(choices)?;
        let mut score = Real::default();
        let mut retvals = Vec::with_capacity(self.n);
        for (i, sub_choices) in per_call.iter().enumerate() {
            let (s, retval) = self
                .inner
                .assess(sub_choices, args)
                .map_err(|e| e.within(&Address::from(i)))?;
            score += s;
            retvals.push(retval);
        }
        Ok((score, Value::Tuple(retvals)))
    }

    fn update(
        self: Arc<Self>,
        key: Key,
        trace: &Trace,
        constraints: &ChoiceMap,
        args: &[Value],
    ) -> GenResult<(Trace, Real, ChoiceMap)> {
        let per_call = self.split_constraints(constraints)?;
        let previous: &[Trace] = match trace.body() {
            TraceBody::Vector(subtraces) => subtraces,
            _ => &[],
        };

        let mut weight = Real::default();
        let mut discard = ChoiceMap::Empty;
        let mut subtraces = Vec::with_capacity(self.n);
        for (i, (k, sub_constraints)) in key.split_n(self.n).into_iter().zip(&per_call).enumerate() {
            let addr = Address::from(i);
            let inner = Arc::clone(&self.inner);
            let sub = match previous.get(i) {
                Some(prev) => {
                    let (sub, w, d) = inner
                        .update(k, prev, sub_constraints, args)
                        .map_err(|e| e.within(&addr))?;
                    weight += w;
                    discard = discard.insert_submap(&addr, &d)?;
                    sub
                }
                None => {
                    let (sub, w) = inner
                        .importance(k, sub_constraints, args)
                        .map_err(|e| e.within(&addr))?;
                    weight += w;
                    sub
                }
            };
            subtraces.push(sub);
        }
        for (i, stale) in previous.iter().enumerate().skip(self.n) {
            weight -= stale.score();
            discard = discard.insert_submap(&Address::from(i), &stale.get_choices())?;
        }

        Ok((self.assemble(args, subtraces)?, weight, discard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;
    use crate::distributions::{bernoulli, normal};
    use approx::assert_relative_eq;

    fn coins(n: usize) -> GenFn {
        Arc::new(Repeat::new(bernoulli(), n))
    }

    #[test]
    fn test_simulate_indexes_choices() {
        let trace = coins(3).simulate(Key::new(5), &[Value::real(0.5)]).unwrap();
        assert_eq!(trace.get_choices().len(), 3);
        for i in 0..3usize {
            assert!(trace.get_choices().has_value(&address!(i)));
        }
        assert_relative_eq!(trace.get_score(), 3.0 * 0.5f64.ln(), epsilon = 1e-12);
        assert_eq!(trace.get_retval().as_tuple().unwrap().len(), 3);
    }

    #[test]
    fn test_importance_weight_counts_constrained_only() {
        let constraints = ChoiceMap::from_pairs([(address!(1usize), true)]).unwrap();
        let (trace, weight) = coins(3)
            .importance(Key::new(0), &constraints, &[Value::real(0.3)])
            .unwrap();
        assert_relative_eq!(weight.value(), 0.3f64.ln(), epsilon = 1e-12);
        assert_eq!(trace.get_choices().get(&address!(1usize)), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_out_of_range_constraint() {
        let constraints = ChoiceMap::from_pairs([(address!(7usize), true)]).unwrap();
        let err = coins(3)
            .importance(Key::new(0), &constraints, &[Value::real(0.3)])
            .unwrap_err();
        assert_eq!(err, GenError::AddressNotFound(address!(7usize)));
    }

    #[test]
    fn test_subtrace_by_index() {
        let model: GenFn = Arc::new(Repeat::new(normal(), 2));
        let trace = model
            .simulate(Key::new(1), &[Value::real(0.0), Value::real(1.0)])
            .unwrap();
        let sub = trace.get_subtrace(1usize).unwrap();
        assert_eq!(
            Some(sub.get_retval()),
            trace.get_choices().get(&address!(1usize))
        );
    }

    #[test]
    fn test_update_shrinks() {
        let p = [Value::real(0.3)];
        let all_true = ChoiceMap::from_pairs((0..3usize).map(|i| (address!(i), true))).unwrap();
        let (trace, _) = coins(3).importance(Key::new(0), &all_true, &p).unwrap();

        let (updated, weight, discard) = coins(2)
            .update(Key::new(1), &trace, &ChoiceMap::Empty, &p)
            .unwrap();
        assert_eq!(updated.get_choices().len(), 2);
        assert_relative_eq!(weight.value(), -(0.3f64.ln()), epsilon = 1e-12);
        assert_eq!(discard.get(&address!(2usize)), Some(&Value::Bool(true)));
    }
}
