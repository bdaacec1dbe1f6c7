//! Gradients of the log density
//!
//! Both handlers replay a recorded trace through `assess` with some inputs
//! seeded as dual-number variables, one tangent direction per input. A
//! single forward pass then yields every requested partial derivative.
//! Everything that is not being differentiated is detached first, so the
//! results never depend on tangents left over in the trace.

use std::collections::BTreeMap;

use crate::ad::Real;
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::value::Value;
use crate::error::{GenError, GenResult};
use crate::generative::trace::Trace;
use crate::generative::traits::GenerativeFunction;

fn seed(value: &Value, direction: usize, n: usize) -> GenResult<Value> {
    match value {
        Value::Real(r) => Ok(Value::Real(Real::variable(r.value(), direction, n))),
        other => Err(GenError::TypeMismatch {
            expected: "real",
            actual: other.kind().to_string(),
        }),
    }
}

/// Gradient of a trace's log density with respect to the model arguments,
/// holding the trace's choices fixed.
///
/// Argument indices count from 0 over the model arguments alone. The key is
/// passed separately and is never an argument, so for a model called with
/// `&[p]` the only valid index is `0`:
///
/// ```rust,ignore
/// let grads = ArgumentGradients::new(&trace, [0]).handle(&[Value::real(0.3)])?;
/// ```
#[derive(Debug)]
pub struct ArgumentGradients<'t> {
    trace: &'t Trace,
    argnums: Vec<usize>,
}

impl<'t> ArgumentGradients<'t> {
    /// Differentiate with respect to the arguments at `argnums` (0-based)
    pub fn new(trace: &'t Trace, argnums: impl Into<Vec<usize>>) -> Self {
        Self {
            trace,
            argnums: argnums.into(),
        }
    }

    /// One partial derivative per entry of `argnums`, evaluated at `args`
    pub fn handle(&self, args: &[Value]) -> GenResult<Vec<f64>> {
        let mut directions: BTreeMap<usize, usize> = BTreeMap::new();
        for &index in &self.argnums {
            if index >= args.len() {
                return Err(GenError::ArgumentIndex {
                    index,
                    len: args.len(),
                });
            }
            let next = directions.len();
            directions.entry(index).or_insert(next);
        }

        let n = directions.len();
        let mut seeded: Vec<Value> = args.iter().map(Value::detach).collect();
        for (&index, &direction) in &directions {
            seeded[index] = seed(&args[index], direction, n)?;
        }

        let choices = self.trace.get_choices();
        let (score, _) = self.trace.get_gen_fn().assess(&choices, &seeded)?;
        tracing::debug!(score = score.value(), n, "argument gradients");

        Ok(self
            .argnums
            .iter()
            .map(|index| score.partial(directions[index]))
            .collect())
    }
}

/// Gradient of a trace's log density with respect to some of its choices,
/// holding the other choices and the arguments fixed
#[derive(Debug)]
pub struct ChoiceGradients<'t> {
    trace: &'t Trace,
}

impl<'t> ChoiceGradients<'t> {
    pub fn new(trace: &'t Trace) -> Self {
        Self { trace }
    }

    /// Gradient at every address in `choices`, evaluated at the values
    /// `choices` gives for them.
    ///
    /// Every queried address must hold a real value in the trace; otherwise
    /// the result is `AddressNotFound` or `TypeMismatch`.
    pub fn handle(&self, choices: &ChoiceMap) -> GenResult<ChoiceMap> {
        let queried = choices.leaves();
        let n = queried.len();

        let recorded = self.trace.get_choices();
        let mut replayed = ChoiceMap::from_pairs(
            recorded
                .leaves()
                .into_iter()
                .map(|(addr, value)| (addr, value.detach())),
        )?;
        for (direction, (addr, value)) in queried.iter().enumerate() {
            match recorded.get(addr) {
                None => return Err(GenError::AddressNotFound(addr.clone())),
                Some(Value::Real(_)) => {}
                Some(other) => {
                    return Err(GenError::TypeMismatch {
                        expected: "real",
                        actual: other.kind().to_string(),
                    })
                }
            }
            replayed = replayed.replace(addr.clone(), seed(value, direction, n)?)?;
        }

        let args: Vec<Value> = self.trace.get_args().iter().map(Value::detach).collect();
        let (score, _) = self.trace.get_gen_fn().assess(&replayed, &args)?;
        tracing::debug!(score = score.value(), n, "choice gradients");

        ChoiceMap::from_pairs(
            queried
                .into_iter()
                .enumerate()
                .map(|(direction, (addr, _))| (addr, Value::real(score.partial(direction)))),
        )
    }
}
