//! The generative function interface
//!
//! Every model, primitive distribution and combinator implements
//! [`GenerativeFunction`]. Generative functions are shared as [`GenFn`]
//! handles; the interface methods take `self: Arc<Self>` so the trace a
//! method produces can point back at the function that produced it.

use std::fmt;
use std::sync::Arc;

use crate::ad::Real;
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::value::Value;
use crate::error::GenResult;
use crate::generative::trace::Trace;
use crate::random::Key;

/// Shared handle to a generative function
pub type GenFn = Arc<dyn GenerativeFunction>;

/// A function embodying a probability model.
///
/// Implementors derive every operation from one description of the model:
/// sampling, conditioning, scoring and incremental change.
pub trait GenerativeFunction: Send + Sync + fmt::Debug {
    /// Human-readable name; also used to decide whether a previous sub-trace
    /// can be updated in place
    fn name(&self) -> &str;

    /// Run the model forward, sampling every choice from the prior
    fn simulate(self: Arc<Self>, key: Key, args: &[Value]) -> GenResult<Trace>;

    /// Sample from the prior and report choices, score and return value
    fn propose(self: Arc<Self>, key: Key, args: &[Value]) -> GenResult<(ChoiceMap, Real, Value)> {
        let trace = self.simulate(key, args)?;
        Ok((trace.get_choices(), trace.score().clone(), trace.get_retval().clone()))
    }

    /// Run the model with some choices fixed by `constraints`.
    ///
    /// Returns the trace and the log importance weight: the log density of
    /// the constrained choices given everything upstream of them.
    fn importance(
        self: Arc<Self>,
        key: Key,
        constraints: &ChoiceMap,
        args: &[Value],
    ) -> GenResult<(Trace, Real)>;

    /// Score a complete assignment of choices without drawing randomness
    fn assess(&self, choices: &ChoiceMap, args: &[Value]) -> GenResult<(Real, Value)>;

    /// Move `trace` to new arguments and constraints.
    ///
    /// Returns the new trace, the log weight `log p(new) - log p(old)`
    /// (excluding freshly sampled choices) and the discarded old values.
    fn update(
        self: Arc<Self>,
        key: Key,
        trace: &Trace,
        constraints: &ChoiceMap,
        args: &[Value],
    ) -> GenResult<(Trace, Real, ChoiceMap)>;
}

/// Check an argument list length
pub(crate) fn check_arity(name: &str, expected: usize, args: &[Value]) -> GenResult<()> {
    if args.len() != expected {
        return Err(crate::error::GenError::ArityMismatch {
            name: name.to_string(),
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}
