//! Handlers realizing the generative function operations
//!
//! Each handler gives the `trace` and `cache` primitives one meaning:
//!
//! - [`Simulate`]: sample every callee from its prior
//! - [`Generate`]: constrain callees to given choices, accumulating a weight
//! - [`Assess`]: score a complete choice assignment without sampling
//! - [`Update`]: move a previous trace to new arguments and constraints
//! - [`ArgumentGradients`] and [`ChoiceGradients`]: gradients of the score
//!
//! Callees are always invoked through their own interface method of the
//! same kind, and their results are merged into the caller's records under
//! the callee's address. That is what makes hierarchical models compose.

pub mod assess;
pub mod generate;
pub mod gradients;
pub mod simulate;
pub mod update;

pub use assess::Assess;
pub use generate::Generate;
pub use gradients::{ArgumentGradients, ChoiceGradients};
pub use simulate::Simulate;
pub use update::Update;

use crate::ad::Real;
use crate::datatypes::address::Address;
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::trie::Trie;
use crate::datatypes::value::Value;
use crate::error::{GenError, GenResult};
use crate::generative::config::ConstraintPolicy;
use crate::generative::trace::{Cached, Trace, TraceBody};
use crate::generative::traits::GenFn;

/// Accumulates the pieces of a static trace while a body runs
#[derive(Clone, Debug, Default)]
pub(crate) struct TraceBuilder {
    subtraces: Trie<Trace>,
    cache: Trie<Cached>,
    choices: ChoiceMap,
    score: Real,
}

impl TraceBuilder {
    /// Record a callee's trace at `addr`
    pub(crate) fn record(&mut self, addr: &Address, sub: Trace) -> GenResult<()> {
        self.score += sub.score();
        self.choices = self.choices.insert_submap(addr, &sub.get_choices())?;
        self.subtraces = self.subtraces.insert(addr, sub)?;
        Ok(())
    }

    /// Record a memoized value at `addr`
    pub(crate) fn memoize(&mut self, addr: &Address, args: &[Value], value: &Value) -> GenResult<()> {
        let entry = Cached {
            args: args.to_vec(),
            value: value.clone(),
        };
        self.cache = self.cache.insert(addr, entry)?;
        Ok(())
    }

    /// Whether a callee's trace was recorded exactly at `addr`
    pub(crate) fn has_subtrace(&self, addr: &Address) -> bool {
        self.subtraces.lookup(addr).is_some()
    }

    pub(crate) fn finish(self, gen_fn: GenFn, args: &[Value], retval: Value) -> Trace {
        Trace::new(
            gen_fn,
            args.to_vec(),
            retval,
            self.choices,
            self.score,
            TraceBody::Static {
                subtraces: self.subtraces,
                cache: self.cache,
            },
        )
    }
}

/// Fail if `constraints` names an address the execution never visited
pub(crate) fn check_coverage(
    visited: &Trie<()>,
    constraints: &ChoiceMap,
    policy: ConstraintPolicy,
) -> GenResult<()> {
    if policy == ConstraintPolicy::Ignore {
        return Ok(());
    }
    match constraints
        .addresses()
        .into_iter()
        .find(|addr| !visited.covers(addr))
    {
        Some(addr) => {
            tracing::debug!(address = %addr, "constraint not visited");
            Err(GenError::AddressNotFound(addr))
        }
        None => Ok(()),
    }
}

pub mod prelude {
    pub use super::{ArgumentGradients, Assess, ChoiceGradients, Generate, Simulate, Update};
}
