//! Execution traces
//!
//! A [`Trace`] records one execution of a generative function: the function,
//! its arguments, its return value, the random choices it made and the log
//! density of those choices under the model. Traces are produced once, by a
//! recording handler, and are immutable afterwards.

use std::fmt;
use std::sync::Arc;

use crate::ad::Real;
use crate::datatypes::address::{Address, Segment};
use crate::datatypes::bijection::AddressBijection;
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::selection::Selection;
use crate::datatypes::trie::Trie;
use crate::datatypes::value::Value;
use crate::generative::traits::GenFn;

/// A value memoized by `cache`, with the arguments it was computed from
#[derive(Clone, Debug, PartialEq)]
pub struct Cached {
    pub args: Vec<Value>,
    pub value: Value,
}

/// How a trace stores the executions it is composed of
#[derive(Clone, Debug)]
pub enum TraceBody {
    /// A primitive distribution: the choice is the return value
    Choice,
    /// A static model: sub-traces and cached values by address
    Static {
        subtraces: Trie<Trace>,
        cache: Trie<Cached>,
    },
    /// A vectorized combinator: one sub-trace per index
    Vector(Vec<Trace>),
    /// A masked execution; it counts toward the score only when `flag` is set
    Masked { flag: bool, inner: Box<Trace> },
    /// An execution whose addresses are renamed outward by `bijection`
    Remapped {
        inner: Box<Trace>,
        bijection: Arc<AddressBijection>,
    },
}

/// Recorded execution of a generative function
#[derive(Clone)]
pub struct Trace {
    gen_fn: GenFn,
    args: Vec<Value>,
    retval: Value,
    choices: ChoiceMap,
    score: Real,
    body: TraceBody,
}

/// A trace reduced to what a caller observes
#[derive(Clone, Debug, PartialEq)]
pub struct StrippedTrace {
    pub retval: Value,
    pub choices: ChoiceMap,
}

impl Trace {
    pub(crate) fn new(
        gen_fn: GenFn,
        args: Vec<Value>,
        retval: Value,
        choices: ChoiceMap,
        score: Real,
        body: TraceBody,
    ) -> Self {
        Self {
            gen_fn,
            args,
            retval,
            choices,
            score,
            body,
        }
    }

    pub fn get_gen_fn(&self) -> &GenFn {
        &self.gen_fn
    }

    pub fn get_args(&self) -> &[Value] {
        &self.args
    }

    pub fn get_retval(&self) -> &Value {
        &self.retval
    }

    /// The choices made during this execution
    pub fn get_choices(&self) -> ChoiceMap {
        self.choices.clone()
    }

    /// Log density of the execution under the model
    pub fn get_score(&self) -> f64 {
        self.score.value()
    }

    /// Score as a dual number, carrying any tangents seeded into the arguments
    pub fn score(&self) -> &Real {
        &self.score
    }

    pub fn body(&self) -> &TraceBody {
        &self.body
    }

    /// Drop everything but the return value and the choices
    pub fn strip(&self) -> StrippedTrace {
        StrippedTrace {
            retval: self.retval.clone(),
            choices: self.choices.clone(),
        }
    }

    /// Sub-trace recorded exactly at `addr` of a static trace
    pub(crate) fn subtrace_at(&self, addr: &Address) -> Option<&Trace> {
        match &self.body {
            TraceBody::Static { subtraces, .. } => subtraces.lookup(addr),
            _ => None,
        }
    }

    /// Direct sub-traces of a static trace, with their addresses
    pub fn subtraces(&self) -> Vec<(Address, &Trace)> {
        match &self.body {
            TraceBody::Static { subtraces, .. } => subtraces.leaves(),
            _ => Vec::new(),
        }
    }

    /// The trace of the callee responsible for `addr`.
    ///
    /// Descends through nested calls, so `get_subtrace(("g", "f", "x"))`
    /// equals `get_subtrace("g")` followed by `get_subtrace(("f", "x"))`.
    pub fn get_subtrace(&self, addr: impl Into<Address>) -> Option<&Trace> {
        let addr = addr.into();
        if addr.is_empty() {
            return Some(self);
        }
        let segments = addr.segments();
        match &self.body {
            TraceBody::Choice => None,
            TraceBody::Static { subtraces, .. } => (1..=segments.len()).find_map(|depth| {
                let head = Address::new(segments[..depth].to_vec());
                subtraces.lookup(&head).and_then(|sub| {
                    sub.get_subtrace(Address::new(segments[depth..].to_vec()))
                })
            }),
            TraceBody::Vector(subtraces) => match &segments[0] {
                Segment::Index(i) => subtraces
                    .get(*i)
                    .and_then(|sub| sub.get_subtrace(Address::new(segments[1..].to_vec()))),
                Segment::Name(_) => None,
            },
            TraceBody::Masked { inner, .. } => inner.get_subtrace(&addr),
            TraceBody::Remapped { inner, bijection } => bijection
                .backward(&addr)
                .and_then(|inward| inner.get_subtrace(inward)),
        }
    }

    /// The value memoized by `cache` at `addr`
    pub fn cached(&self, addr: &Address) -> Option<&Cached> {
        match &self.body {
            TraceBody::Static { cache, .. } => cache.lookup(addr),
            _ => None,
        }
    }

    /// Log density restricted to the choices `selection` includes
    pub fn project(&self, selection: &Selection) -> f64 {
        match &self.body {
            TraceBody::Choice => {
                if selection.check() {
                    self.get_score()
                } else {
                    0.0
                }
            }
            TraceBody::Static { subtraces, .. } => subtraces
                .leaves()
                .into_iter()
                .map(|(addr, sub)| sub.project(&selection.step_path(&addr)))
                .sum(),
            TraceBody::Vector(subtraces) => subtraces
                .iter()
                .enumerate()
                .map(|(i, sub)| sub.project(&selection.step(&Segment::Index(i))))
                .sum(),
            TraceBody::Masked { flag, inner } => {
                if *flag {
                    inner.project(selection)
                } else {
                    0.0
                }
            }
            TraceBody::Remapped { inner, bijection } => {
                let inward = Selection::from_addresses(
                    inner
                        .get_choices()
                        .addresses()
                        .into_iter()
                        .filter(|addr| {
                            bijection
                                .forward(addr)
                                .map_or(false, |outer| selection.includes(&outer))
                        }),
                );
                inner.project(&inward)
            }
        }
    }

    /// Every primitive choice's trace that counts toward the score, with its
    /// full address. Choices under an unset mask are left out.
    pub fn leaf_traces(&self) -> Vec<(Address, &Trace)> {
        match &self.body {
            TraceBody::Choice => vec![(Address::root(), self)],
            TraceBody::Static { subtraces, .. } => subtraces
                .leaves()
                .into_iter()
                .flat_map(|(addr, sub)| {
                    sub.leaf_traces()
                        .into_iter()
                        .map(move |(inner, leaf)| (addr.join(&inner), leaf))
                })
                .collect(),
            TraceBody::Vector(subtraces) => subtraces
                .iter()
                .enumerate()
                .flat_map(|(i, sub)| {
                    let addr = Address::from(i);
                    sub.leaf_traces()
                        .into_iter()
                        .map(move |(inner, leaf)| (addr.join(&inner), leaf))
                })
                .collect(),
            TraceBody::Masked { flag: true, inner } => inner.leaf_traces(),
            TraceBody::Masked { flag: false, .. } => Vec::new(),
            TraceBody::Remapped { inner, bijection } => inner
                .leaf_traces()
                .into_iter()
                .filter_map(|(addr, leaf)| bijection.forward(&addr).map(|outer| (outer, leaf)))
                .collect(),
        }
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("gen_fn", &self.gen_fn.name())
            .field("args", &self.args)
            .field("retval", &self.retval)
            .field("score", &self.score.value())
            .field("choices", &self.choices)
            .finish()
    }
}
