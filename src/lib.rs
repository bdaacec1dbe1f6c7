//! # fugue-gen
//!
//! Programmable inference through generative functions, for Rust.
//!
//! A model is written once, as ordinary code calling a `trace` primitive at
//! named addresses. Every operation of the generative function interface is
//! derived from that one body by running it under a different effect
//! handler: forward simulation, importance sampling against constraints,
//! scoring, incremental update and gradients of the log density.
//!
//! ## Core Concepts
//!
//! - **Addresses and choice maps**: random choices live in a hierarchical,
//!   persistent address trie
//! - **Generative functions**: primitives, static models and combinators
//!   share one interface and nest freely
//! - **Handlers as interpreters**: the handler is a type parameter of the
//!   model body, resolved at compile time
//! - **Differentiable scores**: log densities are computed on dual numbers
//!
//! ## Quick Start
//!
//! ```rust
//! use fugue_gen::prelude::*;
//! use fugue_gen::address;
//!
//! struct TwoFlips;
//!
//! impl Model for TwoFlips {
//!     fn call<H: Handler>(
//!         &self,
//!         t: &mut Tracer<'_, H>,
//!         key: Key,
//!         args: &[Value],
//!     ) -> GenResult<(Key, Value)> {
//!         let p = args[0].clone();
//!         let (key, m1) = t.trace("m1", &bernoulli(), key, &[p.clone()])?;
//!         let (key, m2) = t.trace("m2", &bernoulli(), key, &[p])?;
//!         Ok((key, Value::Int(m1.as_int()? + m2.as_int()?)))
//!     }
//! }
//!
//! let model = gen(TwoFlips);
//! let constraints = ChoiceMap::from_pairs([(address!("m1"), true)])?;
//! let (trace, weight) = model.importance(Key::new(42), &constraints, &[Value::real(0.3)])?;
//!
//! assert!((weight.value() - 0.3f64.ln()).abs() < 1e-12);
//! assert_eq!(trace.get_choices().get(&address!("m1")), Some(&Value::Bool(true)));
//! # Ok::<(), GenError>(())
//! ```

pub mod ad;
pub mod batch;
pub mod combinators;
pub mod datatypes;
pub mod distributions;
pub mod error;
pub mod fugue_integration;
pub mod generative;
pub mod interpreter;
pub mod random;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ad::prelude::*;
    pub use crate::batch::{importance_batch, log_mean_exp, simulate_batch};
    pub use crate::combinators::prelude::*;
    pub use crate::datatypes::prelude::*;
    pub use crate::distributions::prelude::*;
    pub use crate::error::*;
    pub use crate::fugue_integration::prelude::*;
    pub use crate::generative::prelude::*;
    pub use crate::interpreter::prelude::*;
    pub use crate::random::Key;
}
