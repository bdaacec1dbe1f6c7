//! Generative function interface
//!
//! - [`GenerativeFunction`](traits::GenerativeFunction): the operation set
//!   every model supports
//! - [`Trace`](trace::Trace): the record one execution produces
//! - [`GenConfig`](config::GenConfig): per-function configuration

pub mod config;
pub mod trace;
pub mod traits;

pub mod prelude {
    pub use super::config::*;
    pub use super::trace::*;
    pub use super::traits::*;
}
