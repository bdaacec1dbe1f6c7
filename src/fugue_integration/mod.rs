//! Fugue PPL integration
//!
//! Traces recorded here can be flattened into fugue traces and fugue traces
//! read back as choice maps, so models written against this crate can share
//! data with fugue's own inference tooling.

pub mod export;

pub mod prelude {
    pub use super::export::*;
}
