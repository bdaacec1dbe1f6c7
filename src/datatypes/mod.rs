//! Data flowing through traced programs
//!
//! Addresses name random choices; tries store values by address; choice maps
//! and selections are the two tries callers hand to the interface.

pub mod address;
pub mod bijection;
pub mod choice_map;
pub mod selection;
pub mod trie;
pub mod value;

pub mod prelude {
    pub use super::address::*;
    pub use super::bijection::*;
    pub use super::choice_map::*;
    pub use super::selection::*;
    pub use super::trie::*;
    pub use super::value::*;
}
