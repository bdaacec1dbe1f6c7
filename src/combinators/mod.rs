//! Combinators building generative functions out of others

pub mod map_addresses;
pub mod mask;
pub mod repeat;

use std::sync::Arc;

use crate::datatypes::bijection::AddressBijection;
use crate::generative::traits::GenFn;

pub use map_addresses::MapAddresses;
pub use mask::Mask;
pub use repeat::Repeat;

/// `n` independent calls of `gen_fn`, addressed `0..n`
pub fn repeat(gen_fn: GenFn, n: usize) -> GenFn {
    Arc::new(Repeat::new(gen_fn, n))
}

/// `gen_fn` behind a boolean flag passed as the first argument
pub fn mask(gen_fn: GenFn) -> GenFn {
    Arc::new(Mask::new(gen_fn))
}

/// `gen_fn` with its addresses renamed by `bijection`
pub fn map_addresses(gen_fn: GenFn, bijection: AddressBijection) -> GenFn {
    Arc::new(MapAddresses::new(gen_fn, bijection))
}

pub mod prelude {
    pub use super::{map_addresses, mask, repeat, MapAddresses, Mask, Repeat};
}
