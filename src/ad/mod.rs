//! Differentiable scalar substrate
//!
//! Log-densities and scores are computed over [`Real`], a forward-mode dual
//! number, so the same model code yields both values and gradients with
//! respect to whichever inputs were seeded as variables.

pub mod dual;

pub use dual::Dual;

/// The scalar type flowing through models, scores and weights
pub type Real = Dual;

pub mod prelude {
    pub use super::dual::Dual;
    pub use super::Real;
}
