//! Forward-mode dual numbers
//!
//! A `Dual` carries a primal value and a dense tangent vector, one slot per
//! seeded input direction. Seeding `n` inputs with the unit tangents
//! `e_0 .. e_{n-1}` and evaluating a function once yields its full gradient
//! in the tangent of the output.
//!
//! An empty tangent stands for the zero vector, so constants never allocate.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};
use statrs::function::gamma::{digamma, ln_gamma};

/// Multi-directional forward-mode dual number
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dual {
    value: f64,
    tangent: Vec<f64>,
}

impl Dual {
    /// A constant: zero tangent in every direction
    pub fn constant(value: f64) -> Self {
        Self {
            value,
            tangent: Vec::new(),
        }
    }

    /// An input variable seeded with the unit tangent `e_index` of an
    /// `n`-dimensional tangent space
    pub fn variable(value: f64, index: usize, n: usize) -> Self {
        let mut tangent = vec![0.0; n.max(index + 1)];
        tangent[index] = 1.0;
        Self { value, tangent }
    }

    /// Build a dual from an explicit tangent
    pub fn with_tangent(value: f64, tangent: Vec<f64>) -> Self {
        Self { value, tangent }
    }

    /// Primal value
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn tangent(&self) -> &[f64] {
        &self.tangent
    }

    /// Partial derivative along direction `index`
    pub fn partial(&self, index: usize) -> f64 {
        self.tangent.get(index).copied().unwrap_or(0.0)
    }

    pub fn is_constant(&self) -> bool {
        self.tangent.iter().all(|t| *t == 0.0)
    }

    /// Drop the tangent, keeping the primal
    pub fn detach(&self) -> Self {
        Self::constant(self.value)
    }

    /// Unary chain rule: result value `value`, derivative `d` w.r.t. `self`
    fn chain(&self, value: f64, d: f64) -> Self {
        Self {
            value,
            tangent: self.tangent.iter().map(|t| t * d).collect(),
        }
    }

    /// Binary chain rule with partials `da`, `db`
    fn combine(a: &Dual, b: &Dual, value: f64, da: f64, db: f64) -> Self {
        let n = a.tangent.len().max(b.tangent.len());
        let tangent = (0..n).map(|i| da * a.partial(i) + db * b.partial(i)).collect();
        Self { value, tangent }
    }

    pub fn ln(&self) -> Self {
        self.chain(self.value.ln(), 1.0 / self.value)
    }

    pub fn ln_1p(&self) -> Self {
        self.chain(self.value.ln_1p(), 1.0 / (1.0 + self.value))
    }

    pub fn exp(&self) -> Self {
        let e = self.value.exp();
        self.chain(e, e)
    }

    pub fn sqrt(&self) -> Self {
        let s = self.value.sqrt();
        self.chain(s, 0.5 / s)
    }

    pub fn powi(&self, n: i32) -> Self {
        self.chain(self.value.powi(n), n as f64 * self.value.powi(n - 1))
    }

    pub fn powf(&self, p: f64) -> Self {
        self.chain(self.value.powf(p), p * self.value.powf(p - 1.0))
    }

    pub fn sin(&self) -> Self {
        self.chain(self.value.sin(), self.value.cos())
    }

    pub fn cos(&self) -> Self {
        self.chain(self.value.cos(), -self.value.sin())
    }

    pub fn tanh(&self) -> Self {
        let t = self.value.tanh();
        self.chain(t, 1.0 - t * t)
    }

    /// Logistic sigmoid
    pub fn sigmoid(&self) -> Self {
        let s = 1.0 / (1.0 + (-self.value).exp());
        self.chain(s, s * (1.0 - s))
    }

    /// Log of the gamma function; its derivative is the digamma function
    pub fn ln_gamma(&self) -> Self {
        self.chain(ln_gamma(self.value), digamma(self.value))
    }

    pub fn abs(&self) -> Self {
        let sign = if self.value < 0.0 { -1.0 } else { 1.0 };
        self.chain(self.value.abs(), sign)
    }
}

impl From<f64> for Dual {
    fn from(value: f64) -> Self {
        Dual::constant(value)
    }
}

impl Neg for Dual {
    type Output = Dual;
    fn neg(self) -> Dual {
        self.chain(-self.value, -1.0)
    }
}

impl Neg for &Dual {
    type Output = Dual;
    fn neg(self) -> Dual {
        self.chain(-self.value, -1.0)
    }
}

macro_rules! binary_op {
    ($trait:ident, $method:ident, |$a:ident, $b:ident| $value:expr, $da:expr, $db:expr) => {
        impl $trait<&Dual> for &Dual {
            type Output = Dual;
            fn $method(self, other: &Dual) -> Dual {
                let ($a, $b) = (self.value, other.value);
                Dual::combine(self, other, $value, $da, $db)
            }
        }

        impl $trait<Dual> for Dual {
            type Output = Dual;
            fn $method(self, other: Dual) -> Dual {
                (&self).$method(&other)
            }
        }

        impl $trait<&Dual> for Dual {
            type Output = Dual;
            fn $method(self, other: &Dual) -> Dual {
                (&self).$method(other)
            }
        }

        impl $trait<Dual> for &Dual {
            type Output = Dual;
            fn $method(self, other: Dual) -> Dual {
                self.$method(&other)
            }
        }

        impl $trait<f64> for Dual {
            type Output = Dual;
            fn $method(self, other: f64) -> Dual {
                (&self).$method(&Dual::constant(other))
            }
        }

        impl $trait<f64> for &Dual {
            type Output = Dual;
            fn $method(self, other: f64) -> Dual {
                self.$method(&Dual::constant(other))
            }
        }

        impl $trait<Dual> for f64 {
            type Output = Dual;
            fn $method(self, other: Dual) -> Dual {
                (&Dual::constant(self)).$method(&other)
            }
        }

        impl $trait<&Dual> for f64 {
            type Output = Dual;
            fn $method(self, other: &Dual) -> Dual {
                (&Dual::constant(self)).$method(other)
            }
        }
    };
}

binary_op!(Add, add, |a, b| a + b, 1.0, 1.0);
binary_op!(Sub, sub, |a, b| a - b, 1.0, -1.0);
binary_op!(Mul, mul, |a, b| a * b, b, a);
binary_op!(Div, div, |a, b| a / b, 1.0 / b, -a / (b * b));

impl AddAssign<&Dual> for Dual {
    fn add_assign(&mut self, other: &Dual) {
        *self = &*self + other;
    }
}

impl AddAssign<Dual> for Dual {
    fn add_assign(&mut self, other: Dual) {
        *self = &*self + &other;
    }
}

impl SubAssign<&Dual> for Dual {
    fn sub_assign(&mut self, other: &Dual) {
        *self = &*self - other;
    }
}

impl SubAssign<Dual> for Dual {
    fn sub_assign(&mut self, other: Dual) {
        *self = &*self - &other;
    }
}

impl Sum for Dual {
    fn sum<I: Iterator<Item = Dual>>(iter: I) -> Dual {
        iter.fold(Dual::constant(0.0), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Dual> for Dual {
    fn sum<I: Iterator<Item = &'a Dual>>(iter: I) -> Dual {
        iter.fold(Dual::constant(0.0), |acc, x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_has_zero_partials() {
        let c = Dual::constant(3.0);
        assert!(c.is_constant());
        assert_eq!(c.partial(0), 0.0);
        assert_eq!(c.partial(7), 0.0);
    }

    #[test]
    fn test_product_rule() {
        let x = Dual::variable(3.0, 0, 2);
        let y = Dual::variable(4.0, 1, 2);
        let z = &x * &y + x.clone();
        assert_relative_eq!(z.value(), 15.0);
        assert_relative_eq!(z.partial(0), 5.0);
        assert_relative_eq!(z.partial(1), 3.0);
    }

    #[test]
    fn test_quotient_rule() {
        let x = Dual::variable(2.0, 0, 1);
        let z = 1.0 / &x;
        assert_relative_eq!(z.value(), 0.5);
        assert_relative_eq!(z.partial(0), -0.25);
    }

    #[test]
    fn test_log_derivative() {
        let x = Dual::variable(0.3, 0, 1);
        let f = x.ln() + (1.0 - &x).ln();
        assert_relative_eq!(f.partial(0), 1.0 / 0.3 - 1.0 / 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_exp_and_sqrt() {
        let x = Dual::variable(1.5, 0, 1);
        assert_relative_eq!(x.exp().partial(0), 1.5f64.exp());
        assert_relative_eq!(x.sqrt().partial(0), 0.5 / 1.5f64.sqrt());
        assert_relative_eq!(x.powi(3).partial(0), 3.0 * 1.5 * 1.5);
    }

    #[test]
    fn test_sigmoid_derivative() {
        let x = Dual::variable(0.0, 0, 1);
        let s = x.sigmoid();
        assert_relative_eq!(s.value(), 0.5);
        assert_relative_eq!(s.partial(0), 0.25);
    }

    #[test]
    fn test_ln_gamma_derivative_matches_finite_difference() {
        let x = 2.7;
        let h = 1e-6;
        let numeric = (ln_gamma(x + h) - ln_gamma(x - h)) / (2.0 * h);
        let analytic = Dual::variable(x, 0, 1).ln_gamma().partial(0);
        assert_relative_eq!(numeric, analytic, epsilon = 1e-6);
    }

    #[test]
    fn test_ln_gamma_known_values() {
        let euler_mascheroni = 0.577_215_664_901_532_9;
        let one = Dual::variable(1.0, 0, 1).ln_gamma();
        assert_relative_eq!(one.value(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(one.partial(0), -euler_mascheroni, epsilon = 1e-10);
        let five = Dual::constant(5.0).ln_gamma();
        assert_relative_eq!(five.value(), 24.0f64.ln(), epsilon = 1e-10);
    }

    #[test]
    fn test_sum_of_duals() {
        let xs = vec![Dual::variable(1.0, 0, 2), Dual::variable(2.0, 1, 2), Dual::constant(3.0)];
        let total: Dual = xs.iter().sum();
        assert_relative_eq!(total.value(), 6.0);
        assert_eq!(total.tangent(), &[1.0, 1.0]);
    }
}
