//! Values flowing through models
//!
//! Arguments, return values and random choices all share one value type.
//! Real numbers are dual numbers so that gradients flow through whatever a
//! model computes from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ad::Real;
use crate::error::{GenError, GenResult};

/// A model-level value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Real(Real),
    Tuple(Vec<Value>),
}

impl Value {
    /// Constant real value
    pub fn real(x: f64) -> Self {
        Value::Real(Real::constant(x))
    }

    /// Name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Real(_) => "real",
            Value::Tuple(_) => "tuple",
        }
    }

    fn mismatch(&self, expected: &'static str) -> GenError {
        GenError::TypeMismatch {
            expected,
            actual: self.kind().to_string(),
        }
    }

    pub fn as_bool(&self) -> GenResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_int(&self) -> GenResult<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(*b as i64),
            other => Err(other.mismatch("int")),
        }
    }

    /// Real view of a numeric value; ints and bools are promoted to constants
    pub fn as_real(&self) -> GenResult<Real> {
        match self {
            Value::Real(r) => Ok(r.clone()),
            Value::Int(i) => Ok(Real::constant(*i as f64)),
            Value::Bool(b) => Ok(Real::constant(if *b { 1.0 } else { 0.0 })),
            other => Err(other.mismatch("real")),
        }
    }

    /// Primal value of a numeric value
    pub fn as_f64(&self) -> GenResult<f64> {
        self.as_real().map(|r| r.value())
    }

    pub fn as_tuple(&self) -> GenResult<&[Value]> {
        match self {
            Value::Tuple(items) => Ok(items),
            other => Err(other.mismatch("tuple")),
        }
    }

    /// Copy with every tangent dropped
    pub fn detach(&self) -> Value {
        match self {
            Value::Real(r) => Value::Real(r.detach()),
            Value::Tuple(items) => Value::Tuple(items.iter().map(Value::detach).collect()),
            other => other.clone(),
        }
    }

    /// Equality on primal values, ignoring tangents
    pub fn primal_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Real(a), Value::Real(b)) => a.value() == b.value(),
            (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.primal_eq(y))
            }
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r.value()),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::real(x)
    }
}

impl From<Real> for Value {
    fn from(r: Real) -> Self {
        Value::Real(r)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Tuple(items)
    }
}
