//! Error types for fugue-gen
//!
//! This module defines all error types used throughout the library. Every
//! error is a modeling or usage error surfaced synchronously to the caller;
//! none of them is retried by the interpreter.

use thiserror::Error;

use crate::datatypes::address::Address;

/// Error type for generative function operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenError {
    /// An address was used twice within one handler scope
    #[error("Duplicate address in a single invocation: {0}")]
    DuplicateAddress(Address),

    /// A constraint, selection or replayed choice refers to an address the
    /// execution never visited
    #[error("Address not found: {0}")]
    AddressNotFound(Address),

    /// A trie insertion conflicts with the existing structure
    #[error("Shape conflict at address {0}")]
    ShapeConflict(Address),

    /// A value had the wrong variant for the requested use
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
    },

    /// A distribution was given parameters outside its domain
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A generative function received the wrong number of arguments
    #[error("Arity mismatch for {name}: expected {expected}, got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A gradient was requested for an argument index that does not exist
    #[error("Argument index {index} out of range for {len} arguments")]
    ArgumentIndex { index: usize, len: usize },
}

impl GenError {
    /// Re-root an error raised inside a callee under the callee's address.
    ///
    /// Address-carrying errors are reported relative to the invocation that
    /// raised them, so a caller prefixes them with the address it traced the
    /// callee at.
    pub fn within(self, prefix: &Address) -> Self {
        self.map_address(|addr| prefix.join(addr))
    }

    /// Rewrite the address carried by the error, if any
    pub fn map_address<F>(self, f: F) -> Self
    where
        F: FnOnce(&Address) -> Address,
    {
        match self {
            Self::DuplicateAddress(addr) => Self::DuplicateAddress(f(&addr)),
            Self::AddressNotFound(addr) => Self::AddressNotFound(f(&addr)),
            Self::ShapeConflict(addr) => Self::ShapeConflict(f(&addr)),
            other => other,
        }
    }

    /// Returns true for the errors that indicate a bug in the model itself
    pub fn is_modeling_error(&self) -> bool {
        matches!(self, Self::DuplicateAddress(_) | Self::ShapeConflict(_))
    }
}

/// Result type alias for generative function operations
pub type GenResult<T> = Result<T, GenError>;
