//! Hierarchical addresses
//!
//! An address names the position of a random choice inside a model. Nested
//! generative function calls produce nested addresses, so a choice `p` drawn
//! by a callee traced at `m3` lives at `m3/p`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One component of an address
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Segment {
    /// A named component, e.g. `"x"`
    Name(String),
    /// A positional component, used by combinators such as `repeat`
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(name) => write!(f, "{}", name),
            Segment::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Segment::Name(name.to_string())
    }
}

impl From<String> for Segment {
    fn from(name: String) -> Self {
        Segment::Name(name)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// A hierarchical name: a sequence of segments
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(Vec<Segment>);

impl Address {
    /// Create an address from its segments
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// The empty address, naming the root of a choice map
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// First segment and the remaining address
    pub fn split_first(&self) -> Option<(&Segment, Address)> {
        self.0
            .split_first()
            .map(|(first, rest)| (first, Address(rest.to_vec())))
    }

    /// Concatenate `self` followed by `suffix`
    pub fn join(&self, suffix: &Address) -> Address {
        let mut segments = self.0.clone();
        segments.extend(suffix.0.iter().cloned());
        Address(segments)
    }

    /// Append a single segment
    pub fn child(&self, segment: impl Into<Segment>) -> Address {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Address(segments)
    }

    /// Returns true if `prefix` is a (not necessarily strict) prefix of `self`
    pub fn starts_with(&self, prefix: &Address) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<Segment> for Address {
    fn from(segment: Segment) -> Self {
        Address(vec![segment])
    }
}

impl From<&str> for Address {
    fn from(name: &str) -> Self {
        Address(vec![name.into()])
    }
}

impl From<String> for Address {
    fn from(name: String) -> Self {
        Address(vec![name.into()])
    }
}

impl From<usize> for Address {
    fn from(index: usize) -> Self {
        Address(vec![index.into()])
    }
}

impl From<&Address> for Address {
    fn from(addr: &Address) -> Self {
        addr.clone()
    }
}

impl From<Vec<Segment>> for Address {
    fn from(segments: Vec<Segment>) -> Self {
        Address(segments)
    }
}

impl<A: Into<Segment>, B: Into<Segment>> From<(A, B)> for Address {
    fn from((a, b): (A, B)) -> Self {
        Address(vec![a.into(), b.into()])
    }
}

impl<A: Into<Segment>, B: Into<Segment>, C: Into<Segment>> From<(A, B, C)> for Address {
    fn from((a, b, c): (A, B, C)) -> Self {
        Address(vec![a.into(), b.into(), c.into()])
    }
}

/// Build an [`Address`] from segments
///
/// ```rust
/// use fugue_gen::address;
///
/// let addr = address!("m3", "p");
/// assert_eq!(addr.to_string(), "m3/p");
/// ```
#[macro_export]
macro_rules! address {
    () => {
        $crate::datatypes::address::Address::root()
    };
    ($($segment:expr),+ $(,)?) => {
        $crate::datatypes::address::Address::new(vec![
            $($crate::datatypes::address::Segment::from($segment)),+
        ])
    };
}
