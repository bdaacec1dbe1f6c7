//! Selections: subsets of the address space
//!
//! A selection marks which addresses an operation should act on, e.g. which
//! choices to restrict a choice map to or which part of a trace's score to
//! project onto. A leaf marker at `a` selects `a` and everything below it.

use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use crate::datatypes::address::{Address, Segment};
use crate::datatypes::trie::{Node, Trie};

/// A subset of the hierarchical address space
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    /// Every address
    All,
    /// No address
    None,
    /// The addresses marked in a trie, including everything below a marker
    Static(Trie<()>),
    /// Every address the inner selection excludes
    Complement(Arc<Selection>),
    Union(Arc<Selection>, Arc<Selection>),
    Intersection(Arc<Selection>, Arc<Selection>),
}

impl Selection {
    pub fn all() -> Self {
        Selection::All
    }

    pub fn none() -> Self {
        Selection::None
    }

    /// Select a single address and everything below it
    pub fn at(addr: impl Into<Address>) -> Self {
        let addr = addr.into();
        match Trie::new().insert(&addr, ()) {
            Ok(trie) => Selection::Static(trie),
            // Only the empty address is rejected, and it names the whole space.
            Err(_) => Selection::All,
        }
    }

    /// Select every address in `addrs`
    pub fn from_addresses<I, A>(addrs: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Address>,
    {
        let mut trie = Trie::new();
        let mut extra = Selection::None;
        for addr in addrs {
            let addr = addr.into();
            match trie.insert(&addr, ()) {
                Ok(next) => trie = next,
                // Overlapping markers: keep both, their union is what was asked.
                Err(_) => extra = extra.union(&Selection::at(addr)),
            }
        }
        let base = if trie.is_empty() {
            Selection::None
        } else {
            Selection::Static(trie)
        };
        base.union(&extra)
    }

    /// Every address this selection excludes.
    ///
    /// Complementing twice returns the original selection.
    pub fn complement(&self) -> Self {
        match self {
            Selection::All => Selection::None,
            Selection::None => Selection::All,
            Selection::Complement(inner) => (**inner).clone(),
            other => Selection::Complement(Arc::new(other.clone())),
        }
    }

    pub fn union(&self, other: &Selection) -> Self {
        match (self, other) {
            (Selection::All, _) | (_, Selection::All) => Selection::All,
            (Selection::None, s) | (s, Selection::None) => s.clone(),
            (a, b) => Selection::Union(Arc::new(a.clone()), Arc::new(b.clone())),
        }
    }

    pub fn intersection(&self, other: &Selection) -> Self {
        match (self, other) {
            (Selection::None, _) | (_, Selection::None) => Selection::None,
            (Selection::All, s) | (s, Selection::All) => s.clone(),
            (a, b) => Selection::Intersection(Arc::new(a.clone()), Arc::new(b.clone())),
        }
    }

    /// Is the root of the address space selected
    pub fn check(&self) -> bool {
        match self {
            Selection::All => true,
            Selection::None | Selection::Static(_) => false,
            Selection::Complement(inner) => !inner.check(),
            Selection::Union(a, b) => a.check() || b.check(),
            Selection::Intersection(a, b) => a.check() && b.check(),
        }
    }

    /// The sub-selection below `segment`
    pub fn step(&self, segment: &Segment) -> Selection {
        match self {
            Selection::All => Selection::All,
            Selection::None => Selection::None,
            Selection::Static(trie) => match trie.get(&Address::from(segment.clone())) {
                Some(Node::Leaf(())) => Selection::All,
                Some(Node::Branch(sub)) => Selection::Static(sub.clone()),
                None => Selection::None,
            },
            Selection::Complement(inner) => inner.step(segment).complement(),
            Selection::Union(a, b) => a.step(segment).union(&b.step(segment)),
            Selection::Intersection(a, b) => a.step(segment).intersection(&b.step(segment)),
        }
    }

    /// The sub-selection below `addr`
    pub fn step_path(&self, addr: &Address) -> Selection {
        addr.segments()
            .iter()
            .fold(self.clone(), |sel, segment| sel.step(segment))
    }

    /// Is `addr` (and so everything below it) selected
    pub fn includes(&self, addr: &Address) -> bool {
        self.step_path(addr).check()
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::None
    }
}

impl Not for Selection {
    type Output = Selection;
    fn not(self) -> Selection {
        self.complement()
    }
}

impl BitOr for Selection {
    type Output = Selection;
    fn bitor(self, other: Selection) -> Selection {
        self.union(&other)
    }
}

impl BitAnd for Selection {
    type Output = Selection;
    fn bitand(self, other: Selection) -> Selection {
        self.intersection(&other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;

    #[test]
    fn test_at_includes_descendants() {
        let sel = Selection::at("x");
        assert!(sel.includes(&address!("x")));
        assert!(sel.includes(&address!("x", "y")));
        assert!(!sel.includes(&address!("y")));
        assert!(!sel.check());
    }

    #[test]
    fn test_hierarchical_address() {
        let sel = Selection::at(("m3", "p"));
        assert!(sel.includes(&address!("m3", "p")));
        assert!(!sel.includes(&address!("m3")));
        assert!(!sel.includes(&address!("m3", "q")));
    }

    #[test]
    fn test_complement() {
        let sel = Selection::at("x");
        let comp = sel.complement();
        assert!(!comp.includes(&address!("x")));
        assert!(comp.includes(&address!("y")));
        assert!(comp.includes(&address!("z", "w")));
        assert_eq!(comp.complement(), sel);
    }

    #[test]
    fn test_all_and_none() {
        assert!(Selection::all().includes(&address!("anything")));
        assert!(!Selection::none().includes(&address!("anything")));
        assert_eq!(Selection::all().complement(), Selection::none());
        assert_eq!(Selection::at(Address::root()), Selection::All);
    }

    #[test]
    fn test_union_and_intersection() {
        let a = Selection::at("a");
        let b = Selection::at("b");
        let either = a.clone() | b.clone();
        assert!(either.includes(&address!("a")));
        assert!(either.includes(&address!("b")));
        assert!(!either.includes(&address!("c")));

        let both = either & !b;
        assert!(both.includes(&address!("a")));
        assert!(!both.includes(&address!("b")));
    }

    #[test]
    fn test_from_addresses_overlapping() {
        let sel = Selection::from_addresses(vec![address!("a", "b"), address!("a"), address!("c")]);
        assert!(sel.includes(&address!("a")));
        assert!(sel.includes(&address!("a", "z")));
        assert!(sel.includes(&address!("c")));
        assert!(!sel.includes(&address!("d")));
    }

    #[test]
    fn test_step() {
        let sel = Selection::at(("m", "p"));
        let sub = sel.step(&Segment::from("m"));
        assert!(sub.includes(&address!("p")));
        assert!(sub.step(&Segment::from("p")).check());
        assert_eq!(sel.step(&Segment::from("q")), Selection::None);
    }
}
