//! Persistent address trie
//!
//! `Trie<V>` backs both choice maps (leaf = recorded value) and the
//! sub-trace store of a static trace (leaf = sub-trace). Updates are
//! functional: `insert` copies only the spine along the inserted path and
//! shares every other subtree with the original through `Arc`, so a trie can
//! be handed to concurrent handler invocations without copying.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::datatypes::address::{Address, Segment};
use crate::error::{GenError, GenResult};

/// Entry stored under one segment of a trie
#[derive(Clone, Debug, PartialEq)]
pub enum Node<V> {
    /// A leaf value
    Leaf(V),
    /// A nested trie
    Branch(Trie<V>),
}

impl<V> Node<V> {
    pub fn as_leaf(&self) -> Option<&V> {
        match self {
            Node::Leaf(v) => Some(v),
            Node::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&Trie<V>> {
        match self {
            Node::Leaf(_) => None,
            Node::Branch(t) => Some(t),
        }
    }
}

/// Ordered, structurally shared mapping from addresses to leaves
#[derive(Debug)]
pub struct Trie<V> {
    inner: Arc<BTreeMap<Segment, Node<V>>>,
}

impl<V> Clone for Trie<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self {
            inner: Arc::new(BTreeMap::new()),
        }
    }
}

impl<V: PartialEq> PartialEq for Trie<V> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl<V> Trie<V> {
    /// Create an empty trie
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of entries directly under the root
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Shallow iteration over the root's entries, in segment order
    pub fn iter(&self) -> impl Iterator<Item = (&Segment, &Node<V>)> {
        self.inner.iter()
    }

    /// Entry stored exactly at `path`
    pub fn get(&self, path: &Address) -> Option<&Node<V>> {
        let (last, init) = path.segments().split_last()?;
        let mut current = self;
        for segment in init {
            current = current.inner.get(segment)?.as_branch()?;
        }
        current.inner.get(last)
    }

    /// Leaf value stored exactly at `path`
    pub fn lookup(&self, path: &Address) -> Option<&V> {
        self.get(path).and_then(Node::as_leaf)
    }

    /// Nested trie rooted at `path`; the empty path yields `self`
    pub fn subtrie(&self, path: &Address) -> Option<&Trie<V>> {
        if path.is_empty() {
            return Some(self);
        }
        self.get(path).and_then(Node::as_branch)
    }

    pub fn contains(&self, path: &Address) -> bool {
        self.get(path).is_some()
    }

    /// Returns true if inserting a fresh entry at `path` would touch existing
    /// content: something is stored at `path` itself, below it, or a leaf
    /// sits on one of its prefixes.
    pub fn is_occupied(&self, path: &Address) -> bool {
        let mut current = self;
        let segments = path.segments();
        for (i, segment) in segments.iter().enumerate() {
            match current.inner.get(segment) {
                None => return false,
                Some(_) if i + 1 == segments.len() => return true,
                Some(Node::Leaf(_)) => return true,
                Some(Node::Branch(t)) => current = t,
            }
        }
        // The empty path is the root, occupied as soon as anything is stored.
        !current.is_empty()
    }

    /// Returns true if a leaf sits at `path` or on one of its prefixes
    pub fn covers(&self, path: &Address) -> bool {
        let mut current = self;
        for segment in path.segments() {
            match current.inner.get(segment) {
                None => return false,
                Some(Node::Leaf(_)) => return true,
                Some(Node::Branch(t)) => current = t,
            }
        }
        false
    }

    /// Flattened depth-first listing of every leaf with its full address
    pub fn leaves(&self) -> Vec<(Address, &V)> {
        let mut out = Vec::new();
        self.collect_leaves(&Address::root(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &Address, out: &mut Vec<(Address, &'a V)>) {
        for (segment, node) in self.inner.iter() {
            let addr = prefix.child(segment.clone());
            match node {
                Node::Leaf(v) => out.push((addr, v)),
                Node::Branch(t) => t.collect_leaves(&addr, out),
            }
        }
    }
}

impl<V: Clone> Trie<V> {
    /// Functional insert of a leaf at `path`.
    ///
    /// Overwrites an existing leaf. Fails with `ShapeConflict` if `path` is
    /// empty, holds a nested trie, or passes through a leaf.
    pub fn insert(&self, path: &Address, value: V) -> GenResult<Self> {
        self.insert_node(path.segments(), Node::Leaf(value), path)
    }

    /// Functional insert of a whole subtrie at `path`.
    ///
    /// A subtrie landing on an existing subtrie is merged into it; any leaf
    /// collision is a `ShapeConflict`. Inserting an empty subtrie is a no-op.
    pub fn insert_subtrie(&self, path: &Address, subtrie: Trie<V>) -> GenResult<Self> {
        if subtrie.is_empty() {
            return Ok(self.clone());
        }
        if path.is_empty() {
            return self.merge(&subtrie);
        }
        self.insert_node(path.segments(), Node::Branch(subtrie), path)
    }

    fn insert_node(&self, segments: &[Segment], node: Node<V>, full: &Address) -> GenResult<Self> {
        let (first, rest) = segments
            .split_first()
            .ok_or_else(|| GenError::ShapeConflict(full.clone()))?;
        let mut map = (*self.inner).clone();

        let replacement = if rest.is_empty() {
            match (map.get(first), node) {
                (None, node) | (Some(Node::Leaf(_)), node @ Node::Leaf(_)) => node,
                (Some(Node::Branch(existing)), Node::Branch(incoming)) => {
                    Node::Branch(existing.merge_at(&incoming, full)?)
                }
                _ => return Err(GenError::ShapeConflict(full.clone())),
            }
        } else {
            let child = match map.get(first) {
                None => Trie::new().insert_node(rest, node, full)?,
                Some(Node::Branch(existing)) => existing.insert_node(rest, node, full)?,
                Some(Node::Leaf(_)) => {
                    let depth = full.len() - rest.len();
                    return Err(GenError::ShapeConflict(Address::new(
                        full.segments()[..depth].to_vec(),
                    )));
                }
            };
            Node::Branch(child)
        };

        map.insert(first.clone(), replacement);
        Ok(Self {
            inner: Arc::new(map),
        })
    }

    /// Disjoint union of two tries
    pub fn merge(&self, other: &Trie<V>) -> GenResult<Self> {
        self.merge_at(other, &Address::root())
    }

    fn merge_at(&self, other: &Trie<V>, prefix: &Address) -> GenResult<Self> {
        if other.is_empty() {
            return Ok(self.clone());
        }
        if self.is_empty() {
            return Ok(other.clone());
        }
        let mut map = (*self.inner).clone();
        for (segment, incoming) in other.inner.iter() {
            let addr = prefix.child(segment.clone());
            let merged = match (map.get(segment), incoming) {
                (None, node) => node.clone(),
                (Some(Node::Branch(a)), Node::Branch(b)) => Node::Branch(a.merge_at(b, &addr)?),
                _ => return Err(GenError::ShapeConflict(addr)),
            };
            map.insert(segment.clone(), merged);
        }
        Ok(Self {
            inner: Arc::new(map),
        })
    }

    /// Keep the leaves for which `keep` holds, pruning branches left empty
    pub fn retain<F>(&self, keep: &F) -> Self
    where
        F: Fn(&Address, &V) -> bool,
    {
        self.retain_at(&Address::root(), keep)
    }

    fn retain_at<F>(&self, prefix: &Address, keep: &F) -> Self
    where
        F: Fn(&Address, &V) -> bool,
    {
        let mut map = BTreeMap::new();
        for (segment, node) in self.inner.iter() {
            let addr = prefix.child(segment.clone());
            match node {
                Node::Leaf(v) if keep(&addr, v) => {
                    map.insert(segment.clone(), Node::Leaf(v.clone()));
                }
                Node::Leaf(_) => {}
                Node::Branch(t) => {
                    let sub = t.retain_at(&addr, keep);
                    if !sub.is_empty() {
                        map.insert(segment.clone(), Node::Branch(sub));
                    }
                }
            }
        }
        Self {
            inner: Arc::new(map),
        }
    }

    /// Apply `f` to every leaf, preserving structure
    pub fn map<U, F>(&self, f: &F) -> Trie<U>
    where
        F: Fn(&V) -> U,
    {
        let map = self
            .inner
            .iter()
            .map(|(segment, node)| {
                let node = match node {
                    Node::Leaf(v) => Node::Leaf(f(v)),
                    Node::Branch(t) => Node::Branch(t.map(f)),
                };
                (segment.clone(), node)
            })
            .collect();
        Trie {
            inner: Arc::new(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;

    #[test]
    fn test_insert_and_lookup() {
        let trie = Trie::new()
            .insert(&address!("x"), 1)
            .unwrap()
            .insert(&address!("m3", "p"), 2)
            .unwrap();

        assert_eq!(trie.lookup(&address!("x")), Some(&1));
        assert_eq!(trie.lookup(&address!("m3", "p")), Some(&2));
        assert_eq!(trie.lookup(&address!("m3")), None);
        assert!(trie.subtrie(&address!("m3")).is_some());
        assert_eq!(trie.lookup(&address!("y")), None);
    }

    #[test]
    fn test_insert_is_functional() {
        let original = Trie::new().insert(&address!("a"), 1).unwrap();
        let updated = original.insert(&address!("b"), 2).unwrap();

        assert_eq!(original.lookup(&address!("b")), None);
        assert_eq!(updated.lookup(&address!("a")), Some(&1));
        assert_eq!(updated.lookup(&address!("b")), Some(&2));
    }

    #[test]
    fn test_unmodified_subtrees_are_shared() {
        let original = Trie::new()
            .insert(&address!("left", "x"), 1)
            .unwrap()
            .insert(&address!("right", "y"), 2)
            .unwrap();
        let updated = original.insert(&address!("right", "z"), 3).unwrap();

        let before = original.subtrie(&address!("left")).unwrap();
        let after = updated.subtrie(&address!("left")).unwrap();
        assert!(Arc::ptr_eq(&before.inner, &after.inner));
    }

    #[test]
    fn test_leaf_overwrite_allowed() {
        let trie = Trie::new().insert(&address!("a"), 1).unwrap();
        let trie = trie.insert(&address!("a"), 5).unwrap();
        assert_eq!(trie.lookup(&address!("a")), Some(&5));
    }

    #[test]
    fn test_shape_conflicts() {
        let trie = Trie::new().insert(&address!("a", "b"), 1).unwrap();

        // Leaf over a subtree
        assert_eq!(
            trie.insert(&address!("a"), 2),
            Err(GenError::ShapeConflict(address!("a")))
        );
        // Path through a leaf
        assert_eq!(
            trie.insert(&address!("a", "b", "c"), 3),
            Err(GenError::ShapeConflict(address!("a", "b")))
        );
        // Empty path
        assert_eq!(
            trie.insert(&Address::root(), 4),
            Err(GenError::ShapeConflict(Address::root()))
        );
    }

    #[test]
    fn test_is_occupied() {
        let trie = Trie::new().insert(&address!("a", "b"), 1).unwrap();
        assert!(trie.is_occupied(&address!("a")));
        assert!(trie.is_occupied(&address!("a", "b")));
        assert!(trie.is_occupied(&address!("a", "b", "c")));
        assert!(!trie.is_occupied(&address!("a", "c")));
        assert!(!trie.is_occupied(&address!("z")));
    }

    #[test]
    fn test_covers() {
        let trie = Trie::new().insert(&address!("m3"), ()).unwrap();
        assert!(trie.covers(&address!("m3")));
        assert!(trie.covers(&address!("m3", "p")));
        assert!(!trie.covers(&address!("m4")));
        assert!(!trie.covers(&Address::root()));
    }

    #[test]
    fn test_insert_subtrie_merges() {
        let sub1 = Trie::new().insert(&address!("p"), 1).unwrap();
        let sub2 = Trie::new().insert(&address!("q"), 2).unwrap();
        let trie = Trie::new()
            .insert_subtrie(&address!("m"), sub1)
            .unwrap()
            .insert_subtrie(&address!("m"), sub2)
            .unwrap();
        assert_eq!(trie.lookup(&address!("m", "p")), Some(&1));
        assert_eq!(trie.lookup(&address!("m", "q")), Some(&2));

        let clash = Trie::new().insert(&address!("p"), 9).unwrap();
        assert_eq!(
            trie.insert_subtrie(&address!("m"), clash),
            Err(GenError::ShapeConflict(address!("m", "p")))
        );
    }

    #[test]
    fn test_leaves_in_order() {
        let trie = Trie::new()
            .insert(&address!("b"), 2)
            .unwrap()
            .insert(&address!("a", "z"), 1)
            .unwrap();
        let leaves: Vec<_> = trie.leaves().into_iter().map(|(a, v)| (a, *v)).collect();
        assert_eq!(leaves, vec![(address!("a", "z"), 1), (address!("b"), 2)]);
    }

    #[test]
    fn test_map() {
        let trie = Trie::new().insert(&address!("a", "b"), 2).unwrap();
        let doubled = trie.map(&|v: &i32| v * 2);
        assert_eq!(doubled.lookup(&address!("a", "b")), Some(&4));
    }
}
