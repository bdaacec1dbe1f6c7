//! Choice maps
//!
//! A choice map records values of random choices by address. Primitive
//! distributions own a single value at the root; composite generative
//! functions own a trie of values. Choice maps are immutable: every update
//! returns a new map sharing structure with the old one.

use serde::{Deserialize, Serialize};

use crate::datatypes::address::Address;
use crate::datatypes::selection::Selection;
use crate::datatypes::trie::{Node, Trie};
use crate::datatypes::value::Value;
use crate::error::{GenError, GenResult};

/// Hierarchical record of random-choice values
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(Address, Value)>", into = "Vec<(Address, Value)>")]
pub enum ChoiceMap {
    /// No choices
    #[default]
    Empty,
    /// A single value at the root address
    Value(Value),
    /// Values at nested addresses
    Static(Trie<Value>),
}

impl ChoiceMap {
    pub fn empty() -> Self {
        ChoiceMap::Empty
    }

    /// A map holding a single value at the root
    pub fn value(v: impl Into<Value>) -> Self {
        ChoiceMap::Value(v.into())
    }

    /// Build a map from address/value pairs
    pub fn from_pairs<I, A, V>(pairs: I) -> GenResult<Self>
    where
        I: IntoIterator<Item = (A, V)>,
        A: Into<Address>,
        V: Into<Value>,
    {
        pairs
            .into_iter()
            .try_fold(ChoiceMap::Empty, |map, (addr, v)| map.insert(addr, v))
    }

    fn from_trie(trie: Trie<Value>) -> Self {
        if trie.is_empty() {
            ChoiceMap::Empty
        } else {
            ChoiceMap::Static(trie)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ChoiceMap::Empty => true,
            ChoiceMap::Value(_) => false,
            ChoiceMap::Static(trie) => trie.is_empty(),
        }
    }

    /// The value at the root, if this map holds a single value
    pub fn get_value(&self) -> Option<&Value> {
        match self {
            ChoiceMap::Value(v) => Some(v),
            _ => None,
        }
    }

    /// The part of the map rooted at `addr`; empty if nothing is there
    pub fn get_submap(&self, addr: &Address) -> ChoiceMap {
        if addr.is_empty() {
            return self.clone();
        }
        match self {
            ChoiceMap::Static(trie) => match trie.get(addr) {
                Some(Node::Leaf(v)) => ChoiceMap::Value(v.clone()),
                Some(Node::Branch(sub)) => ChoiceMap::Static(sub.clone()),
                None => ChoiceMap::Empty,
            },
            _ => ChoiceMap::Empty,
        }
    }

    /// The value stored exactly at `addr`
    pub fn get(&self, addr: &Address) -> Option<&Value> {
        if addr.is_empty() {
            return self.get_value();
        }
        match self {
            ChoiceMap::Static(trie) => trie.lookup(addr),
            _ => None,
        }
    }

    pub fn has_value(&self, addr: &Address) -> bool {
        self.get(addr).is_some()
    }

    /// Returns true if anything is stored at or below `addr`
    pub fn has_submap(&self, addr: &Address) -> bool {
        !self.get_submap(addr).is_empty()
    }

    /// Functional insert: a new map with `v` at `addr`.
    ///
    /// Fails with `ShapeConflict` when `addr` holds a nested map or passes
    /// through a value.
    pub fn insert(&self, addr: impl Into<Address>, v: impl Into<Value>) -> GenResult<ChoiceMap> {
        let addr = addr.into();
        let v = v.into();
        match (self, addr.is_empty()) {
            (ChoiceMap::Empty | ChoiceMap::Value(_), true) => Ok(ChoiceMap::Value(v)),
            (ChoiceMap::Empty, false) => Ok(ChoiceMap::Static(Trie::new().insert(&addr, v)?)),
            (ChoiceMap::Static(trie), false) => Ok(ChoiceMap::Static(trie.insert(&addr, v)?)),
            (ChoiceMap::Static(_), true) | (ChoiceMap::Value(_), false) => {
                Err(GenError::ShapeConflict(Address::root()))
            }
        }
    }

    /// Functional replacement of an existing value
    pub fn replace(&self, addr: impl Into<Address>, v: impl Into<Value>) -> GenResult<ChoiceMap> {
        let addr = addr.into();
        if !self.has_value(&addr) {
            return Err(GenError::AddressNotFound(addr));
        }
        self.insert(addr, v)
    }

    /// Functional insert of a whole sub-map at `addr`
    pub fn insert_submap(&self, addr: &Address, submap: &ChoiceMap) -> GenResult<ChoiceMap> {
        if addr.is_empty() {
            return self.merge(submap);
        }
        match submap {
            ChoiceMap::Empty => Ok(self.clone()),
            ChoiceMap::Value(v) => self.insert(addr.clone(), v.clone()),
            ChoiceMap::Static(sub) => match self {
                ChoiceMap::Empty => Ok(ChoiceMap::from_trie(
                    Trie::new().insert_subtrie(addr, sub.clone())?,
                )),
                ChoiceMap::Static(trie) => Ok(ChoiceMap::from_trie(
                    trie.insert_subtrie(addr, sub.clone())?,
                )),
                ChoiceMap::Value(_) => Err(GenError::ShapeConflict(Address::root())),
            },
        }
    }

    /// Disjoint union; overlapping values are a `ShapeConflict`
    pub fn merge(&self, other: &ChoiceMap) -> GenResult<ChoiceMap> {
        match (self, other) {
            (map, ChoiceMap::Empty) | (ChoiceMap::Empty, map) => Ok(map.clone()),
            (ChoiceMap::Static(a), ChoiceMap::Static(b)) => Ok(ChoiceMap::from_trie(a.merge(b)?)),
            _ => Err(GenError::ShapeConflict(Address::root())),
        }
    }

    /// Restrict to the addresses `selection` includes
    pub fn filter(&self, selection: &Selection) -> ChoiceMap {
        match self {
            ChoiceMap::Empty => ChoiceMap::Empty,
            ChoiceMap::Value(_) if selection.check() => self.clone(),
            ChoiceMap::Value(_) => ChoiceMap::Empty,
            ChoiceMap::Static(trie) => {
                ChoiceMap::from_trie(trie.retain(&|addr: &Address, _: &Value| selection.includes(addr)))
            }
        }
    }

    /// The selection of every address holding a value
    pub fn get_selection(&self) -> Selection {
        match self {
            ChoiceMap::Empty => Selection::None,
            ChoiceMap::Value(_) => Selection::All,
            ChoiceMap::Static(trie) => Selection::Static(trie.map(&|_: &Value| ())),
        }
    }

    /// Every value with its full address, in address order
    pub fn leaves(&self) -> Vec<(Address, Value)> {
        match self {
            ChoiceMap::Empty => Vec::new(),
            ChoiceMap::Value(v) => vec![(Address::root(), v.clone())],
            ChoiceMap::Static(trie) => trie
                .leaves()
                .into_iter()
                .map(|(addr, v)| (addr, v.clone()))
                .collect(),
        }
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.leaves().into_iter().map(|(addr, _)| addr).collect()
    }

    /// Number of values in the map
    pub fn len(&self) -> usize {
        match self {
            ChoiceMap::Empty => 0,
            ChoiceMap::Value(_) => 1,
            ChoiceMap::Static(trie) => trie.leaves().len(),
        }
    }
}

impl TryFrom<Vec<(Address, Value)>> for ChoiceMap {
    type Error = GenError;

    fn try_from(pairs: Vec<(Address, Value)>) -> GenResult<Self> {
        ChoiceMap::from_pairs(pairs)
    }
}

impl From<ChoiceMap> for Vec<(Address, Value)> {
    fn from(map: ChoiceMap) -> Self {
        map.leaves()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;

    fn sample_map() -> ChoiceMap {
        ChoiceMap::from_pairs(vec![
            (address!("m1"), Value::Bool(true)),
            (address!("m2"), Value::Bool(false)),
            (address!("m3", "p"), Value::real(0.25)),
        ])
        .unwrap()
    }

    #[test]
    fn test_get_and_submap() {
        let chm = sample_map();
        assert_eq!(chm.get(&address!("m1")), Some(&Value::Bool(true)));
        assert_eq!(chm.get(&address!("m3", "p")), Some(&Value::real(0.25)));
        assert_eq!(chm.get(&address!("m3")), None);
        assert!(chm.has_submap(&address!("m3")));

        let sub = chm.get_submap(&address!("m3"));
        assert_eq!(sub.get(&address!("p")), Some(&Value::real(0.25)));
        assert_eq!(
            chm.get_submap(&address!("m1")).get_value(),
            Some(&Value::Bool(true))
        );
        assert!(chm.get_submap(&address!("nope")).is_empty());
    }

    #[test]
    fn test_insert_is_functional() {
        let chm = sample_map();
        let updated = chm.insert("m4", 3i64).unwrap();
        assert!(!chm.has_value(&address!("m4")));
        assert_eq!(updated.get(&address!("m4")), Some(&Value::Int(3)));
        assert_eq!(updated.len(), 4);
    }

    #[test]
    fn test_insert_shape_conflict() {
        let chm = sample_map();
        assert_eq!(
            chm.insert("m3", 1.0),
            Err(GenError::ShapeConflict(address!("m3")))
        );
        assert_eq!(
            ChoiceMap::value(true).insert("x", 1.0),
            Err(GenError::ShapeConflict(Address::root()))
        );
    }

    #[test]
    fn test_replace_requires_existing_value() {
        let chm = sample_map();
        let replaced = chm.replace("m1", false).unwrap();
        assert_eq!(replaced.get(&address!("m1")), Some(&Value::Bool(false)));
        assert_eq!(
            chm.replace("zz", false),
            Err(GenError::AddressNotFound(address!("zz")))
        );
    }

    #[test]
    fn test_filter() {
        let chm = sample_map();
        let filtered = chm.filter(&Selection::at("m1"));
        assert_eq!(filtered.addresses(), vec![address!("m1")]);

        let rest = chm.filter(&Selection::at("m1").complement());
        assert_eq!(rest.addresses(), vec![address!("m2"), address!("m3", "p")]);

        assert!(chm.filter(&Selection::none()).is_empty());
        assert_eq!(chm.filter(&Selection::all()), chm);
    }

    #[test]
    fn test_filter_root_value() {
        let chm = ChoiceMap::value(1.5);
        assert_eq!(chm.filter(&Selection::all()), chm);
        assert!(chm.filter(&Selection::at("x")).is_empty());
    }

    #[test]
    fn test_insert_submap_and_merge() {
        let inner = ChoiceMap::from_pairs(vec![("p", 1.0), ("q", 2.0)]).unwrap();
        let outer = ChoiceMap::empty()
            .insert_submap(&address!("m"), &inner)
            .unwrap()
            .insert_submap(&address!("v"), &ChoiceMap::value(true))
            .unwrap();
        assert_eq!(outer.get(&address!("m", "q")), Some(&Value::real(2.0)));
        assert_eq!(outer.get(&address!("v")), Some(&Value::Bool(true)));

        let other = ChoiceMap::from_pairs(vec![("w", 0i64)]).unwrap();
        let merged = outer.merge(&other).unwrap();
        assert_eq!(merged.len(), 4);
        assert!(outer.merge(&outer).is_err());
    }

    #[test]
    fn test_get_selection_round_trip() {
        let chm = sample_map();
        let sel = chm.get_selection();
        assert_eq!(chm.filter(&sel), chm);
        assert!(sel.includes(&address!("m3", "p")));
        assert!(!sel.includes(&address!("m4")));
    }

    #[test]
    fn test_serde_round_trip() {
        let chm = sample_map();
        let json = serde_json::to_string(&chm).unwrap();
        let back: ChoiceMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chm);
    }
}
