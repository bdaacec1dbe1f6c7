//! Invertible renaming of addresses

use crate::datatypes::address::Address;
use crate::datatypes::choice_map::ChoiceMap;
use crate::error::{GenError, GenResult};

/// A one-to-one renaming from inner addresses to outer addresses.
///
/// Each entry renames a prefix: the inner address `a/x` under an entry
/// `a -> b` becomes `b/x`. Addresses under no entry pass through unchanged.
/// Neither side may contain an address that is a prefix of another entry
/// on the same side, so every address is renamed by at most one entry and
/// the renaming can be undone.
#[derive(Clone, Debug, PartialEq)]
pub struct AddressBijection {
    pairs: Vec<(Address, Address)>,
}

impl AddressBijection {
    /// Build from `(inner, outer)` pairs
    pub fn new<I, A, B>(pairs: I) -> GenResult<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<Address>,
        B: Into<Address>,
    {
        let pairs: Vec<(Address, Address)> = pairs
            .into_iter()
            .map(|(inner, outer)| (inner.into(), outer.into()))
            .collect();

        for (i, (inner, outer)) in pairs.iter().enumerate() {
            if inner.is_empty() || outer.is_empty() {
                return Err(GenError::InvalidParameter(
                    "address bijection cannot rename the root".to_string(),
                ));
            }
            for (other_inner, other_outer) in &pairs[i + 1..] {
                if overlaps(inner, other_inner) {
                    return Err(GenError::InvalidParameter(format!(
                        "inner addresses {} and {} overlap",
                        inner, other_inner
                    )));
                }
                if overlaps(outer, other_outer) {
                    return Err(GenError::InvalidParameter(format!(
                        "outer addresses {} and {} overlap",
                        outer, other_outer
                    )));
                }
            }
        }
        Ok(Self { pairs })
    }

    /// The same renaming in the other direction
    pub fn inverse(&self) -> Self {
        Self {
            pairs: self
                .pairs
                .iter()
                .map(|(inner, outer)| (outer.clone(), inner.clone()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Rename an inner address outward; `None` if a pass-through address
    /// lands on the image of a renamed one
    pub fn forward(&self, addr: &Address) -> Option<Address> {
        let renamed = rename(self.pairs.iter().map(|(from, to)| (from, to)), addr);
        let back = rename(self.pairs.iter().map(|(to, from)| (from, to)), &renamed);
        (back == *addr).then_some(renamed)
    }

    /// Rename an outer address inward; `None` if it is not the image of any
    /// inner address
    pub fn backward(&self, addr: &Address) -> Option<Address> {
        let renamed = rename(self.pairs.iter().map(|(to, from)| (from, to)), addr);
        let back = rename(self.pairs.iter().map(|(from, to)| (from, to)), &renamed);
        (back == *addr).then_some(renamed)
    }

    /// Rename every address of an inner choice map outward. An address with
    /// no image is a `ShapeConflict`: the inner function uses an address the
    /// renaming gives to another.
    pub fn forward_choices(&self, choices: &ChoiceMap) -> GenResult<ChoiceMap> {
        rename_choices(choices, |addr| {
            self.forward(addr)
                .ok_or_else(|| GenError::ShapeConflict(addr.clone()))
        })
    }

    /// Rename every address of an outer choice map inward. An address with no
    /// preimage cannot be reached and is `AddressNotFound`.
    pub fn backward_choices(&self, choices: &ChoiceMap) -> GenResult<ChoiceMap> {
        rename_choices(choices, |addr| {
            self.backward(addr)
                .ok_or_else(|| GenError::AddressNotFound(addr.clone()))
        })
    }
}

fn overlaps(a: &Address, b: &Address) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

fn rename<'a, I>(mut pairs: I, addr: &Address) -> Address
where
    I: Iterator<Item = (&'a Address, &'a Address)>,
{
    match pairs.find(|(from, _)| addr.starts_with(from)) {
        Some((from, to)) => to.join(&Address::new(addr.segments()[from.len()..].to_vec())),
        None => addr.clone(),
    }
}

fn rename_choices<F>(choices: &ChoiceMap, f: F) -> GenResult<ChoiceMap>
where
    F: Fn(&Address) -> GenResult<Address>,
{
    choices
        .leaves()
        .into_iter()
        .try_fold(ChoiceMap::Empty, |out, (addr, value)| out.insert(f(&addr)?, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;
    use crate::datatypes::value::Value;

    fn swap() -> AddressBijection {
        AddressBijection::new([(address!("x"), address!("y")), (address!("y"), address!("x"))])
            .unwrap()
    }

    #[test]
    fn test_renames_prefixes() {
        let b = AddressBijection::new([(address!("a"), address!("outer", "b"))]).unwrap();
        assert_eq!(b.forward(&address!("a", "x")), Some(address!("outer", "b", "x")));
        assert_eq!(b.backward(&address!("outer", "b", "x")), Some(address!("a", "x")));
        assert_eq!(b.forward(&address!("c")), Some(address!("c")));
        assert_eq!(b.backward(&address!("outer")), Some(address!("outer")));
    }

    #[test]
    fn test_swap_round_trips() {
        let b = swap();
        for addr in [address!("x"), address!("y"), address!("z", 1usize)] {
            assert_eq!(b.forward(&addr).and_then(|out| b.backward(&out)), Some(addr));
        }
        assert_eq!(b.inverse().forward(&address!("x")), b.backward(&address!("x")));
    }

    #[test]
    fn test_rejects_overlapping_entries() {
        let err = AddressBijection::new([(address!("a"), address!("b")), (address!("a", "x"), address!("c"))])
            .unwrap_err();
        assert!(matches!(err, GenError::InvalidParameter(_)));

        let err = AddressBijection::new([(address!("a"), address!("b")), (address!("c"), address!("b"))])
            .unwrap_err();
        assert!(matches!(err, GenError::InvalidParameter(_)));

        assert!(AddressBijection::new([(Address::root(), address!("b"))]).is_err());
    }

    #[test]
    fn test_rename_choices() {
        let choices = ChoiceMap::from_pairs([
            (address!("x"), Value::real(1.0)),
            (address!("y"), Value::real(2.0)),
        ])
        .unwrap();
        let swapped = swap().forward_choices(&choices).unwrap();
        assert_eq!(swapped.get(&address!("x")), Some(&Value::real(2.0)));
        assert_eq!(swapped.get(&address!("y")), Some(&Value::real(1.0)));

        // Root values have no address to rename
        let root = ChoiceMap::value(true);
        assert_eq!(swap().forward_choices(&root).unwrap(), root);
    }

    #[test]
    fn test_pass_through_collision() {
        let b = AddressBijection::new([(address!("a"), address!("b"))]).unwrap();
        // Inner "b" would land where inner "a" is renamed to
        assert_eq!(b.forward(&address!("b")), None);
        let choices = ChoiceMap::from_pairs([(address!("a"), true), (address!("b"), false)]).unwrap();
        let err = b.forward_choices(&choices).unwrap_err();
        assert_eq!(err, GenError::ShapeConflict(address!("b")));

        // Outer "a" is the image of nothing
        assert_eq!(b.backward(&address!("a")), None);
        let outer = ChoiceMap::from_pairs([(address!("a"), true)]).unwrap();
        let err = b.backward_choices(&outer).unwrap_err();
        assert_eq!(err, GenError::AddressNotFound(address!("a")));
    }
}
