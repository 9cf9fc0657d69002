use std::ops::Range;

use crate::error::SlawError;
use crate::slaw::{Repr, Slaw};

// ═══════════════════════════════════════════════════════════════
//  List algebra
// ═══════════════════════════════════════════════════════════════

/// Normalize a possibly-negative index pair into a half-open range clamped
/// to `len`. Negative indices count from the end; anything still out of
/// bounds after normalization clamps rather than errors, so every range is
/// valid and an inverted range is empty.
fn clamped(start: i64, end: i64, len: usize) -> Range<usize> {
    let norm = |i: i64| if i < 0 { i + len as i64 } else { i };
    let s = norm(start).clamp(0, len as i64) as usize;
    let e = norm(end).clamp(0, len as i64) as usize;
    s..e.max(s)
}

/// One piece of a splice: either a clamped range of an existing list, or a
/// single fresh element.
enum Piece<'a> {
    Range(&'a [Slaw], i64, i64),
    One(Slaw),
}

/// The single primitive every list edit reduces to: concatenate ranges of
/// existing lists and fresh elements into a new list.
fn splice(pieces: Vec<Piece<'_>>) -> Slaw {
    let mut out = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Range(src, start, end) => {
                out.extend_from_slice(&src[clamped(start, end, src.len())]);
            }
            Piece::One(s) => out.push(s),
        }
    }
    Slaw::from_repr(Repr::List(out))
}

impl Slaw {
    fn elems(&self, op: &str) -> Result<&[Slaw], SlawError> {
        match self.repr() {
            Repr::List(items) => Ok(items),
            _ => Err(SlawError::wrong_type(op, "list")),
        }
    }

    fn pairs(&self, op: &str) -> Result<&[(Slaw, Slaw)], SlawError> {
        match self.repr() {
            Repr::Map(pairs) => Ok(pairs),
            _ => Err(SlawError::wrong_type(op, "map")),
        }
    }

    /// New list with `item` appended.
    pub fn list_append(&self, item: impl Into<Slaw>) -> Result<Slaw, SlawError> {
        let items = self.elems("list_append")?;
        Ok(splice(vec![
            Piece::Range(items, 0, items.len() as i64),
            Piece::One(item.into()),
        ]))
    }

    /// New list with `item` prepended.
    pub fn list_prepend(&self, item: impl Into<Slaw>) -> Result<Slaw, SlawError> {
        let items = self.elems("list_prepend")?;
        Ok(splice(vec![
            Piece::One(item.into()),
            Piece::Range(items, 0, items.len() as i64),
        ]))
    }

    /// New list with all of `items` inserted in order, the first landing
    /// at position `index`. Positions normalize and clamp as in
    /// [`Slaw::list_insert`].
    pub fn list_insert_all<I, T>(&self, index: i64, items: I) -> Result<Slaw, SlawError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Slaw>,
    {
        let own = self.elems("list_insert_all")?;
        let len = own.len() as i64;
        let mut pieces = vec![Piece::Range(own, 0, index)];
        pieces.extend(items.into_iter().map(|i| Piece::One(i.into())));
        pieces.push(Piece::Range(
            own,
            if index < 0 { index.max(-len) } else { index },
            len,
        ));
        Ok(splice(pieces))
    }

    /// New list with `item` inserted so it lands at position `index`.
    /// Negative indices count from the end; positions beyond either end
    /// clamp to the nearer end.
    pub fn list_insert(&self, index: i64, item: impl Into<Slaw>) -> Result<Slaw, SlawError> {
        let items = self.elems("list_insert")?;
        let len = items.len() as i64;
        Ok(splice(vec![
            Piece::Range(items, 0, index),
            Piece::One(item.into()),
            Piece::Range(items, if index < 0 { index.max(-len) } else { index }, len),
        ]))
    }

    /// New list without the elements from `start` through `end`, both
    /// inclusive. Indices normalize and clamp like everywhere else, so a
    /// range that misses the list entirely removes nothing.
    pub fn list_remove(&self, start: i64, end: i64) -> Result<Slaw, SlawError> {
        let items = self.elems("list_remove")?;
        let len = items.len() as i64;
        let norm = |i: i64| if i < 0 { i + len } else { i };
        let s = norm(start).clamp(0, len);
        let e = norm(end).saturating_add(1).clamp(0, len).max(s);
        Ok(splice(vec![
            Piece::Range(items, 0, s),
            Piece::Range(items, e, len),
        ]))
    }

    /// New list holding this list's elements followed by `other`'s.
    pub fn list_concat(&self, other: &Slaw) -> Result<Slaw, SlawError> {
        let a = self.elems("list_concat")?;
        let b = other.elems("list_concat")?;
        Ok(splice(vec![
            Piece::Range(a, 0, a.len() as i64),
            Piece::Range(b, 0, b.len() as i64),
        ]))
    }

    /// Flat concatenation of any number of lists. Zero lists yield the
    /// empty list; a non-list argument is an invalid operand.
    pub fn concat(lists: &[Slaw]) -> Result<Slaw, SlawError> {
        let mut pieces = Vec::with_capacity(lists.len());
        for l in lists {
            let items = l.elems("concat")?;
            pieces.push(Piece::Range(items, 0, items.len() as i64));
        }
        Ok(splice(pieces))
    }

    // ═══════════════════════════════════════════════════════════
    //  Map algebra
    // ═══════════════════════════════════════════════════════════

    /// New map with `key` bound to `value`. An existing key keeps its
    /// position and takes the new value; a new key appends.
    pub fn map_put(
        &self,
        key: impl Into<Slaw>,
        value: impl Into<Slaw>,
    ) -> Result<Slaw, SlawError> {
        let pairs = self.pairs("map_put")?;
        let (key, value) = (key.into(), value.into());
        let mut out = pairs.to_vec();
        match out.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => out.push((key, value)),
        }
        Ok(Slaw::from_repr(Repr::Map(out)))
    }

    /// New map without `key`. Removing an absent key is a no-op.
    pub fn map_remove(&self, key: &Slaw) -> Result<Slaw, SlawError> {
        let pairs = self.pairs("map_remove")?;
        let out = pairs
            .iter()
            .filter(|(k, _)| k != key)
            .cloned()
            .collect();
        Ok(Slaw::from_repr(Repr::Map(out)))
    }

    /// Merge two maps. `other`'s bindings win on key collision, but a
    /// colliding key keeps the position of its first appearance in `self`.
    pub fn merge(&self, other: &Slaw) -> Result<Slaw, SlawError> {
        Slaw::merge_maps(&[self.clone(), other.clone()])
    }

    /// Merge any number of maps, later bindings winning for shared keys
    /// at their first appearance's position. Zero maps yield the empty
    /// map; a non-map argument is an invalid operand.
    pub fn merge_maps(maps: &[Slaw]) -> Result<Slaw, SlawError> {
        let mut out: Vec<(Slaw, Slaw)> = Vec::new();
        for m in maps {
            for (k, v) in m.pairs("merge")? {
                match out.iter_mut().find(|(ek, _)| ek == k) {
                    Some(entry) => entry.1 = v.clone(),
                    None => out.push((k.clone(), v.clone())),
                }
            }
        }
        Ok(Slaw::from_repr(Repr::Map(out)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l(items: &[i64]) -> Slaw {
        Slaw::list(items.iter().copied())
    }

    #[test]
    fn append_prepend_insert() {
        let base = l(&[1, 2, 3]);
        assert_eq!(base.list_append(4i64).unwrap(), l(&[1, 2, 3, 4]));
        assert_eq!(base.list_prepend(0i64).unwrap(), l(&[0, 1, 2, 3]));
        assert_eq!(base.list_insert(1, 9i64).unwrap(), l(&[1, 9, 2, 3]));
        // receiver untouched
        assert_eq!(base, l(&[1, 2, 3]));
    }

    #[test]
    fn insert_clamps_out_of_range_positions() {
        let base = l(&[1, 2]);
        assert_eq!(base.list_insert(99, 9i64).unwrap(), l(&[1, 2, 9]));
        assert_eq!(base.list_insert(-99, 9i64).unwrap(), l(&[9, 1, 2]));
        // -1 inserts before the final element
        assert_eq!(base.list_insert(-1, 9i64).unwrap(), l(&[1, 9, 2]));
    }

    #[test]
    fn remove_is_inclusive_and_clamped() {
        let base = l(&[1, 2, 3, 4, 5]);
        assert_eq!(base.list_remove(1, 3).unwrap(), l(&[1, 5]));
        assert_eq!(base.list_remove(0, 0).unwrap(), l(&[2, 3, 4, 5]));
        assert_eq!(base.list_remove(-2, -1).unwrap(), l(&[1, 2, 3]));
        assert_eq!(base.list_remove(10, 20).unwrap(), base);
        assert_eq!(base.list_remove(3, 1).unwrap(), base);
        assert_eq!(base.list_remove(0, 99).unwrap(), l(&[]));
    }

    #[test]
    fn concat_and_empty_identities() {
        let base = l(&[1, 2]);
        let empty = l(&[]);
        assert_eq!(base.list_concat(&l(&[3, 4])).unwrap(), l(&[1, 2, 3, 4]));
        assert_eq!(base.list_concat(&empty).unwrap(), base);
        assert_eq!(empty.list_concat(&base).unwrap(), base);
    }

    #[test]
    fn insert_all_lands_in_order() {
        let base = l(&[1, 4]);
        assert_eq!(
            base.list_insert_all(1, [2i64, 3]).unwrap(),
            l(&[1, 2, 3, 4])
        );
        assert_eq!(
            base.list_insert_all(99, [9i64]).unwrap(),
            l(&[1, 4, 9])
        );
    }

    #[test]
    fn concat_flattens_regardless_of_empties() {
        let (a, b, e) = (l(&[1]), l(&[2, 3]), l(&[]));
        assert_eq!(
            Slaw::concat(&[a.clone(), e.clone(), b.clone(), e.clone()]).unwrap(),
            l(&[1, 2, 3])
        );
        assert_eq!(Slaw::concat(&[]).unwrap(), l(&[]));
        assert!(matches!(
            Slaw::concat(&[a, Slaw::from(1i64)]),
            Err(SlawError::InvalidOperand(_))
        ));
    }

    #[test]
    fn merge_maps_variadic() {
        assert_eq!(
            Slaw::merge_maps(&[]).unwrap(),
            Slaw::map::<[(&str, i64); 0], _, _>([])
        );
        let m1 = Slaw::map([("a", 1i64), ("b", 2)]);
        let m2 = Slaw::map([("b", 20i64), ("c", 3)]);
        let m3 = Slaw::map([("c", 30i64)]);
        let merged = Slaw::merge_maps(&[m1, m2, m3]).unwrap();
        assert_eq!(merged.count(), 3);
        assert_eq!(merged.nth(1).unwrap(), Slaw::cons("b", 20i64));
        assert_eq!(merged.nth(2).unwrap(), Slaw::cons("c", 30i64));
        assert!(matches!(
            Slaw::merge_maps(&[Slaw::from(1i64)]),
            Err(SlawError::InvalidOperand(_))
        ));
    }

    #[test]
    fn map_put_replaces_in_place_or_appends() {
        let m = Slaw::map([("a", 1i64), ("b", 2)]);
        let replaced = m.map_put("a", 9i64).unwrap();
        assert_eq!(replaced.nth(0).unwrap(), Slaw::cons("a", 9i64));
        assert_eq!(replaced.count(), 2);
        let extended = m.map_put("c", 3i64).unwrap();
        assert_eq!(extended.count(), 3);
        assert_eq!(extended.nth(2).unwrap().car().unwrap(), "c");
    }

    #[test]
    fn map_remove_absent_key_is_noop() {
        let m = Slaw::map([("a", 1i64)]);
        assert_eq!(m.map_remove(&Slaw::from("zz")).unwrap(), m);
        assert_eq!(m.map_remove(&Slaw::from("a")).unwrap().count(), 0);
    }

    #[test]
    fn merge_last_wins_at_first_position() {
        let a = Slaw::map([("x", 1i64), ("y", 2)]);
        let b = Slaw::map([("z", 3i64), ("x", 9)]);
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.count(), 3);
        assert_eq!(merged.nth(0).unwrap(), Slaw::cons("x", 9i64));
        assert_eq!(merged.nth(1).unwrap(), Slaw::cons("y", 2i64));
        assert_eq!(merged.nth(2).unwrap(), Slaw::cons("z", 3i64));
        // inputs untouched
        assert_eq!(a.find(&Slaw::from("x")).unwrap().unwrap(), 1i64);
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let a = Slaw::map([("x", 1i64)]);
        let empty = Slaw::map::<[(&str, i64); 0], _, _>([]);
        assert_eq!(a.merge(&empty).unwrap(), a);
        assert_eq!(empty.merge(&a).unwrap(), a);
    }
}
