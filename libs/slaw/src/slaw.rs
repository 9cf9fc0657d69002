use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::SlawError;
use crate::numeric::{cmp_seq, ArrayRepr, Numeric, Vector};
use crate::tag::{NumTag, TagRepeater, TagSpec, TypeTag};

// ═══════════════════════════════════════════════════════════════
//  Repr — the closed payload sum type
// ═══════════════════════════════════════════════════════════════

/// Frozen payload of a slaw. Never mutated after the owning `Arc` is
/// created, which is what makes slaw copies cheap and read-safe across
/// threads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Repr {
    Nil,
    Boolean(bool),
    Num(Numeric),
    Str(String),
    Vect(Vector),
    Array(ArrayRepr),
    List(Vec<Slaw>),
    Map(Vec<(Slaw, Slaw)>),
    Cons(Slaw, Slaw),
    Protein(ProteinData),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ProteinData {
    pub(crate) descrips: Slaw,
    pub(crate) ingests: Slaw,
    pub(crate) rude: Vec<u8>,
}

// ═══════════════════════════════════════════════════════════════
//  Slaw
// ═══════════════════════════════════════════════════════════════

/// A self-describing, recursively-typed, immutable value.
///
/// `Slaw` is a cheap handle: cloning shares the frozen payload. All
/// "mutating" operations (list and map algebra) return a new slaw and
/// leave the receiver untouched.
#[derive(Clone)]
pub struct Slaw(pub(crate) Arc<Repr>);

impl Slaw {
    pub(crate) fn from_repr(repr: Repr) -> Slaw {
        Slaw(Arc::new(repr))
    }

    pub(crate) fn repr(&self) -> &Repr {
        &self.0
    }

    // ── constructors ────────────────────────────────────────────

    pub fn nil() -> Slaw {
        Slaw::from_repr(Repr::Nil)
    }

    /// Build a list from anything convertible to slawx.
    pub fn list<I, T>(items: I) -> Slaw
    where
        I: IntoIterator<Item = T>,
        T: Into<Slaw>,
    {
        Slaw::from_repr(Repr::List(items.into_iter().map(Into::into).collect()))
    }

    /// Build an ordered map. Duplicate keys resolve last-wins (the later
    /// value replaces the earlier one, at the earlier key's position) and
    /// are reported through a `tracing` warning.
    pub fn map<I, K, V>(pairs: I) -> Slaw
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Slaw>,
        V: Into<Slaw>,
    {
        let mut out: Vec<(Slaw, Slaw)> = Vec::new();
        for (k, v) in pairs {
            let (k, v) = (k.into(), v.into());
            match out.iter_mut().find(|(ek, _)| *ek == k) {
                Some(entry) => {
                    tracing::warn!(key = %k, "duplicate map key, last value wins");
                    entry.1 = v;
                }
                None => out.push((k, v)),
            }
        }
        Slaw::from_repr(Repr::Map(out))
    }

    /// Like [`Slaw::map`], but a duplicate key is an error instead of a
    /// replacement.
    pub fn map_strict<I, K, V>(pairs: I) -> Result<Slaw, SlawError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Slaw>,
        V: Into<Slaw>,
    {
        let mut out: Vec<(Slaw, Slaw)> = Vec::new();
        for (k, v) in pairs {
            let (k, v) = (k.into(), v.into());
            if out.iter().any(|(ek, _)| *ek == k) {
                return Err(SlawError::DuplicateMapKey(k.to_string()));
            }
            out.push((k, v));
        }
        Ok(Slaw::from_repr(Repr::Map(out)))
    }

    pub fn cons(car: impl Into<Slaw>, cdr: impl Into<Slaw>) -> Slaw {
        Slaw::from_repr(Repr::Cons(car.into(), cdr.into()))
    }

    /// Fixed-arity numeric vector; the element tag is taken from the
    /// native component type.
    pub fn vector<T>(parts: &[T]) -> Result<Slaw, SlawError>
    where
        T: Into<Numeric> + Copy,
    {
        let parts: Vec<Numeric> = parts.iter().map(|p| (*p).into()).collect();
        let elem = parts
            .first()
            .map(Numeric::tag)
            .ok_or(SlawError::ArgumentCountMismatch {
                op: "vector",
                expected: "2 to 4",
                actual: 0,
            })?;
        Ok(Slaw::from_repr(Repr::Vect(Vector::new(elem, parts)?)))
    }

    /// Homogeneous numeric array; the element tag is taken from the
    /// native element type.
    pub fn array<I, T>(items: I) -> Slaw
    where
        I: IntoIterator<Item = T>,
        T: Into<Numeric>,
    {
        let items: Vec<Numeric> = items.into_iter().map(Into::into).collect();
        let elem = items.first().map_or(NumTag::Int64, Numeric::tag);
        Slaw::from_repr(Repr::Array(ArrayRepr::Numeric { elem, items }))
    }

    /// Empty numeric array with an explicit element tag (the tag cannot be
    /// inferred from zero elements).
    pub fn empty_array(elem: NumTag) -> Slaw {
        Slaw::from_repr(Repr::Array(ArrayRepr::Numeric {
            elem,
            items: Vec::new(),
        }))
    }

    /// Array of vectors; all items must share one arity and element tag.
    pub fn vector_array(items: Vec<Vector>) -> Result<Slaw, SlawError> {
        let first = items.first().ok_or_else(|| {
            SlawError::InvalidTypeTag("empty vector array needs an explicit tag".into())
        })?;
        let (len, elem) = (first.len() as u8, first.elem_tag());
        if let Some(v) = items
            .iter()
            .find(|v| v.len() as u8 != len || v.elem_tag() != elem)
        {
            return Err(SlawError::InvalidTypeTag(format!(
                "array of v{len}{elem} cannot hold a v{}{}",
                v.len(),
                v.elem_tag()
            )));
        }
        Ok(Slaw::from_repr(Repr::Array(ArrayRepr::Vector {
            len,
            elem,
            items,
        })))
    }

    /// Protein envelope. Descrips and ingests tolerate any slaw variant;
    /// a list and a map are merely the conventional shapes.
    pub fn protein(descrips: Slaw, ingests: Slaw, rude: Vec<u8>) -> Slaw {
        Slaw::from_repr(Repr::Protein(ProteinData {
            descrips,
            ingests,
            rude,
        }))
    }

    // ── dynamic construction ────────────────────────────────────

    /// Construct from a dynamic JSON value, optionally under an explicit
    /// tag. With no tag, the type is inferred by the fixed priority:
    /// float → float64, integer → int64, string → string, bool → boolean,
    /// null → nil, object → map, array → list.
    pub fn from_value(v: &serde_json::Value, tag: Option<&TagSpec>) -> Result<Slaw, SlawError> {
        match tag {
            None => Slaw::infer(v),
            Some(TagSpec::One(t)) => Slaw::with_tag(v, *t),
            Some(TagSpec::PerElement(tags)) => {
                let serde_json::Value::Array(items) = v else {
                    return Err(SlawError::InvalidTypeTag(
                        "a per-element tag sequence requires a list value".into(),
                    ));
                };
                let mut repeater = TagRepeater::new(tags);
                let elems = items
                    .iter()
                    .map(|item| match repeater.next_tag() {
                        Some(t) => Slaw::with_tag(item, t),
                        None => Slaw::infer(item),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Slaw::from_repr(Repr::List(elems)))
            }
        }
    }

    fn infer(v: &serde_json::Value) -> Result<Slaw, SlawError> {
        Ok(match v {
            serde_json::Value::Null => Slaw::nil(),
            serde_json::Value::Bool(b) => Slaw::from(*b),
            serde_json::Value::Number(n) => {
                let num = if let Some(f) = n.as_f64().filter(|_| n.is_f64()) {
                    Numeric::Float64(f)
                } else if let Some(i) = n.as_i64() {
                    Numeric::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    // above i64::MAX; the only lossless integer home
                    Numeric::Unt64(u)
                } else {
                    return Err(SlawError::UnrepresentableValue(n.to_string()));
                };
                Slaw::from_repr(Repr::Num(num))
            }
            serde_json::Value::String(s) => Slaw::from(s.as_str()),
            serde_json::Value::Array(items) => {
                let elems = items
                    .iter()
                    .map(Slaw::infer)
                    .collect::<Result<Vec<_>, _>>()?;
                Slaw::from_repr(Repr::List(elems))
            }
            serde_json::Value::Object(entries) => {
                let pairs = entries
                    .iter()
                    .map(|(k, v)| Ok((Slaw::from(k.as_str()), Slaw::infer(v)?)))
                    .collect::<Result<Vec<_>, SlawError>>()?;
                Slaw::map(pairs)
            }
        })
    }

    pub(crate) fn with_tag(v: &serde_json::Value, tag: TypeTag) -> Result<Slaw, SlawError> {
        let mismatch = || SlawError::InvalidTypeTag(format!("value {v} does not fit tag {tag}"));
        match tag {
            TypeTag::Nil => match v {
                serde_json::Value::Null => Ok(Slaw::nil()),
                _ => Err(mismatch()),
            },
            TypeTag::Boolean => match v {
                serde_json::Value::Bool(b) => Ok(Slaw::from(*b)),
                _ => Err(mismatch()),
            },
            TypeTag::String => match v {
                serde_json::Value::String(s) => Ok(Slaw::from(s.as_str())),
                // scalars stringify, as the original did
                serde_json::Value::Number(_) | serde_json::Value::Bool(_) => {
                    Ok(Slaw::from(v.to_string()))
                }
                _ => Err(mismatch()),
            },
            TypeTag::Num(nt) => match v {
                serde_json::Value::Number(n) => Ok(Slaw::from_repr(Repr::Num(
                    Numeric::from_json_number(nt, n)?,
                ))),
                _ => Err(mismatch()),
            },
            TypeTag::Vect { len, elem } => {
                let items = as_number_seq(v).ok_or_else(mismatch)?;
                if items.len() != len as usize {
                    return Err(SlawError::ArgumentCountMismatch {
                        op: "vector",
                        expected: vect_arity_name(len),
                        actual: items.len(),
                    });
                }
                let parts = items
                    .iter()
                    .map(|n| Numeric::from_json_number(elem, n))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Slaw::from_repr(Repr::Vect(Vector::new(elem, parts)?)))
            }
            TypeTag::NumArray(nt) => {
                let items = as_number_seq(v).ok_or_else(mismatch)?;
                let items = items
                    .iter()
                    .map(|n| Numeric::from_json_number(nt, n))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Slaw::from_repr(Repr::Array(ArrayRepr::Numeric {
                    elem: nt,
                    items,
                })))
            }
            TypeTag::VectArray { len, elem } => {
                let serde_json::Value::Array(rows) = v else {
                    return Err(mismatch());
                };
                let items = rows
                    .iter()
                    .map(|row| {
                        let vect = Slaw::with_tag(row, TypeTag::Vect { len, elem })?;
                        match Arc::unwrap_or_clone(vect.0) {
                            Repr::Vect(vec) => Ok(vec),
                            _ => unreachable!("vect tag produced a non-vect"),
                        }
                    })
                    .collect::<Result<Vec<_>, SlawError>>()?;
                if items.is_empty() {
                    return Ok(Slaw::from_repr(Repr::Array(ArrayRepr::Vector {
                        len,
                        elem,
                        items,
                    })));
                }
                Slaw::vector_array(items)
            }
            TypeTag::List => match v {
                serde_json::Value::Array(items) => {
                    let elems = items
                        .iter()
                        .map(Slaw::infer)
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Slaw::from_repr(Repr::List(elems)))
                }
                _ => Err(mismatch()),
            },
            TypeTag::Map => match v {
                serde_json::Value::Object(_) => Slaw::infer(v),
                // flat [k1, v1, k2, v2, ...] form
                serde_json::Value::Array(items) => {
                    if items.len() % 2 != 0 {
                        return Err(SlawError::ArgumentCountMismatch {
                            op: "map",
                            expected: "an even number of",
                            actual: items.len(),
                        });
                    }
                    let pairs = items
                        .chunks_exact(2)
                        .map(|kv| Ok((Slaw::infer(&kv[0])?, Slaw::infer(&kv[1])?)))
                        .collect::<Result<Vec<_>, SlawError>>()?;
                    Ok(Slaw::map(pairs))
                }
                _ => Err(mismatch()),
            },
            TypeTag::Cons => match v {
                serde_json::Value::Array(items) if items.len() == 2 => Ok(Slaw::cons(
                    Slaw::infer(&items[0])?,
                    Slaw::infer(&items[1])?,
                )),
                serde_json::Value::Array(items) => Err(SlawError::ArgumentCountMismatch {
                    op: "cons",
                    expected: "exactly 2",
                    actual: items.len(),
                }),
                _ => Err(mismatch()),
            },
            TypeTag::Protein => Err(SlawError::InvalidTypeTag(
                "proteins are constructed from explicit descrips and ingests".into(),
            )),
        }
    }

    // ── introspection ───────────────────────────────────────────

    pub fn type_tag(&self) -> TypeTag {
        match self.repr() {
            Repr::Nil => TypeTag::Nil,
            Repr::Boolean(_) => TypeTag::Boolean,
            Repr::Num(n) => TypeTag::Num(n.tag()),
            Repr::Str(_) => TypeTag::String,
            Repr::Vect(v) => TypeTag::Vect {
                len: v.len() as u8,
                elem: v.elem_tag(),
            },
            Repr::Array(ArrayRepr::Numeric { elem, .. }) => TypeTag::NumArray(*elem),
            Repr::Array(ArrayRepr::Vector { len, elem, .. }) => TypeTag::VectArray {
                len: *len,
                elem: *elem,
            },
            Repr::List(_) => TypeTag::List,
            Repr::Map(_) => TypeTag::Map,
            Repr::Cons(..) => TypeTag::Cons,
            Repr::Protein(_) => TypeTag::Protein,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.repr(), Repr::Nil)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.repr(), Repr::Boolean(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.repr(),
            Repr::Num(_) | Repr::Vect(_) | Repr::Array(_)
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self.repr(), Repr::Str(_))
    }

    pub fn is_vect(&self) -> bool {
        matches!(self.repr(), Repr::Vect(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.repr(), Repr::Array(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.repr(), Repr::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self.repr(), Repr::Map(_))
    }

    pub fn is_cons(&self) -> bool {
        matches!(self.repr(), Repr::Cons(..))
    }

    pub fn is_protein(&self) -> bool {
        matches!(self.repr(), Repr::Protein(_))
    }

    pub fn is_composite(&self) -> bool {
        self.is_list() || self.is_map() || self.is_cons() || self.is_protein()
    }

    pub fn is_atomic(&self) -> bool {
        !self.is_array() && !self.is_vect() && !self.is_composite()
    }

    /// 1 for atomics, 2 for a cons, the element count for vectors, arrays,
    /// lists and maps.
    pub fn count(&self) -> usize {
        match self.repr() {
            Repr::Nil | Repr::Boolean(_) | Repr::Num(_) | Repr::Str(_) | Repr::Protein(_) => 1,
            Repr::Vect(v) => v.len(),
            Repr::Array(a) => a.len(),
            Repr::List(items) => items.len(),
            Repr::Map(pairs) => pairs.len(),
            Repr::Cons(..) => 2,
        }
    }

    // ── element access ──────────────────────────────────────────

    /// The nth element of a list, or the nth key/value pair of a map (as a
    /// cons). Negative indices count from the end.
    pub fn nth(&self, n: i64) -> Result<Slaw, SlawError> {
        let len = match self.repr() {
            Repr::List(items) => items.len(),
            Repr::Map(pairs) => pairs.len(),
            _ => return Err(SlawError::wrong_type("nth", "list or map")),
        };
        let idx = normalize_index(n, len)
            .ok_or_else(|| SlawError::out_of_range("nth", n, len))?;
        Ok(match self.repr() {
            Repr::List(items) => items[idx].clone(),
            Repr::Map(pairs) => {
                let (k, v) = &pairs[idx];
                Slaw::cons(k.clone(), v.clone())
            }
            _ => unreachable!(),
        })
    }

    /// Map lookup by slaw equality. `Ok(None)` when the key is absent.
    pub fn find(&self, key: &Slaw) -> Result<Option<Slaw>, SlawError> {
        let Repr::Map(pairs) = self.repr() else {
            return Err(SlawError::wrong_type("find", "map"));
        };
        Ok(pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    pub fn keys(&self) -> Result<Vec<Slaw>, SlawError> {
        let Repr::Map(pairs) = self.repr() else {
            return Err(SlawError::wrong_type("keys", "map"));
        };
        Ok(pairs.iter().map(|(k, _)| k.clone()).collect())
    }

    pub fn values(&self) -> Result<Vec<Slaw>, SlawError> {
        let Repr::Map(pairs) = self.repr() else {
            return Err(SlawError::wrong_type("values", "map"));
        };
        Ok(pairs.iter().map(|(_, v)| v.clone()).collect())
    }

    pub fn car(&self) -> Result<Slaw, SlawError> {
        match self.repr() {
            Repr::Cons(car, _) => Ok(car.clone()),
            _ => Err(SlawError::wrong_type("car", "cons")),
        }
    }

    pub fn cdr(&self) -> Result<Slaw, SlawError> {
        match self.repr() {
            Repr::Cons(_, cdr) => Ok(cdr.clone()),
            _ => Err(SlawError::wrong_type("cdr", "cons")),
        }
    }

    pub fn descrips(&self) -> Result<Slaw, SlawError> {
        match self.repr() {
            Repr::Protein(p) => Ok(p.descrips.clone()),
            _ => Err(SlawError::wrong_type("descrips", "protein")),
        }
    }

    pub fn ingests(&self) -> Result<Slaw, SlawError> {
        match self.repr() {
            Repr::Protein(p) => Ok(p.ingests.clone()),
            _ => Err(SlawError::wrong_type("ingests", "protein")),
        }
    }

    pub fn rude_data(&self) -> Result<&[u8], SlawError> {
        match self.repr() {
            Repr::Protein(p) => Ok(&p.rude),
            _ => Err(SlawError::wrong_type("rude_data", "protein")),
        }
    }

    /// Raw bytes of an int8/unt8 array, or a protein's rude data.
    pub fn emit_binary(&self) -> Result<Vec<u8>, SlawError> {
        match self.repr() {
            Repr::Array(ArrayRepr::Numeric { elem: NumTag::Unt8, items }) => Ok(items
                .iter()
                .map(|n| match n {
                    Numeric::Unt8(b) => *b,
                    _ => unreachable!("unt8 array holds unt8"),
                })
                .collect()),
            Repr::Array(ArrayRepr::Numeric { elem: NumTag::Int8, items }) => Ok(items
                .iter()
                .map(|n| match n {
                    Numeric::Int8(b) => *b as u8,
                    _ => unreachable!("int8 array holds int8"),
                })
                .collect()),
            Repr::Protein(p) => Ok(p.rude.clone()),
            _ => Err(SlawError::wrong_type(
                "emit_binary",
                "int8 array, unt8 array, or protein",
            )),
        }
    }

    // ── native accessors ────────────────────────────────────────

    pub fn as_str(&self) -> Option<&str> {
        match self.repr() {
            Repr::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.repr() {
            Repr::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.repr() {
            Repr::Num(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.repr() {
            Repr::Num(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.repr() {
            Repr::Num(n) => Some(n.as_f64()),
            _ => None,
        }
    }
}

fn as_number_seq(v: &serde_json::Value) -> Option<Vec<&serde_json::Number>> {
    let serde_json::Value::Array(items) = v else {
        return None;
    };
    items.iter().map(serde_json::Value::as_number).collect()
}

pub(crate) fn normalize_index(n: i64, len: usize) -> Option<usize> {
    let idx = if n < 0 { n + len as i64 } else { n };
    if idx < 0 || idx >= len as i64 {
        None
    } else {
        Some(idx as usize)
    }
}

pub(crate) fn vect_arity_name(len: u8) -> &'static str {
    match len {
        2 => "exactly 2",
        3 => "exactly 3",
        _ => "exactly 4",
    }
}

// ═══════════════════════════════════════════════════════════════
//  Equality, ordering, hashing
// ═══════════════════════════════════════════════════════════════

impl PartialEq for Slaw {
    fn eq(&self, other: &Slaw) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.repr() == other.repr()
    }
}

impl Eq for Slaw {}

impl Hash for Slaw {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.repr().hash(state);
    }
}

impl Ord for Slaw {
    /// Total order over all variants: variant rank first, then payload.
    /// Exact cross-variant positions are an implementation detail; the
    /// contract is consistency and transitivity, so sorting heterogeneous
    /// lists is deterministic under input permutation.
    fn cmp(&self, other: &Slaw) -> Ordering {
        fn rank(r: &Repr) -> u8 {
            match r {
                Repr::Nil => 0,
                Repr::Boolean(_) => 1,
                Repr::Num(_) => 2,
                Repr::Str(_) => 3,
                Repr::Vect(_) => 4,
                Repr::Array(_) => 5,
                Repr::List(_) => 6,
                Repr::Map(_) => 7,
                Repr::Cons(..) => 8,
                Repr::Protein(_) => 9,
            }
        }
        let (a, b) = (self.repr(), other.repr());
        rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
            (Repr::Nil, Repr::Nil) => Ordering::Equal,
            (Repr::Boolean(x), Repr::Boolean(y)) => x.cmp(y),
            (Repr::Num(x), Repr::Num(y)) => x.total_cmp(y),
            (Repr::Str(x), Repr::Str(y)) => x.cmp(y),
            (Repr::Vect(x), Repr::Vect(y)) => x.total_cmp(y),
            (Repr::Array(x), Repr::Array(y)) => x.total_cmp(y),
            (Repr::List(x), Repr::List(y)) => cmp_seq(x, y, Slaw::cmp),
            (Repr::Map(x), Repr::Map(y)) => cmp_seq(x, y, |(ka, va), (kb, vb)| {
                ka.cmp(kb).then_with(|| va.cmp(vb))
            }),
            (Repr::Cons(xa, xd), Repr::Cons(ya, yd)) => xa.cmp(ya).then_with(|| xd.cmp(yd)),
            (Repr::Protein(x), Repr::Protein(y)) => x
                .descrips
                .cmp(&y.descrips)
                .then_with(|| x.ingests.cmp(&y.ingests))
                .then_with(|| x.rude.cmp(&y.rude)),
            _ => unreachable!("equal ranks imply equal variants"),
        })
    }
}

impl PartialOrd for Slaw {
    fn partial_cmp(&self, other: &Slaw) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Polymorphic comparisons against bare natives: magnitude/content only,
// regardless of the slaw's declared width. Composite variants (including
// protein and cons) never equal a bare native.

impl PartialEq<i64> for Slaw {
    fn eq(&self, other: &i64) -> bool {
        matches!(self.repr(), Repr::Num(n) if n.magnitude_eq_i64(*other))
    }
}

impl PartialEq<i32> for Slaw {
    fn eq(&self, other: &i32) -> bool {
        *self == *other as i64
    }
}

impl PartialEq<u64> for Slaw {
    fn eq(&self, other: &u64) -> bool {
        matches!(self.repr(), Repr::Num(n) if n.magnitude_eq_u64(*other))
    }
}

impl PartialEq<f64> for Slaw {
    fn eq(&self, other: &f64) -> bool {
        matches!(self.repr(), Repr::Num(n) if n.magnitude_eq_f64(*other))
    }
}

impl PartialEq<bool> for Slaw {
    fn eq(&self, other: &bool) -> bool {
        matches!(self.repr(), Repr::Boolean(b) if b == other)
    }
}

impl PartialEq<&str> for Slaw {
    fn eq(&self, other: &&str) -> bool {
        matches!(self.repr(), Repr::Str(s) if s == other)
    }
}

impl PartialEq<str> for Slaw {
    fn eq(&self, other: &str) -> bool {
        matches!(self.repr(), Repr::Str(s) if s == other)
    }
}

impl PartialEq<String> for Slaw {
    fn eq(&self, other: &String) -> bool {
        *self == other.as_str()
    }
}

// ═══════════════════════════════════════════════════════════════
//  From impls for native values
// ═══════════════════════════════════════════════════════════════

macro_rules! slaw_from_numeric {
    ($($native:ty),* $(,)?) => {
        $(impl From<$native> for Slaw {
            fn from(v: $native) -> Slaw {
                Slaw::from_repr(Repr::Num(Numeric::from(v)))
            }
        })*
    };
}

slaw_from_numeric!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl From<Numeric> for Slaw {
    fn from(v: Numeric) -> Slaw {
        Slaw::from_repr(Repr::Num(v))
    }
}

impl From<Vector> for Slaw {
    fn from(v: Vector) -> Slaw {
        Slaw::from_repr(Repr::Vect(v))
    }
}

impl From<bool> for Slaw {
    fn from(v: bool) -> Slaw {
        Slaw::from_repr(Repr::Boolean(v))
    }
}

impl From<&str> for Slaw {
    fn from(v: &str) -> Slaw {
        Slaw::from_repr(Repr::Str(v.to_string()))
    }
}

impl From<String> for Slaw {
    fn from(v: String) -> Slaw {
        Slaw::from_repr(Repr::Str(v))
    }
}

impl From<()> for Slaw {
    fn from(_: ()) -> Slaw {
        Slaw::nil()
    }
}

impl From<Vec<Slaw>> for Slaw {
    fn from(items: Vec<Slaw>) -> Slaw {
        Slaw::from_repr(Repr::List(items))
    }
}

impl std::fmt::Debug for Slaw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.repr().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_fixed_at_construction() {
        assert_eq!(Slaw::from(5i8).type_tag(), TypeTag::Num(NumTag::Int8));
        assert_eq!(Slaw::from(5u32).type_tag(), TypeTag::Num(NumTag::Unt32));
        assert_eq!(Slaw::from(1.5f32).type_tag(), TypeTag::Num(NumTag::Float32));
        assert_eq!(Slaw::from("hi").type_tag(), TypeTag::String);
        assert_eq!(Slaw::nil().type_tag(), TypeTag::Nil);
    }

    #[test]
    fn width_matters_between_slawx_but_not_against_natives() {
        let narrow = Slaw::from(5i8);
        let wide = Slaw::from(5i64);
        assert_ne!(narrow, wide);
        assert_eq!(narrow, 5i64);
        assert_eq!(wide, 5i64);
        assert_eq!(Slaw::from(2.5f32), 2.5f64);
    }

    #[test]
    fn copies_share_the_frozen_payload() {
        let a = Slaw::list([1i64, 2, 3]);
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, b);
    }

    #[test]
    fn map_preserves_insertion_order() {
        let m = Slaw::map([("one", 1i64), ("two", 2), ("three", 3), ("four", 4)]);
        assert_eq!(m.count(), 4);
        assert_eq!(m.nth(0).unwrap().car().unwrap(), "one");
        assert_eq!(m.nth(-1).unwrap().car().unwrap(), "four");
        assert_eq!(m.nth(1).unwrap().cdr().unwrap(), 2i64);
    }

    #[test]
    fn duplicate_keys_last_wins_in_place() {
        let m = Slaw::map([("a", 1i64), ("b", 2), ("a", 3)]);
        assert_eq!(m.count(), 2);
        assert_eq!(m.nth(0).unwrap().car().unwrap(), "a");
        assert_eq!(m.nth(0).unwrap().cdr().unwrap(), 3i64);
    }

    #[test]
    fn strict_map_rejects_duplicates() {
        let err = Slaw::map_strict([("a", 1i64), ("a", 2)]).unwrap_err();
        assert!(matches!(err, SlawError::DuplicateMapKey(_)));
    }

    #[test]
    fn wrong_variant_access_is_invalid_operand() {
        assert!(matches!(
            Slaw::from(5i64).car(),
            Err(SlawError::InvalidOperand(_))
        ));
        assert!(matches!(
            Slaw::list([1i64]).find(&Slaw::from(1i64)),
            Err(SlawError::InvalidOperand(_))
        ));
        assert!(matches!(
            Slaw::from("x").emit_binary(),
            Err(SlawError::InvalidOperand(_))
        ));
    }

    #[test]
    fn negative_nth_counts_from_end() {
        let l = Slaw::list([10i64, 20, 30]);
        assert_eq!(l.nth(-1).unwrap(), 30i64);
        assert_eq!(l.nth(-3).unwrap(), 10i64);
        assert!(l.nth(3).is_err());
        assert!(l.nth(-4).is_err());
    }

    #[test]
    fn inference_priority() {
        let v = serde_json::json!({"f": 1.0, "i": 2, "s": "x", "b": true, "n": null});
        let m = Slaw::from_value(&v, None).unwrap();
        let get = |k: &str| {
            m.find(&Slaw::from(k)).unwrap().unwrap().type_tag()
        };
        assert_eq!(get("f"), TypeTag::Num(NumTag::Float64));
        assert_eq!(get("i"), TypeTag::Num(NumTag::Int64));
        assert_eq!(get("s"), TypeTag::String);
        assert_eq!(get("b"), TypeTag::Boolean);
        assert_eq!(get("n"), TypeTag::Nil);
    }

    #[test]
    fn tagged_list_construction_assigns_successive_tags() {
        let spec = TagSpec::parse_seq(&["int8", "float32", "list"]).unwrap();
        let v = serde_json::json!([1, 2.5, 3, "tail"]);
        let l = Slaw::from_value(&v, Some(&spec)).unwrap();
        assert_eq!(l.nth(0).unwrap().type_tag(), TypeTag::Num(NumTag::Int8));
        assert_eq!(l.nth(1).unwrap().type_tag(), TypeTag::Num(NumTag::Float32));
        // trailing `list` tag means "infer"
        assert_eq!(l.nth(2).unwrap().type_tag(), TypeTag::Num(NumTag::Int64));
        assert_eq!(l.nth(3).unwrap().type_tag(), TypeTag::String);
    }

    #[test]
    fn cons_needs_exactly_two() {
        let v = serde_json::json!([1, 2, 3]);
        assert!(matches!(
            Slaw::from_value(&v, Some(&TagSpec::One(TypeTag::Cons))),
            Err(SlawError::ArgumentCountMismatch { .. })
        ));
    }

    #[test]
    fn emit_binary_on_byte_arrays() {
        let a = Slaw::array([1u8, 2, 255]);
        assert_eq!(a.emit_binary().unwrap(), vec![1, 2, 255]);
        let b = Slaw::array([-1i8, 2]);
        assert_eq!(b.emit_binary().unwrap(), vec![255, 2]);
    }

    #[test]
    fn sort_is_total_and_deterministic() {
        let mut a = vec![
            Slaw::from("b"),
            Slaw::nil(),
            Slaw::from(2i64),
            Slaw::list([1i64]),
            Slaw::from(true),
            Slaw::from("a"),
            Slaw::from(1.5f64),
        ];
        let mut b = a.clone();
        b.reverse();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
}
