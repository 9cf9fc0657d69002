use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::error::SlawError;
use crate::tag::NumTag;

// ═══════════════════════════════════════════════════════════════
//  Numeric — atomic numeric payload
// ═══════════════════════════════════════════════════════════════

/// An atomic numeric with its width/signedness fixed at construction.
///
/// Equality requires equal tag and equal payload (bit-level for floats);
/// magnitude-only comparison against bare native numbers goes through the
/// `magnitude_*` helpers.
#[derive(Debug, Clone, Copy)]
pub enum Numeric {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Unt8(u8),
    Unt16(u16),
    Unt32(u32),
    Unt64(u64),
    Float32(f32),
    Float64(f64),
}

impl Numeric {
    pub fn tag(&self) -> NumTag {
        match self {
            Numeric::Int8(_) => NumTag::Int8,
            Numeric::Int16(_) => NumTag::Int16,
            Numeric::Int32(_) => NumTag::Int32,
            Numeric::Int64(_) => NumTag::Int64,
            Numeric::Unt8(_) => NumTag::Unt8,
            Numeric::Unt16(_) => NumTag::Unt16,
            Numeric::Unt32(_) => NumTag::Unt32,
            Numeric::Unt64(_) => NumTag::Unt64,
            Numeric::Float32(_) => NumTag::Float32,
            Numeric::Float64(_) => NumTag::Float64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Numeric::Int8(v) => v as f64,
            Numeric::Int16(v) => v as f64,
            Numeric::Int32(v) => v as f64,
            Numeric::Int64(v) => v as f64,
            Numeric::Unt8(v) => v as f64,
            Numeric::Unt16(v) => v as f64,
            Numeric::Unt32(v) => v as f64,
            Numeric::Unt64(v) => v as f64,
            Numeric::Float32(v) => v as f64,
            Numeric::Float64(v) => v,
        }
    }

    /// Exact integer value, `None` for floats.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Numeric::Int8(v) => Some(v as i128),
            Numeric::Int16(v) => Some(v as i128),
            Numeric::Int32(v) => Some(v as i128),
            Numeric::Int64(v) => Some(v as i128),
            Numeric::Unt8(v) => Some(v as i128),
            Numeric::Unt16(v) => Some(v as i128),
            Numeric::Unt32(v) => Some(v as i128),
            Numeric::Unt64(v) => Some(v as i128),
            Numeric::Float32(_) | Numeric::Float64(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|v| u64::try_from(v).ok())
    }

    /// Construct from a JSON number under an explicit target tag.
    /// A number that does not fit the tag is `UnrepresentableValue`.
    pub fn from_json_number(tag: NumTag, n: &serde_json::Number) -> Result<Numeric, SlawError> {
        let unrep = || SlawError::UnrepresentableValue(format!("{n} as {tag}"));
        if tag.is_float() {
            let v = n.as_f64().ok_or_else(unrep)?;
            return Ok(match tag {
                NumTag::Float32 => Numeric::Float32(v as f32),
                _ => Numeric::Float64(v),
            });
        }
        // Integer tags reject fractional input rather than truncating.
        let wide: i128 = if let Some(v) = n.as_i64() {
            v as i128
        } else if let Some(v) = n.as_u64() {
            v as i128
        } else {
            return Err(unrep());
        };
        let fits = |v: i128| -> Result<Numeric, SlawError> {
            Ok(match tag {
                NumTag::Int8 => Numeric::Int8(i8::try_from(v).map_err(|_| unrep())?),
                NumTag::Int16 => Numeric::Int16(i16::try_from(v).map_err(|_| unrep())?),
                NumTag::Int32 => Numeric::Int32(i32::try_from(v).map_err(|_| unrep())?),
                NumTag::Int64 => Numeric::Int64(i64::try_from(v).map_err(|_| unrep())?),
                NumTag::Unt8 => Numeric::Unt8(u8::try_from(v).map_err(|_| unrep())?),
                NumTag::Unt16 => Numeric::Unt16(u16::try_from(v).map_err(|_| unrep())?),
                NumTag::Unt32 => Numeric::Unt32(u32::try_from(v).map_err(|_| unrep())?),
                NumTag::Unt64 => Numeric::Unt64(u64::try_from(v).map_err(|_| unrep())?),
                NumTag::Float32 | NumTag::Float64 => unreachable!(),
            })
        };
        fits(wide)
    }

    pub fn to_json_number(&self) -> serde_json::Value {
        match *self {
            Numeric::Int8(v) => v.into(),
            Numeric::Int16(v) => v.into(),
            Numeric::Int32(v) => v.into(),
            Numeric::Int64(v) => v.into(),
            Numeric::Unt8(v) => v.into(),
            Numeric::Unt16(v) => v.into(),
            Numeric::Unt32(v) => v.into(),
            Numeric::Unt64(v) => v.into(),
            Numeric::Float32(v) => serde_json::Value::from(v as f64),
            Numeric::Float64(v) => serde_json::Value::from(v),
        }
    }

    /// Magnitude comparison against a bare signed integer.
    pub fn magnitude_eq_i64(&self, v: i64) -> bool {
        match self.as_i128() {
            Some(i) => i == v as i128,
            None => self.as_f64() == v as f64,
        }
    }

    /// Magnitude comparison against a bare unsigned integer.
    pub fn magnitude_eq_u64(&self, v: u64) -> bool {
        match self.as_i128() {
            Some(i) => i == v as i128,
            None => self.as_f64() == v as f64,
        }
    }

    /// Magnitude comparison against a bare float.
    pub fn magnitude_eq_f64(&self, v: f64) -> bool {
        self.as_f64() == v
    }

    /// Total order across all numerics: magnitude first, then tag rank,
    /// then exact same-tag payload (which disambiguates integers that
    /// collapse to the same f64).
    pub fn total_cmp(&self, other: &Numeric) -> Ordering {
        self.as_f64()
            .total_cmp(&other.as_f64())
            .then_with(|| self.tag().rank().cmp(&other.tag().rank()))
            .then_with(|| self.same_tag_cmp(other))
    }

    fn same_tag_cmp(&self, other: &Numeric) -> Ordering {
        use Numeric::*;
        match (*self, *other) {
            (Int8(a), Int8(b)) => a.cmp(&b),
            (Int16(a), Int16(b)) => a.cmp(&b),
            (Int32(a), Int32(b)) => a.cmp(&b),
            (Int64(a), Int64(b)) => a.cmp(&b),
            (Unt8(a), Unt8(b)) => a.cmp(&b),
            (Unt16(a), Unt16(b)) => a.cmp(&b),
            (Unt32(a), Unt32(b)) => a.cmp(&b),
            (Unt64(a), Unt64(b)) => a.cmp(&b),
            (Float32(a), Float32(b)) => a.total_cmp(&b),
            (Float64(a), Float64(b)) => a.total_cmp(&b),
            _ => Ordering::Equal,
        }
    }
}

impl PartialEq for Numeric {
    fn eq(&self, other: &Numeric) -> bool {
        use Numeric::*;
        match (*self, *other) {
            (Int8(a), Int8(b)) => a == b,
            (Int16(a), Int16(b)) => a == b,
            (Int32(a), Int32(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (Unt8(a), Unt8(b)) => a == b,
            (Unt16(a), Unt16(b)) => a == b,
            (Unt32(a), Unt32(b)) => a == b,
            (Unt64(a), Unt64(b)) => a == b,
            (Float32(a), Float32(b)) => a.to_bits() == b.to_bits(),
            (Float64(a), Float64(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Numeric {}

impl Hash for Numeric {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().rank().hash(state);
        match *self {
            Numeric::Int8(v) => v.hash(state),
            Numeric::Int16(v) => v.hash(state),
            Numeric::Int32(v) => v.hash(state),
            Numeric::Int64(v) => v.hash(state),
            Numeric::Unt8(v) => v.hash(state),
            Numeric::Unt16(v) => v.hash(state),
            Numeric::Unt32(v) => v.hash(state),
            Numeric::Unt64(v) => v.hash(state),
            Numeric::Float32(v) => v.to_bits().hash(state),
            Numeric::Float64(v) => v.to_bits().hash(state),
        }
    }
}

macro_rules! numeric_from {
    ($($native:ty => $variant:ident),* $(,)?) => {
        $(impl From<$native> for Numeric {
            fn from(v: $native) -> Numeric {
                Numeric::$variant(v)
            }
        })*
    };
}

numeric_from! {
    i8 => Int8, i16 => Int16, i32 => Int32, i64 => Int64,
    u8 => Unt8, u16 => Unt16, u32 => Unt32, u64 => Unt64,
    f32 => Float32, f64 => Float64,
}

// ═══════════════════════════════════════════════════════════════
//  Vector — fixed-arity homogeneous numeric tuple
// ═══════════════════════════════════════════════════════════════

/// A 2-, 3- or 4-component tuple of one numeric element type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vector {
    elem: NumTag,
    parts: Vec<Numeric>,
}

impl Vector {
    /// Build a vector; checks arity 2..=4 and element-tag homogeneity.
    pub fn new(elem: NumTag, parts: Vec<Numeric>) -> Result<Vector, SlawError> {
        if !(2..=4).contains(&parts.len()) {
            return Err(SlawError::ArgumentCountMismatch {
                op: "vector",
                expected: "2 to 4",
                actual: parts.len(),
            });
        }
        if let Some(p) = parts.iter().find(|p| p.tag() != elem) {
            return Err(SlawError::InvalidTypeTag(format!(
                "vector of {elem} cannot hold a {}",
                p.tag()
            )));
        }
        Ok(Vector { elem, parts })
    }

    pub fn elem_tag(&self) -> NumTag {
        self.elem
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        false // arity is always 2..=4
    }

    pub fn parts(&self) -> &[Numeric] {
        &self.parts
    }

    pub(crate) fn total_cmp(&self, other: &Vector) -> Ordering {
        self.parts
            .len()
            .cmp(&other.parts.len())
            .then_with(|| self.elem.rank().cmp(&other.elem.rank()))
            .then_with(|| {
                for (a, b) in self.parts.iter().zip(&other.parts) {
                    let ord = a.total_cmp(b);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            })
    }
}

// ═══════════════════════════════════════════════════════════════
//  ArrayRepr — homogeneous variable-length array payload
// ═══════════════════════════════════════════════════════════════

/// Array payload: a single numeric element tag, or a single vector shape.
/// Mixed element types are rejected at construction by the `Slaw` array
/// constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayRepr {
    Numeric { elem: NumTag, items: Vec<Numeric> },
    Vector { len: u8, elem: NumTag, items: Vec<Vector> },
}

impl ArrayRepr {
    pub fn len(&self) -> usize {
        match self {
            ArrayRepr::Numeric { items, .. } => items.len(),
            ArrayRepr::Vector { items, .. } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn total_cmp(&self, other: &ArrayRepr) -> Ordering {
        match (self, other) {
            (
                ArrayRepr::Numeric { elem: ea, items: ia },
                ArrayRepr::Numeric { elem: eb, items: ib },
            ) => ea
                .rank()
                .cmp(&eb.rank())
                .then_with(|| cmp_seq(ia, ib, Numeric::total_cmp)),
            (
                ArrayRepr::Vector { len: la, elem: ea, items: ia },
                ArrayRepr::Vector { len: lb, elem: eb, items: ib },
            ) => la
                .cmp(lb)
                .then_with(|| ea.rank().cmp(&eb.rank()))
                .then_with(|| cmp_seq(ia, ib, Vector::total_cmp)),
            (ArrayRepr::Numeric { .. }, ArrayRepr::Vector { .. }) => Ordering::Less,
            (ArrayRepr::Vector { .. }, ArrayRepr::Numeric { .. }) => Ordering::Greater,
        }
    }
}

pub(crate) fn cmp_seq<T>(a: &[T], b: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = cmp(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_requires_matching_tag() {
        assert_ne!(Numeric::Int32(5), Numeric::Int64(5));
        assert_ne!(Numeric::Int8(1), Numeric::Unt8(1));
        assert_eq!(Numeric::Unt16(9), Numeric::Unt16(9));
    }

    #[test]
    fn magnitude_compare_ignores_width() {
        assert!(Numeric::Int8(5).magnitude_eq_i64(5));
        assert!(Numeric::Unt64(5).magnitude_eq_i64(5));
        assert!(Numeric::Float32(2.5).magnitude_eq_f64(2.5));
        assert!(!Numeric::Int8(5).magnitude_eq_i64(6));
    }

    #[test]
    fn total_cmp_orders_by_magnitude_then_tag() {
        assert_eq!(
            Numeric::Int8(1).total_cmp(&Numeric::Int8(2)),
            Ordering::Less
        );
        // equal magnitude, different tags: stable tag-rank order
        assert_eq!(
            Numeric::Int8(1).total_cmp(&Numeric::Unt8(1)),
            Ordering::Less
        );
        assert_eq!(
            Numeric::Float64(0.5).total_cmp(&Numeric::Int64(1)),
            Ordering::Less
        );
    }

    #[test]
    fn vector_arity_enforced() {
        let ok = Vector::new(NumTag::Int32, vec![Numeric::Int32(1), Numeric::Int32(2)]);
        assert!(ok.is_ok());
        let short = Vector::new(NumTag::Int32, vec![Numeric::Int32(1)]);
        assert!(matches!(
            short,
            Err(SlawError::ArgumentCountMismatch { .. })
        ));
        let mixed = Vector::new(
            NumTag::Int32,
            vec![Numeric::Int32(1), Numeric::Float64(2.0)],
        );
        assert!(matches!(mixed, Err(SlawError::InvalidTypeTag(_))));
    }

    #[test]
    fn json_number_respects_target_tag() {
        let n = serde_json::Number::from(300);
        assert!(Numeric::from_json_number(NumTag::Int8, &n).is_err());
        assert_eq!(
            Numeric::from_json_number(NumTag::Int16, &n).unwrap(),
            Numeric::Int16(300)
        );
        let f = serde_json::Number::from_f64(1.5).unwrap();
        assert!(Numeric::from_json_number(NumTag::Int64, &f).is_err());
        assert_eq!(
            Numeric::from_json_number(NumTag::Float64, &f).unwrap(),
            Numeric::Float64(1.5)
        );
    }
}
