use crate::numeric::{ArrayRepr, Numeric};
use crate::slaw::{Repr, Slaw};

// ═══════════════════════════════════════════════════════════════
//  Emitted — native projection of a slaw
// ═══════════════════════════════════════════════════════════════

/// The native-value projection produced by [`Slaw::emit`].
///
/// Numerics widen to the largest native of their class, so the emitted
/// form deliberately forgets declared widths. Proteins and conses do not
/// project; they come back as slaw handles so their own accessors stay
/// available.
#[derive(Debug, Clone, PartialEq)]
pub enum Emitted {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Seq(Vec<Emitted>),
    Map(Vec<(Emitted, Emitted)>),
    Slaw(Slaw),
}

impl Emitted {
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Emitted::Int(i) => Some(i),
            Emitted::Uint(u) => i64::try_from(u).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Emitted::Int(i) => Some(i as f64),
            Emitted::Uint(u) => Some(u as f64),
            Emitted::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Emitted::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_slaw(&self) -> Option<&Slaw> {
        match self {
            Emitted::Slaw(s) => Some(s),
            _ => None,
        }
    }
}

fn emit_numeric(n: &Numeric) -> Emitted {
    match *n {
        Numeric::Int8(v) => Emitted::Int(v as i64),
        Numeric::Int16(v) => Emitted::Int(v as i64),
        Numeric::Int32(v) => Emitted::Int(v as i64),
        Numeric::Int64(v) => Emitted::Int(v),
        Numeric::Unt8(v) => Emitted::Uint(v as u64),
        Numeric::Unt16(v) => Emitted::Uint(v as u64),
        Numeric::Unt32(v) => Emitted::Uint(v as u64),
        Numeric::Unt64(v) => Emitted::Uint(v),
        Numeric::Float32(v) => Emitted::Float(v as f64),
        Numeric::Float64(v) => Emitted::Float(v),
    }
}

impl Slaw {
    /// Project to native values, recursing through lists, maps, vectors
    /// and arrays. Proteins and conses stay as slaw handles.
    pub fn emit(&self) -> Emitted {
        match self.repr() {
            Repr::Nil => Emitted::Nil,
            Repr::Boolean(b) => Emitted::Bool(*b),
            Repr::Num(n) => emit_numeric(n),
            Repr::Str(s) => Emitted::Str(s.clone()),
            Repr::Vect(v) => Emitted::Seq(v.parts().iter().map(emit_numeric).collect()),
            Repr::Array(ArrayRepr::Numeric { items, .. }) => {
                Emitted::Seq(items.iter().map(emit_numeric).collect())
            }
            Repr::Array(ArrayRepr::Vector { items, .. }) => Emitted::Seq(
                items
                    .iter()
                    .map(|v| Emitted::Seq(v.parts().iter().map(emit_numeric).collect()))
                    .collect(),
            ),
            Repr::List(items) => Emitted::Seq(items.iter().map(Slaw::emit).collect()),
            Repr::Map(pairs) => Emitted::Map(
                pairs
                    .iter()
                    .map(|(k, v)| (k.emit(), v.emit()))
                    .collect(),
            ),
            Repr::Cons(..) | Repr::Protein(_) => Emitted::Slaw(self.clone()),
        }
    }
}

// Native comparisons mirror the slaw-side polymorphic equality, which keeps
// assertions on emitted values readable.

impl PartialEq<i64> for Emitted {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl PartialEq<u64> for Emitted {
    fn eq(&self, other: &u64) -> bool {
        match *self {
            Emitted::Uint(u) => u == *other,
            Emitted::Int(i) => u64::try_from(i) == Ok(*other),
            _ => false,
        }
    }
}

impl PartialEq<f64> for Emitted {
    fn eq(&self, other: &f64) -> bool {
        matches!(*self, Emitted::Float(f) if f == *other)
    }
}

impl PartialEq<bool> for Emitted {
    fn eq(&self, other: &bool) -> bool {
        matches!(*self, Emitted::Bool(b) if b == *other)
    }
}

impl PartialEq<&str> for Emitted {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, Emitted::Str(s) if s == other)
    }
}
