use std::fmt;
use std::str::FromStr;

use crate::error::SlawError;

// ═══════════════════════════════════════════════════════════════
//  NumTag — atomic numeric type tags
// ═══════════════════════════════════════════════════════════════

/// Width/signedness tag of an atomic numeric. "unt" is the domain word
/// for unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumTag {
    Int8,
    Int16,
    Int32,
    Int64,
    Unt8,
    Unt16,
    Unt32,
    Unt64,
    Float32,
    Float64,
}

impl NumTag {
    pub const ALL: [NumTag; 10] = [
        NumTag::Int8,
        NumTag::Int16,
        NumTag::Int32,
        NumTag::Int64,
        NumTag::Unt8,
        NumTag::Unt16,
        NumTag::Unt32,
        NumTag::Unt64,
        NumTag::Float32,
        NumTag::Float64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumTag::Int8 => "int8",
            NumTag::Int16 => "int16",
            NumTag::Int32 => "int32",
            NumTag::Int64 => "int64",
            NumTag::Unt8 => "unt8",
            NumTag::Unt16 => "unt16",
            NumTag::Unt32 => "unt32",
            NumTag::Unt64 => "unt64",
            NumTag::Float32 => "float32",
            NumTag::Float64 => "float64",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, NumTag::Float32 | NumTag::Float64)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            NumTag::Int8 | NumTag::Int16 | NumTag::Int32 | NumTag::Int64
        )
    }

    /// Fixed rank used as the ordering tie-break between equal-magnitude
    /// numerics of different tags.
    pub(crate) fn rank(self) -> u8 {
        match self {
            NumTag::Int8 => 0,
            NumTag::Int16 => 1,
            NumTag::Int32 => 2,
            NumTag::Int64 => 3,
            NumTag::Unt8 => 4,
            NumTag::Unt16 => 5,
            NumTag::Unt32 => 6,
            NumTag::Unt64 => 7,
            NumTag::Float32 => 8,
            NumTag::Float64 => 9,
        }
    }

    fn parse(s: &str) -> Option<NumTag> {
        NumTag::ALL.iter().copied().find(|t| t.name() == s)
    }
}

impl fmt::Display for NumTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════
//  TypeTag — full tag taxonomy
// ═══════════════════════════════════════════════════════════════

/// The complete tag vocabulary. Parses from and renders to the textual
/// symbol grammar (`int32`, `unt8_array`, `v3float64`, `v2int32_array`,
/// `list`, `map`, ...), which tagged construction and the JSON codec share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Nil,
    Boolean,
    String,
    Num(NumTag),
    Vect { len: u8, elem: NumTag },
    NumArray(NumTag),
    VectArray { len: u8, elem: NumTag },
    List,
    Map,
    Cons,
    Protein,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TypeTag::Nil => f.write_str("nil"),
            TypeTag::Boolean => f.write_str("boolean"),
            TypeTag::String => f.write_str("string"),
            TypeTag::Num(t) => f.write_str(t.name()),
            TypeTag::Vect { len, elem } => write!(f, "v{len}{elem}"),
            TypeTag::NumArray(t) => write!(f, "{t}_array"),
            TypeTag::VectArray { len, elem } => write!(f, "v{len}{elem}_array"),
            TypeTag::List => f.write_str("list"),
            TypeTag::Map => f.write_str("map"),
            TypeTag::Cons => f.write_str("cons"),
            TypeTag::Protein => f.write_str("protein"),
        }
    }
}

impl FromStr for TypeTag {
    type Err = SlawError;

    fn from_str(s: &str) -> Result<TypeTag, SlawError> {
        let bad = || SlawError::InvalidTypeTag(s.to_string());

        match s {
            "nil" => return Ok(TypeTag::Nil),
            "boolean" => return Ok(TypeTag::Boolean),
            "string" => return Ok(TypeTag::String),
            "list" => return Ok(TypeTag::List),
            "map" => return Ok(TypeTag::Map),
            "cons" => return Ok(TypeTag::Cons),
            "protein" => return Ok(TypeTag::Protein),
            _ => {}
        }
        if let Some(t) = NumTag::parse(s) {
            return Ok(TypeTag::Num(t));
        }
        let (base, array) = match s.strip_suffix("_array") {
            Some(base) => (base, true),
            None => (s, false),
        };
        if array {
            if let Some(t) = NumTag::parse(base) {
                return Ok(TypeTag::NumArray(t));
            }
        }
        // vNtag, N in 2..=4
        if let Some(rest) = base.strip_prefix('v') {
            let mut chars = rest.chars();
            let len = match chars.next() {
                Some(c @ '2'..='4') => c as u8 - b'0',
                _ => return Err(bad()),
            };
            let elem = NumTag::parse(chars.as_str()).ok_or_else(bad)?;
            return Ok(if array {
                TypeTag::VectArray { len, elem }
            } else {
                TypeTag::Vect { len, elem }
            });
        }
        Err(bad())
    }
}

// ═══════════════════════════════════════════════════════════════
//  TagSpec — tag argument shape for tagged construction
// ═══════════════════════════════════════════════════════════════

/// Tag argument of tagged construction: either one tag applied to the whole
/// value, or a tag sequence applied to successive list elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSpec {
    One(TypeTag),
    PerElement(Vec<TypeTag>),
}

impl TagSpec {
    /// Parse a single tag symbol.
    pub fn parse(s: &str) -> Result<TagSpec, SlawError> {
        Ok(TagSpec::One(s.parse()?))
    }

    /// Parse a per-element tag sequence. Rejects the empty sequence — a
    /// tag list must tag something.
    pub fn parse_seq<S: AsRef<str>>(tags: &[S]) -> Result<TagSpec, SlawError> {
        if tags.is_empty() {
            return Err(SlawError::InvalidTypeTag(
                "per-element tag sequence must not be empty".into(),
            ));
        }
        let parsed = tags
            .iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TagSpec::PerElement(parsed))
    }
}

impl From<TypeTag> for TagSpec {
    fn from(t: TypeTag) -> TagSpec {
        TagSpec::One(t)
    }
}

/// Walks a per-element tag sequence; once exhausted, the final tag repeats
/// for every remaining element. A `list` tag stands for "infer".
pub(crate) struct TagRepeater<'a> {
    tags: &'a [TypeTag],
    pos: usize,
}

impl<'a> TagRepeater<'a> {
    pub(crate) fn new(tags: &'a [TypeTag]) -> Self {
        TagRepeater { tags, pos: 0 }
    }

    pub(crate) fn next_tag(&mut self) -> Option<TypeTag> {
        let tag = if self.pos < self.tags.len() {
            let t = self.tags[self.pos];
            self.pos += 1;
            t
        } else {
            *self.tags.last()?
        };
        if tag == TypeTag::List { None } else { Some(tag) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_symbols_round_trip() {
        for s in [
            "nil", "boolean", "string", "int8", "unt64", "float32", "v3float64", "v2int32",
            "int8_array", "unt8_array", "v4float32_array", "list", "map", "cons", "protein",
        ] {
            let tag: TypeTag = s.parse().unwrap();
            assert_eq!(tag.to_string(), s);
        }
    }

    #[test]
    fn bad_tags_rejected() {
        for s in ["", "v5float64", "int7", "v2", "floaty", "map_array", "v1int8"] {
            assert!(matches!(
                s.parse::<TypeTag>(),
                Err(SlawError::InvalidTypeTag(_))
            ));
        }
    }

    #[test]
    fn repeater_repeats_final_tag() {
        let tags = vec![
            TypeTag::Num(NumTag::Int8),
            TypeTag::Num(NumTag::Float32),
        ];
        let mut r = TagRepeater::new(&tags);
        assert_eq!(r.next_tag(), Some(TypeTag::Num(NumTag::Int8)));
        assert_eq!(r.next_tag(), Some(TypeTag::Num(NumTag::Float32)));
        assert_eq!(r.next_tag(), Some(TypeTag::Num(NumTag::Float32)));
        assert_eq!(r.next_tag(), Some(TypeTag::Num(NumTag::Float32)));
    }

    #[test]
    fn list_tag_means_infer() {
        let tags = vec![TypeTag::Num(NumTag::Int8), TypeTag::List];
        let mut r = TagRepeater::new(&tags);
        assert_eq!(r.next_tag(), Some(TypeTag::Num(NumTag::Int8)));
        assert_eq!(r.next_tag(), None);
        assert_eq!(r.next_tag(), None);
    }
}
