use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::SlawError;
use crate::numeric::{ArrayRepr, Numeric};
use crate::slaw::{ProteinData, Repr, Slaw};
use crate::tag::{NumTag, TypeTag};

// ═══════════════════════════════════════════════════════════════
//  Tagged JSON codec
// ═══════════════════════════════════════════════════════════════
//
// Variants with a natural JSON shape travel bare: int64 and float64 as
// numbers, boolean, string, nil as null, list as an array. Everything
// else wraps in a two-key object {"%tag": <tag symbol>, "v": <payload>},
// which no bare form can collide with. Maps carry their pairs as a list
// of two-element arrays so key order survives; rude data rides as base64.

const TAG_KEY: &str = "%tag";
const VALUE_KEY: &str = "v";

fn wrap(tag: TypeTag, v: serde_json::Value) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    obj.insert(TAG_KEY.into(), tag.to_string().into());
    obj.insert(VALUE_KEY.into(), v);
    obj.into()
}

fn encode_numeric(n: &Numeric) -> serde_json::Value {
    match n.tag() {
        NumTag::Int64 | NumTag::Float64 if finite(n) => n.to_json_number(),
        tag if tag.is_float() && !finite(n) => {
            // JSON numbers cannot carry non-finite floats
            wrap(TypeTag::Num(tag), float_token(n.as_f64()).into())
        }
        tag => wrap(TypeTag::Num(tag), n.to_json_number()),
    }
}

fn finite(n: &Numeric) -> bool {
    !n.tag().is_float() || n.as_f64().is_finite()
}

fn float_token(f: f64) -> &'static str {
    if f.is_nan() {
        "nan"
    } else if f > 0.0 {
        "inf"
    } else {
        "-inf"
    }
}

fn parse_float_token(s: &str) -> Option<f64> {
    match s {
        "nan" => Some(f64::NAN),
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

impl Slaw {
    /// Lossless JSON form: tags, widths and map order all survive a
    /// round trip through [`Slaw::from_tagged_json`].
    pub fn to_tagged_json(&self) -> serde_json::Value {
        match self.repr() {
            Repr::Nil => serde_json::Value::Null,
            Repr::Boolean(b) => (*b).into(),
            Repr::Num(n) => encode_numeric(n),
            Repr::Str(s) => s.clone().into(),
            Repr::Vect(v) => wrap(
                self.type_tag(),
                v.parts().iter().map(Numeric::to_json_number).collect(),
            ),
            Repr::Array(ArrayRepr::Numeric { items, .. }) => wrap(
                self.type_tag(),
                items.iter().map(Numeric::to_json_number).collect(),
            ),
            Repr::Array(ArrayRepr::Vector { items, .. }) => wrap(
                self.type_tag(),
                items
                    .iter()
                    .map(|v| {
                        v.parts()
                            .iter()
                            .map(Numeric::to_json_number)
                            .collect::<serde_json::Value>()
                    })
                    .collect(),
            ),
            Repr::List(items) => items
                .iter()
                .map(Slaw::to_tagged_json)
                .collect::<Vec<_>>()
                .into(),
            Repr::Map(pairs) => wrap(
                TypeTag::Map,
                pairs
                    .iter()
                    .map(|(k, v)| {
                        serde_json::Value::from(vec![k.to_tagged_json(), v.to_tagged_json()])
                    })
                    .collect(),
            ),
            Repr::Cons(car, cdr) => wrap(
                TypeTag::Cons,
                vec![car.to_tagged_json(), cdr.to_tagged_json()].into(),
            ),
            Repr::Protein(p) => {
                let mut body = serde_json::Map::new();
                body.insert("descrips".into(), p.descrips.to_tagged_json());
                body.insert("ingests".into(), p.ingests.to_tagged_json());
                if !p.rude.is_empty() {
                    body.insert("rude".into(), BASE64.encode(&p.rude).into());
                }
                wrap(TypeTag::Protein, body.into())
            }
        }
    }

    /// Decode the tagged JSON form.
    pub fn from_tagged_json(v: &serde_json::Value) -> Result<Slaw, SlawError> {
        match v {
            serde_json::Value::Null => Ok(Slaw::nil()),
            serde_json::Value::Bool(b) => Ok(Slaw::from(*b)),
            serde_json::Value::Number(n) => {
                let num = if n.is_f64() {
                    Numeric::Float64(n.as_f64().unwrap_or_default())
                } else if let Some(i) = n.as_i64() {
                    Numeric::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Numeric::Unt64(u)
                } else {
                    return Err(SlawError::MalformedEncoding(n.to_string()));
                };
                Ok(Slaw::from(num))
            }
            serde_json::Value::String(s) => Ok(Slaw::from(s.as_str())),
            serde_json::Value::Array(items) => {
                let elems = items
                    .iter()
                    .map(Slaw::from_tagged_json)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Slaw::list(elems))
            }
            serde_json::Value::Object(obj) => decode_wrapper(obj),
        }
    }

    /// Serialize to the compact tagged-JSON text form.
    pub fn encode_text(&self) -> String {
        self.to_tagged_json().to_string()
    }

    /// Parse the tagged-JSON text form.
    pub fn decode_text(s: &str) -> Result<Slaw, SlawError> {
        let v: serde_json::Value = serde_json::from_str(s)
            .map_err(|e| SlawError::MalformedEncoding(e.to_string()))?;
        Slaw::from_tagged_json(&v)
    }

    /// Lossy plain-JSON projection: widths collapse, maps become objects
    /// (non-string keys render through `Display`), conses become pairs,
    /// proteins become plain objects. For interop with consumers that do
    /// not speak the tagged form.
    pub fn to_untagged_json(&self) -> serde_json::Value {
        match self.repr() {
            Repr::Nil => serde_json::Value::Null,
            Repr::Boolean(b) => (*b).into(),
            Repr::Num(n) => n.to_json_number(),
            Repr::Str(s) => s.clone().into(),
            Repr::Vect(v) => v.parts().iter().map(Numeric::to_json_number).collect(),
            Repr::Array(ArrayRepr::Numeric { items, .. }) => {
                items.iter().map(Numeric::to_json_number).collect()
            }
            Repr::Array(ArrayRepr::Vector { items, .. }) => items
                .iter()
                .map(|v| {
                    v.parts()
                        .iter()
                        .map(Numeric::to_json_number)
                        .collect::<serde_json::Value>()
                })
                .collect(),
            Repr::List(items) => items
                .iter()
                .map(Slaw::to_untagged_json)
                .collect::<Vec<_>>()
                .into(),
            Repr::Map(pairs) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in pairs {
                    let key = match k.as_str() {
                        Some(s) => s.to_string(),
                        None => k.to_string(),
                    };
                    obj.insert(key, v.to_untagged_json());
                }
                obj.into()
            }
            Repr::Cons(car, cdr) => {
                vec![car.to_untagged_json(), cdr.to_untagged_json()].into()
            }
            Repr::Protein(p) => {
                let mut obj = serde_json::Map::new();
                obj.insert("descrips".into(), p.descrips.to_untagged_json());
                obj.insert("ingests".into(), p.ingests.to_untagged_json());
                if !p.rude.is_empty() {
                    obj.insert("rude".into(), BASE64.encode(&p.rude).into());
                }
                obj.into()
            }
        }
    }
}

fn decode_wrapper(obj: &serde_json::Map<String, serde_json::Value>) -> Result<Slaw, SlawError> {
    let tag_sym = obj.get(TAG_KEY).and_then(serde_json::Value::as_str);
    let payload = obj.get(VALUE_KEY);
    let (Some(tag_sym), Some(payload)) = (tag_sym, payload) else {
        return Err(SlawError::MalformedEncoding(format!(
            "expected a {{\"{TAG_KEY}\", \"{VALUE_KEY}\"}} wrapper object"
        )));
    };
    if obj.len() != 2 {
        return Err(SlawError::MalformedEncoding(
            "wrapper object has extra keys".into(),
        ));
    }
    let tag: TypeTag = tag_sym
        .parse()
        .map_err(|_| SlawError::MalformedEncoding(format!("unknown tag symbol {tag_sym:?}")))?;

    match tag {
        TypeTag::Num(nt) if nt.is_float() => {
            if let Some(f) = payload.as_str().and_then(parse_float_token) {
                let num = match nt {
                    NumTag::Float32 => Numeric::Float32(f as f32),
                    _ => Numeric::Float64(f),
                };
                return Ok(Slaw::from(num));
            }
            Slaw::with_tag(payload, tag)
        }
        TypeTag::Nil
        | TypeTag::Boolean
        | TypeTag::String
        | TypeTag::Num(_)
        | TypeTag::Vect { .. }
        | TypeTag::NumArray(_)
        | TypeTag::VectArray { .. } => Slaw::with_tag(payload, tag),
        TypeTag::List => Slaw::from_tagged_json(payload),
        TypeTag::Map => {
            let serde_json::Value::Array(rows) = payload else {
                return Err(SlawError::MalformedEncoding(
                    "map payload must be a list of pairs".into(),
                ));
            };
            let pairs = rows
                .iter()
                .map(|row| match row.as_array().map(Vec::as_slice) {
                    Some([k, v]) => {
                        Ok((Slaw::from_tagged_json(k)?, Slaw::from_tagged_json(v)?))
                    }
                    _ => Err(SlawError::MalformedEncoding(
                        "map pair must be a two-element array".into(),
                    )),
                })
                .collect::<Result<Vec<_>, SlawError>>()?;
            Ok(Slaw::map(pairs))
        }
        TypeTag::Cons => match payload.as_array().map(Vec::as_slice) {
            Some([car, cdr]) => Ok(Slaw::cons(
                Slaw::from_tagged_json(car)?,
                Slaw::from_tagged_json(cdr)?,
            )),
            _ => Err(SlawError::MalformedEncoding(
                "cons payload must be a two-element array".into(),
            )),
        },
        TypeTag::Protein => {
            let serde_json::Value::Object(body) = payload else {
                return Err(SlawError::MalformedEncoding(
                    "protein payload must be an object".into(),
                ));
            };
            let field = |name: &str| -> Result<Slaw, SlawError> {
                body.get(name)
                    .map(Slaw::from_tagged_json)
                    .unwrap_or_else(|| Ok(Slaw::nil()))
            };
            let rude = match body.get("rude") {
                Some(serde_json::Value::String(s)) => BASE64
                    .decode(s)
                    .map_err(|e| SlawError::MalformedEncoding(format!("bad rude data: {e}")))?,
                Some(_) => {
                    return Err(SlawError::MalformedEncoding(
                        "rude data must be a base64 string".into(),
                    ))
                }
                None => Vec::new(),
            };
            Ok(Slaw::from_repr(Repr::Protein(ProteinData {
                descrips: field("descrips")?,
                ingests: field("ingests")?,
                rude,
            })))
        }
    }
}

impl fmt::Display for Slaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr() {
            Repr::Str(s) => f.write_str(s),
            Repr::Nil => f.write_str("nil"),
            Repr::Boolean(b) => write!(f, "{b}"),
            Repr::Num(n) => write!(f, "{}", n.to_json_number()),
            _ => write!(f, "{}", self.to_untagged_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(s: &Slaw) {
        let text = s.encode_text();
        let back = Slaw::decode_text(&text).unwrap();
        assert_eq!(&back, s, "round trip changed {text}");
        assert_eq!(back.type_tag(), s.type_tag());
    }

    #[test]
    fn natural_variants_travel_bare() {
        assert_eq!(Slaw::from(5i64).encode_text(), "5");
        assert_eq!(Slaw::from(2.5f64).encode_text(), "2.5");
        assert_eq!(Slaw::from("hi").encode_text(), "\"hi\"");
        assert_eq!(Slaw::from(true).encode_text(), "true");
        assert_eq!(Slaw::nil().encode_text(), "null");
        assert_eq!(Slaw::list([1i64, 2]).encode_text(), "[1,2]");
    }

    #[test]
    fn narrow_widths_round_trip() {
        round_trip(&Slaw::from(5i8));
        round_trip(&Slaw::from(-300i16));
        round_trip(&Slaw::from(7u32));
        round_trip(&Slaw::from(u64::MAX));
        round_trip(&Slaw::from(1.5f32));
    }

    #[test]
    fn composites_round_trip() {
        round_trip(&Slaw::vector(&[1.0f64, 2.0, 3.0]).unwrap());
        round_trip(&Slaw::array([1i8, -2, 3]));
        round_trip(&Slaw::map([("b", 2i64), ("a", 1)]));
        round_trip(&Slaw::cons("k", 7i64));
        round_trip(&Slaw::list([Slaw::nil(), Slaw::map([("x", 1i64)])]));
    }

    #[test]
    fn map_order_survives() {
        let m = Slaw::map([("z", 1i64), ("a", 2), ("m", 3)]);
        let back = Slaw::decode_text(&m.encode_text()).unwrap();
        assert_eq!(back.nth(0).unwrap().car().unwrap(), "z");
        assert_eq!(back.nth(2).unwrap().car().unwrap(), "m");
    }

    #[test]
    fn protein_round_trips_with_rude_data() {
        let p = Slaw::protein(
            Slaw::list(["alpha", "beta"]),
            Slaw::map([("k", 42i64)]),
            vec![0, 1, 254, 255],
        );
        round_trip(&p);
        let back = Slaw::decode_text(&p.encode_text()).unwrap();
        assert_eq!(back.rude_data().unwrap(), &[0, 1, 254, 255]);
    }

    #[test]
    fn non_finite_floats_round_trip() {
        round_trip(&Slaw::from(f64::INFINITY));
        round_trip(&Slaw::from(f32::NEG_INFINITY));
        let nan = Slaw::from(f64::NAN);
        let back = Slaw::decode_text(&nan.encode_text()).unwrap();
        assert!(back.as_f64().unwrap().is_nan());
    }

    #[test]
    fn malformed_inputs_rejected() {
        for text in [
            "{",
            "{\"%tag\": \"int9\", \"v\": 1}",
            "{\"%tag\": \"cons\", \"v\": [1]}",
            "{\"%tag\": \"map\", \"v\": 3}",
            "{\"%tag\": \"int8\", \"v\": 1, \"extra\": 2}",
        ] {
            assert!(
                matches!(Slaw::decode_text(text), Err(SlawError::MalformedEncoding(_))),
                "accepted {text}"
            );
        }
    }

    #[test]
    fn untagged_projection_collapses() {
        let m = Slaw::map([("n", Slaw::from(5i8)), ("v", Slaw::vector(&[1i32, 2]).unwrap())]);
        assert_eq!(
            m.to_untagged_json(),
            serde_json::json!({"n": 5, "v": [1, 2]})
        );
    }
}
