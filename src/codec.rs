//! # Codec
//!
//! Conversion between typed scalars and their fixed-width wire bytes. Encoding never changes a field's width,
//! which is what keeps the container's length intact.

use std::fmt;

use serde_json::Value;

use crate::error::{PatchError, Result};
use crate::schema::{FieldSpec, WireType};
use crate::walker::FieldLocation;

/// Absolute tolerance for float comparisons
pub const FLOAT_EPS: f64 = 1e-6;

/// A scalar that can be toggled in place
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue {
    /// One-byte boolean
    Bool(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 32-bit float
    Float(f32),
}
impl TypedValue {
    /// Wire type this value encodes to
    pub fn wire(&self) -> WireType {
        match self {
            Self::Bool(_) => WireType::Bool,
            Self::Int(_) => WireType::Int,
            Self::Float(_) => WireType::Float,
        }
    }

    /// Compares two values: floats within [`FLOAT_EPS`] and only when finite, everything else exactly
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => {
                let (a, b) = (f64::from(*a), f64::from(*b));
                a.is_finite() && b.is_finite() && (a - b).abs() <= FLOAT_EPS
            }
            (a, b) => a == b,
        }
    }
}
impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

/// Reads the value stored at `location`
pub fn decode(buffer: &[u8], location: &FieldLocation) -> Result<TypedValue> {
    let bytes = buffer
        .get(location.range())
        .ok_or_else(|| PatchError::SchemaMismatch(format!("field at {location} runs past end of file")))?;
    match location.wire {
        WireType::Bool => match bytes[0] {
            0 => Ok(TypedValue::Bool(false)),
            1 => Ok(TypedValue::Bool(true)),
            b => Err(PatchError::SchemaMismatch(format!(
                "bool at {location} holds {b:#04x}"
            ))),
        },
        WireType::Int => Ok(TypedValue::Int(i32::from_le_bytes(word(bytes)))),
        WireType::Float => Ok(TypedValue::Float(f32::from_le_bytes(word(bytes)))),
        WireType::String => Err(PatchError::UnsupportedType {
            field: location.to_string(),
            reason: "strings cannot be decoded as scalars".into(),
        }),
    }
}

/// Encodes `value` as `wire`, failing if the types disagree
pub fn encode(value: TypedValue, wire: WireType) -> Result<Vec<u8>> {
    if value.wire() != wire {
        return Err(PatchError::UnsupportedType {
            field: wire.to_string(),
            reason: format!("cannot encode {} value {value} as {wire}", value.wire()),
        });
    }
    Ok(match value {
        TypedValue::Bool(b) => vec![u8::from(b)],
        TypedValue::Int(i) => i.to_le_bytes().to_vec(),
        TypedValue::Float(x) => x.to_le_bytes().to_vec(),
    })
}

/// Converts a descriptor value to the type of `field`
///
/// Booleans only accept JSON booleans. Integers only accept JSON integers in `i32` range, and in the field's valid range
/// when it has one, so a written value never hides the array from the next scan. Floats accept any number that stays
/// finite as `f32`. Strings are rejected outright since rewriting one could change the file's length.
pub fn coerce(value: &Value, field: &FieldSpec) -> Result<TypedValue> {
    let unsupported = |reason: String| PatchError::UnsupportedType {
        field: field.name.to_string(),
        reason,
    };
    match (field.wire, value) {
        (WireType::Bool, Value::Bool(b)) => Ok(TypedValue::Bool(*b)),
        (WireType::Int, Value::Number(n)) => {
            let i = n
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .ok_or_else(|| unsupported(format!("{n} is not a 32-bit integer")))?;
            match &field.valid {
                Some(valid) if !valid.contains(&i) => Err(unsupported(format!(
                    "{i} is outside {}..={}",
                    valid.start(),
                    valid.end()
                ))),
                _ => Ok(TypedValue::Int(i)),
            }
        }
        (WireType::Float, Value::Number(n)) => n
            .as_f64()
            .map(|x| x as f32)
            .filter(|x| x.is_finite())
            .map(TypedValue::Float)
            .ok_or_else(|| unsupported(format!("{n} is not a finite 32-bit float"))),
        (WireType::String, _) => Err(unsupported("string fields cannot be toggled in place".into())),
        (wire, other) => Err(unsupported(format!("{other} is not a {wire}"))),
    }
}

/// First four bytes of a fixed-width field
fn word(bytes: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&bytes[..4]);
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    /// Encoded widths match the wire table
    fn test_encode_width() {
        assert_eq!(encode(TypedValue::Bool(true), WireType::Bool).unwrap(), [1u8]);
        assert_eq!(
            encode(TypedValue::Int(-2), WireType::Int).unwrap(),
            (-2i32).to_le_bytes()
        );
        assert_eq!(encode(TypedValue::Float(0.5), WireType::Float).unwrap().len(), 4);
    }

    #[test]
    /// Mismatched types are refused instead of reinterpreted
    fn test_encode_mismatch() {
        assert!(matches!(
            encode(TypedValue::Bool(true), WireType::Int),
            Err(PatchError::UnsupportedType { .. })
        ));
    }

    #[test]
    /// Values are read from exactly the located range
    fn test_decode() {
        let buf = [9u8, 1, 0, 0, 0, 0x80, 0x3f];
        let flag = FieldLocation::new(1, WireType::Bool);
        assert_eq!(decode(&buf, &flag).unwrap(), TypedValue::Bool(true));
        let float = FieldLocation::new(3, WireType::Float);
        assert_eq!(decode(&buf, &float).unwrap(), TypedValue::Float(1.0));
        let past_end = FieldLocation::new(4, WireType::Int);
        assert!(decode(&buf, &past_end).is_err());
        let bad_bool = FieldLocation::new(0, WireType::Bool);
        assert!(matches!(
            decode(&buf, &bad_bool),
            Err(PatchError::SchemaMismatch(_))
        ));
    }

    #[test]
    /// Floats compare with tolerance, everything else exactly
    fn test_matches() {
        assert!(TypedValue::Float(0.1).matches(&TypedValue::Float(0.100_000_5)));
        assert!(!TypedValue::Float(0.1).matches(&TypedValue::Float(0.2)));
        assert!(!TypedValue::Float(f32::NAN).matches(&TypedValue::Float(f32::NAN)));
        assert!(!TypedValue::Int(1).matches(&TypedValue::Bool(true)));
    }

    #[test]
    /// Descriptor values are checked against the field's wire type
    fn test_coerce() {
        let flag = FieldSpec::new("invert", WireType::Bool);
        let int = FieldSpec::new("axis", WireType::Int);
        let float = FieldSpec::new("dead", WireType::Float);
        let name = FieldSpec::new("m_Name", WireType::String);

        assert_eq!(coerce(&json!(true), &flag).unwrap(), TypedValue::Bool(true));
        assert!(coerce(&json!(1), &flag).is_err());
        assert_eq!(coerce(&json!(3), &int).unwrap(), TypedValue::Int(3));
        assert!(coerce(&json!(1.5), &int).is_err());
        assert!(coerce(&json!(1u64 << 40), &int).is_err());
        assert_eq!(coerce(&json!(2), &float).unwrap(), TypedValue::Float(2.0));
        assert!(coerce(&json!("x"), &name).is_err());
    }

    #[test]
    /// Ranged ints only take values a scan would still accept
    fn test_coerce_range() {
        let kind = FieldSpec::ranged("type", 0..=2);
        assert_eq!(coerce(&json!(2), &kind).unwrap(), TypedValue::Int(2));
        assert!(matches!(
            coerce(&json!(5), &kind),
            Err(PatchError::UnsupportedType { .. })
        ));
        assert!(coerce(&json!(-1), &kind).is_err());
    }

    #[test]
    /// Numbers that overflow `f32` are refused up front
    fn test_coerce_overflow() {
        let float = FieldSpec::new("dead", WireType::Float);
        assert!(matches!(
            coerce(&json!(1e39), &float),
            Err(PatchError::UnsupportedType { .. })
        ));
        assert!(coerce(&json!(-1e39), &float).is_err());
        assert!(coerce(&json!(3.4e38), &float).is_ok());
    }
}
