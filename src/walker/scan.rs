//! Finds where a record array starts inside a container we can't otherwise parse
//!
//! Every aligned offset is tried as an array count, and the array is accepted only if all of its records parse
//! strictly: printable names, zero padding, 0/1 booleans, finite floats, and ints inside their declared ranges.

use tracing::debug;

use super::Cursor;
use crate::error::{PatchError, Result};
use crate::schema::{RecordSchema, WireType, ALIGNMENT};

/// Largest array count considered plausible
pub const MAX_RECORDS: usize = 4096;

/// Longest string considered plausible
pub const MAX_STRING: usize = 1024;

/// A record array that passed strict validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayShape {
    /// Offset of the element count
    pub offset: usize,
    /// Number of records
    pub count: usize,
    /// First byte after the last record
    pub end: usize,
}

/// Strictly parses the whole array at `offset`
pub fn validate_array(buf: &[u8], schema: &RecordSchema, offset: usize) -> Result<ArrayShape> {
    let mut cursor = Cursor::new(buf, offset);
    let count = cursor.read_u32()? as usize;
    if count == 0 || count > MAX_RECORDS {
        return Err(mismatch(offset, format!("implausible count {count}")));
    }
    for record in 0..count {
        for spec in &schema.fields {
            let at = cursor.position();
            match spec.wire {
                WireType::String => {
                    let len = Cursor::new(buf, at).read_u32()? as usize;
                    if len > MAX_STRING {
                        return Err(mismatch(at, format!("string length {len}")));
                    }
                    let (payload, padding) = cursor.read_string()?;
                    let text = std::str::from_utf8(payload)
                        .map_err(|_| mismatch(at, "string is not UTF-8".into()))?;
                    if text.chars().any(char::is_control) {
                        return Err(mismatch(at, "string holds control characters".into()));
                    }
                    if padding.iter().any(|b| *b != 0) {
                        return Err(mismatch(at, "non-zero string padding".into()));
                    }
                    if record == 0 && spec.name == schema.name_field && text.is_empty() {
                        return Err(mismatch(at, "first record has no name".into()));
                    }
                }
                WireType::Bool => {
                    let byte = cursor.take(1)?[0];
                    if byte > 1 {
                        return Err(mismatch(at, format!("bool holds {byte:#04x}")));
                    }
                }
                WireType::Int => {
                    let bytes = cursor.take(4)?;
                    let value = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    if let Some(valid) = &spec.valid {
                        if !valid.contains(&value) {
                            return Err(mismatch(at, format!("{} = {value}", spec.name)));
                        }
                    }
                }
                WireType::Float => {
                    let bytes = cursor.take(4)?;
                    let value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    if !value.is_finite() {
                        return Err(mismatch(at, format!("{} is not finite", spec.name)));
                    }
                }
            }
            if spec.align_after && cursor.align()?.iter().any(|b| *b != 0) {
                return Err(mismatch(at, "non-zero alignment padding".into()));
            }
        }
    }
    Ok(ArrayShape {
        offset,
        count,
        end: cursor.position(),
    })
}

/// Every aligned offset at which a valid array of `schema` records starts
///
/// A candidate that starts inside another one is dropped. Those come from the tail of the outer array, where a small
/// int ending one record (a non-zero `joyNum`) reads as the count of an array made of the records after it.
pub fn find_arrays(buf: &[u8], schema: &RecordSchema) -> Vec<ArrayShape> {
    let name_first = schema
        .fields
        .first()
        .map_or(false, |f| f.name == schema.name_field);

    let mut found = Vec::new();
    let mut offset = 0;
    while offset + 8 <= buf.len() {
        let count = read_u32_at(buf, offset);
        let plausible = (1..=MAX_RECORDS).contains(&count)
            && (!name_first || (1..=MAX_STRING).contains(&read_u32_at(buf, offset + 4)));
        if plausible {
            if let Ok(shape) = validate_array(buf, schema, offset) {
                debug!(offset = shape.offset, count = shape.count, "candidate record array");
                found.push(shape);
            }
        }
        offset += ALIGNMENT;
    }
    let outer: Vec<ArrayShape> = found
        .iter()
        .filter(|inner| {
            !found
                .iter()
                .any(|shape| shape.offset < inner.offset && inner.offset < shape.end)
        })
        .copied()
        .collect();
    if outer.len() < found.len() {
        debug!(dropped = found.len() - outer.len(), "dropped nested candidates");
    }
    outer
}

/// Finds the single array of `schema` records, failing if there are none or several
pub fn locate_array(buf: &[u8], schema: &RecordSchema) -> Result<ArrayShape> {
    let found = find_arrays(buf, schema);
    match found.as_slice() {
        [shape] => Ok(*shape),
        [] => Err(PatchError::SchemaMismatch(format!(
            "no {} array found (wrong file, engine version, or not a legacy InputManager?)",
            schema.record
        ))),
        many => Err(PatchError::SchemaMismatch(format!(
            "{} candidate {} arrays at {:x?}; set array_offset explicitly",
            many.len(),
            schema.record,
            many.iter().map(|s| s.offset).collect::<Vec<_>>()
        ))),
    }
}

/// Unchecked little-endian read for the scan's prefilter. Callers guarantee four bytes are available.
fn read_u32_at(buf: &[u8], offset: usize) -> usize {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]]) as usize
}

/// Validation failure at a specific offset
fn mismatch(at: usize, reason: String) -> PatchError {
    PatchError::SchemaMismatch(format!("{reason} at {at:#x}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::input_axis;
    use crate::testutil::{container, five_axes};
    use crate::walker::RecordWalker;

    #[test]
    /// The scan lands on the array the builder wrote
    fn test_locate_array() {
        let (buf, array) = container(&five_axes());
        let schema = input_axis::v1();
        let shape = locate_array(&buf, &schema).unwrap();
        assert_eq!(shape.offset, array);
        assert_eq!(shape.count, 5);
        assert_eq!(shape.end, buf.len() - 12);
    }

    #[test]
    /// Garbage yields no array
    fn test_no_array() {
        let buf = vec![0xeeu8; 256];
        let schema = input_axis::v1();
        assert!(matches!(
            locate_array(&buf, &schema),
            Err(PatchError::SchemaMismatch(_))
        ));
    }

    #[test]
    /// Two copies of the array are ambiguous
    fn test_ambiguous() {
        let (mut buf, _) = container(&five_axes());
        let (second, _) = container(&five_axes());
        buf.extend_from_slice(&second);
        let schema = input_axis::v1();
        assert_eq!(find_arrays(&buf, &schema).len(), 2);
        assert!(locate_array(&buf, &schema).is_err());
    }

    #[test]
    /// Joystick axes mid-array don't spawn a second candidate from the records after them
    fn test_joystick_axis() {
        let mut records = five_axes();
        records[1].joy_num = 1;
        records[2].joy_num = 3;
        let (buf, array) = container(&records);
        let schema = input_axis::v1();
        let shape = locate_array(&buf, &schema).unwrap();
        assert_eq!(shape.offset, array);
        assert_eq!(shape.count, 5);

        // Vertical's joyNum reads as a one-record array holding Fire1
        let fire1 = RecordWalker::new(&buf, &schema, array)
            .locate(2, "m_Name", None)
            .unwrap();
        let nested = validate_array(&buf, &schema, fire1.location.offset - 4).unwrap();
        assert_eq!(nested.count, 1);
        assert_eq!(find_arrays(&buf, &schema), [shape]);
    }

    #[test]
    /// Out-of-range enums disqualify an array
    fn test_range_check() {
        let mut records = five_axes();
        records[2].kind = 7;
        let (buf, array) = container(&records);
        let schema = input_axis::v1();
        assert!(validate_array(&buf, &schema, array).is_err());
    }
}
