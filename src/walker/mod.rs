//! # Walker
//!
//! Sequential parsing of a repeating record array. Record widths depend on the data (strings carry their own length),
//! so the only way to reach record `N` is to parse every record before it, field by field.

pub mod scan;

use std::fmt;
use std::ops::Range;

use tracing::debug;

use crate::error::{PatchError, Result};
use crate::schema::{FieldSpec, RecordSchema, WireType, ALIGNMENT};

/// Absolute position and width of one field, valid for the buffer it was resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLocation {
    /// Byte offset from the start of the file
    pub offset: usize,
    /// Width in bytes, including a string's prefix and padding
    pub width: usize,
    /// Encoding of the field
    pub wire: WireType,
}
impl FieldLocation {
    /// Location of a fixed-width field
    pub fn new(offset: usize, wire: WireType) -> Self {
        Self {
            offset,
            width: wire.width().unwrap_or(0),
            wire,
        }
    }

    /// Byte range covered by the field
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.width
    }
}
impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}+{} ({})", self.offset, self.width, self.wire)
    }
}

/// A field resolved inside a specific record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedField {
    /// Where the field lives
    pub location: FieldLocation,
    /// Record index inside the array
    pub index: usize,
    /// Name recovered from the record
    pub anchor: String,
}

/// Bounds-checked forward reader over a buffer
pub struct Cursor<'a> {
    /// Data being read
    buf: &'a [u8],
    /// Absolute position of the next read
    pos: usize,
}
impl<'a> Cursor<'a> {
    /// Creates a cursor positioned at `pos`
    pub fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// Current absolute position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Takes the next `len` bytes
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                PatchError::SchemaMismatch(format!(
                    "unexpected end of file: needed {len} bytes at {:#x}, file is {:#x} bytes",
                    self.pos,
                    self.buf.len()
                ))
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Reads a little-endian `u32`
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Skips to the next [`ALIGNMENT`] boundary, returning the padding bytes
    pub fn align(&mut self) -> Result<&'a [u8]> {
        let pad = (ALIGNMENT - self.pos % ALIGNMENT) % ALIGNMENT;
        self.take(pad)
    }

    /// Reads a length-prefixed string, returning its payload and padding
    pub fn read_string(&mut self) -> Result<(&'a [u8], &'a [u8])> {
        let len = self.read_u32()? as usize;
        let payload = self.take(len)?;
        let padding = self.align()?;
        Ok((payload, padding))
    }

    /// Steps over one field, returning where it was
    ///
    /// The returned width excludes alignment that follows a fixed-width field, but includes a string's own padding.
    pub fn skip_field(&mut self, spec: &FieldSpec) -> Result<FieldLocation> {
        let offset = self.pos;
        let location = match spec.wire.width() {
            Some(width) => {
                self.take(width)?;
                FieldLocation::new(offset, spec.wire)
            }
            None => {
                self.read_string()?;
                FieldLocation {
                    offset,
                    width: self.pos - offset,
                    wire: spec.wire,
                }
            }
        };
        if spec.align_after {
            self.align()?;
        }
        Ok(location)
    }
}

/// Walks records of one schema starting at a known array offset
pub struct RecordWalker<'a> {
    /// Whole file
    buf: &'a [u8],
    /// Layout of each record
    schema: &'a RecordSchema,
    /// Offset of the array's element count
    array_offset: usize,
}
impl<'a> RecordWalker<'a> {
    /// Creates a walker for the array whose count sits at `array_offset`
    pub fn new(buf: &'a [u8], schema: &'a RecordSchema, array_offset: usize) -> Self {
        Self {
            buf,
            schema,
            array_offset,
        }
    }

    /// Resolves `field` inside record `index`, checking the record's name against `anchor` when one is given
    pub fn locate(&self, index: usize, field: &str, anchor: Option<&str>) -> Result<LocatedField> {
        let (target, _) = self.schema.require_field(field)?;
        let name_index = self.schema.name_index();

        let mut cursor = Cursor::new(self.buf, self.array_offset);
        let count = cursor.read_u32()? as usize;
        if index >= count {
            return Err(PatchError::IndexOutOfRange { index, count });
        }

        for _ in 0..index {
            for spec in &self.schema.fields {
                cursor.skip_field(spec)?;
            }
        }
        debug!(index, record_offset = cursor.position(), "reached record");

        let mut location = None;
        let mut name = None;
        for (i, spec) in self.schema.fields.iter().enumerate() {
            if i == name_index {
                let start = cursor.position();
                let (payload, _) = cursor.read_string()?;
                name = Some(decode_name(payload, start)?);
                if i == target {
                    location = Some(FieldLocation {
                        offset: start,
                        width: cursor.position() - start,
                        wire: spec.wire,
                    });
                }
            } else if i == target {
                location = Some(cursor.skip_field(spec)?);
            } else {
                cursor.skip_field(spec)?;
            }
            if location.is_some() && name.is_some() {
                break;
            }
        }

        // both are set once the loop covers the target and the name field
        let (location, name) = match (location, name) {
            (Some(location), Some(name)) => (location, name),
            _ => {
                return Err(PatchError::SchemaMismatch(format!(
                    "record {index} ended before field {field:?}"
                )))
            }
        };

        if let Some(expected) = anchor {
            if target != name_index && name != expected {
                return Err(PatchError::SchemaMismatch(format!(
                    "axis name mismatch at index {index}: expected {expected:?}, found {name:?}"
                )));
            }
        }

        debug!(index, field, %location, anchor = %name, "located field");
        Ok(LocatedField {
            location,
            index,
            anchor: name,
        })
    }
}

/// Interprets a name payload as UTF-8
fn decode_name(payload: &[u8], offset: usize) -> Result<String> {
    String::from_utf8(payload.to_vec())
        .map_err(|_| PatchError::SchemaMismatch(format!("record name at {offset:#x} is not UTF-8")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::input_axis;
    use crate::testutil::{axis, container};

    #[test]
    /// Locating a flag in the middle of the array
    fn test_locate_invert() {
        let records = [
            axis("Horizontal"),
            axis("Vertical"),
            axis("Fire1"),
            axis("Mouse Y"),
            axis("Mouse ScrollWheel"),
        ];
        let (buf, array) = container(&records);
        let schema = input_axis::v1();
        let walker = RecordWalker::new(&buf, &schema, array);

        let found = walker.locate(3, "invert", Some("Mouse Y")).unwrap();
        assert_eq!(found.anchor, "Mouse Y");
        assert_eq!(found.location.width, 1);
        assert_eq!(found.location.wire, WireType::Bool);
        assert_eq!(buf[found.location.offset], 0);
    }

    #[test]
    /// Every record's name must be found at the offset the walker reports
    fn test_locate_names() {
        let records = [axis("a"), axis("bb"), axis("ccc"), axis("dddd"), axis("eeeee")];
        let (buf, array) = container(&records);
        let schema = input_axis::v1();
        let walker = RecordWalker::new(&buf, &schema, array);
        for (i, record) in records.iter().enumerate() {
            let found = walker.locate(i, "m_Name", None).unwrap();
            assert_eq!(found.anchor, record.name);
            // prefix + payload + padding
            assert_eq!(found.location.width % ALIGNMENT, 0);
            assert_eq!(found.location.offset % ALIGNMENT, 0);
        }
    }

    #[test]
    /// Index past the end of the array
    fn test_out_of_range() {
        let (buf, array) = container(&[axis("a"), axis("b"), axis("c"), axis("d"), axis("e")]);
        let schema = input_axis::v1();
        let walker = RecordWalker::new(&buf, &schema, array);
        assert!(matches!(
            walker.locate(9, "invert", None),
            Err(PatchError::IndexOutOfRange { index: 9, count: 5 })
        ));
    }

    #[test]
    /// Wrong anchor is fatal
    fn test_anchor_mismatch() {
        let (buf, array) = container(&[axis("Horizontal"), axis("Vertical")]);
        let schema = input_axis::v1();
        let walker = RecordWalker::new(&buf, &schema, array);
        assert!(matches!(
            walker.locate(1, "invert", Some("Mouse Y")),
            Err(PatchError::SchemaMismatch(_))
        ));
    }

    #[test]
    /// Unknown fields never resolve
    fn test_unknown_field() {
        let (buf, array) = container(&[axis("Horizontal")]);
        let schema = input_axis::v1();
        let walker = RecordWalker::new(&buf, &schema, array);
        assert!(matches!(
            walker.locate(0, "inverted", None),
            Err(PatchError::SchemaMismatch(_))
        ));
    }

    #[test]
    /// A truncated record fails instead of reading past the buffer
    fn test_truncated() {
        let (buf, array) = container(&[axis("Horizontal"), axis("Vertical")]);
        let schema = input_axis::v1();
        let cut = &buf[..array + 40];
        let walker = RecordWalker::new(cut, &schema, array);
        assert!(matches!(
            walker.locate(1, "invert", None),
            Err(PatchError::SchemaMismatch(_))
        ));
    }

    #[test]
    /// Cursor alignment is absolute
    fn test_cursor_align() {
        let buf = [3u8, 0, 0, 0, b'a', b'b', b'c', 0, 0xff];
        let mut cursor = Cursor::new(&buf, 0);
        let (payload, padding) = cursor.read_string().unwrap();
        assert_eq!(payload, b"abc");
        assert_eq!(padding, [0u8]);
        assert_eq!(cursor.position(), 8);
        assert!(cursor.take(2).is_err());
    }
}
