//! # Schema
//!
//! Record schema tables describe the on-disk layout of one repeating record, field by field, in declaration order.
//! Offsets are only ever computed by summing widths along a table, so a table must list every field of its record.

pub mod input_axis;

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

use lazy_static::lazy_static;

use crate::error::{PatchError, Result};

/// Boundary that strings and aligned fields are padded to
pub const ALIGNMENT: usize = 4;

/// Encoding of one field on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// `u32` length, UTF-8 payload, zero padding to [`ALIGNMENT`]
    String,
    /// One byte, `0` or `1`
    Bool,
    /// Little-endian `i32`
    Int,
    /// Little-endian `f32`
    Float,
}
impl WireType {
    /// Fixed width in bytes, or `None` when the width depends on the data
    pub fn width(self) -> Option<usize> {
        match self {
            Self::String => None,
            Self::Bool => Some(1),
            Self::Int | Self::Float => Some(4),
        }
    }

    /// Whether the width is only known after reading the field
    pub fn is_variable(self) -> bool {
        self.width().is_none()
    }
}
impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
        })
    }
}

/// One entry of a record schema table
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name as it appears in patch descriptors
    pub name: &'static str,
    /// Encoding of the field
    pub wire: WireType,
    /// Pad to [`ALIGNMENT`] after the field
    pub align_after: bool,
    /// Values a well-formed file holds in this field. Only used when searching for a record array.
    pub valid: Option<RangeInclusive<i32>>,
}
impl FieldSpec {
    /// Plain field with no alignment or range
    pub const fn new(name: &'static str, wire: WireType) -> Self {
        Self {
            name,
            wire,
            align_after: false,
            valid: None,
        }
    }

    /// Field followed by alignment padding
    pub const fn aligned(name: &'static str, wire: WireType) -> Self {
        Self {
            name,
            wire,
            align_after: true,
            valid: None,
        }
    }

    /// Integer field with a known value range
    pub const fn ranged(name: &'static str, range: RangeInclusive<i32>) -> Self {
        Self {
            name,
            wire: WireType::Int,
            align_after: false,
            valid: Some(range),
        }
    }
}

/// Layout of one record type for one engine version family
#[derive(Debug)]
pub struct RecordSchema {
    /// Record type name
    pub record: &'static str,
    /// Layout revision, bumped whenever fields change
    pub version: u32,
    /// Engine versions this layout was observed in
    pub engines: &'static str,
    /// Field holding the record's name
    pub name_field: &'static str,
    /// Fields in declaration order
    pub fields: Vec<FieldSpec>,
}
impl RecordSchema {
    /// Looks up a field and its position in the table
    pub fn field(&self, name: &str) -> Option<(usize, &FieldSpec)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    /// Looks up a field, failing with [`PatchError::SchemaMismatch`] if the table doesn't have it
    pub fn require_field(&self, name: &str) -> Result<(usize, &FieldSpec)> {
        self.field(name).ok_or_else(|| {
            PatchError::SchemaMismatch(format!(
                "field {name:?} is not part of {} v{}",
                self.record, self.version
            ))
        })
    }

    /// Position of the name field
    pub fn name_index(&self) -> usize {
        // checked for every registered schema in tests
        self.field(self.name_field).map(|(i, _)| i).unwrap_or(0)
    }
}

lazy_static! {
    /// All known schemas, keyed by record type and ordered by version
    static ref SCHEMAS: HashMap<&'static str, Vec<RecordSchema>> = {
        let mut map = HashMap::new();
        map.insert(input_axis::RECORD, vec![input_axis::v1()]);
        map
    };
}

/// Returns the schema for `record`, the newest one when `version` is `None`
pub fn lookup(record: &str, version: Option<u32>) -> Result<&'static RecordSchema> {
    let versions = SCHEMAS
        .get(record)
        .ok_or_else(|| PatchError::SchemaMismatch(format!("no schema for record type {record:?}")))?;
    let found = match version {
        Some(v) => versions.iter().find(|s| s.version == v),
        None => versions.iter().max_by_key(|s| s.version),
    };
    found.ok_or_else(|| {
        PatchError::SchemaMismatch(format!("no schema {record:?} v{}", version.unwrap_or(0)))
    })
}
