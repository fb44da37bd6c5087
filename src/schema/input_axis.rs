//! Layout of `InputManager.m_Axes` entries

use super::{FieldSpec, RecordSchema, WireType};

/// Record type name used for registry lookups
pub const RECORD: &str = "InputAxis";

/// `InputAxis` as serialized by Unity 5 and later
pub fn v1() -> RecordSchema {
    RecordSchema {
        record: RECORD,
        version: 1,
        engines: "Unity 5.0+",
        name_field: "m_Name",
        fields: vec![
            FieldSpec::new("m_Name", WireType::String),
            FieldSpec::new("descriptiveName", WireType::String),
            FieldSpec::new("descriptiveNegativeName", WireType::String),
            FieldSpec::new("negativeButton", WireType::String),
            FieldSpec::new("positiveButton", WireType::String),
            FieldSpec::new("altNegativeButton", WireType::String),
            FieldSpec::new("altPositiveButton", WireType::String),
            FieldSpec::new("gravity", WireType::Float),
            FieldSpec::new("dead", WireType::Float),
            FieldSpec::new("sensitivity", WireType::Float),
            FieldSpec::new("snap", WireType::Bool),
            // kAlignBytes
            FieldSpec::aligned("invert", WireType::Bool),
            // key/mouse, mouse movement, joystick axis
            FieldSpec::ranged("type", 0..=2),
            FieldSpec::ranged("axis", 0..=27),
            FieldSpec::ranged("joyNum", 0..=16),
        ],
    }
}
