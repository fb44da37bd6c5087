//! Toggles a scalar field of one entry in the legacy `InputManager.m_Axes` array

use tracing::{debug, warn};

use super::{FieldPatcher, LocateCache};
use crate::codec::{self, TypedValue};
use crate::descriptor::ToggleRule;
use crate::error::{PatchError, Result};
use crate::resolver::Reading;
use crate::schema::{self, input_axis, RecordSchema};
use crate::walker::scan;
use crate::walker::RecordWalker;

/// Tag of this patcher in descriptors
pub const TAG: &str = "legacy_axis_field";

/// Patcher for `legacy_axis_field` rules, always using the newest `InputAxis` layout
#[derive(Debug, Default)]
pub struct LegacyAxisPatcher;
impl LegacyAxisPatcher {
    /// Creates the patcher
    pub fn new() -> Self {
        Self
    }

    /// Layout of the axis records
    fn schema(&self) -> Result<&'static RecordSchema> {
        schema::lookup(input_axis::RECORD, None)
    }

    /// Offset of the axis array, from the rule or by scanning
    fn array_offset(
        &self,
        schema: &'static RecordSchema,
        buffer: &[u8],
        rule: &ToggleRule,
        cache: &mut LocateCache,
    ) -> Result<usize> {
        if let Some(offset) = rule.array_offset {
            return scan::validate_array(buffer, schema, offset).map(|shape| shape.offset);
        }
        cache.array_offset(schema.record, || {
            let shape = scan::locate_array(buffer, schema)?;
            debug!(
                offset = shape.offset,
                count = shape.count,
                schema = schema.version,
                engines = schema.engines,
                "found axis array"
            );
            Ok(shape.offset)
        })
    }
}
impl FieldPatcher for LegacyAxisPatcher {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn read(
        &self,
        buffer: &[u8],
        position: usize,
        rule: &ToggleRule,
        cache: &mut LocateCache,
    ) -> Result<Reading> {
        let schema = self.schema()?;
        let (_, spec) = schema.require_field(&rule.field_name)?;
        let original = codec::coerce(&rule.original, spec)?;
        let patched = codec::coerce(&rule.patched, spec)?;
        if original.matches(&patched) {
            return Err(PatchError::Descriptor(format!(
                "toggle[{position}] 'original' and 'patched' are both {original}"
            )));
        }

        let array = self.array_offset(schema, buffer, rule, cache)?;
        let walker = RecordWalker::new(buffer, schema, array);
        let anchor = rule.anchor();
        if anchor.is_none() {
            warn!(rule = position, axis = rule.axis_index, "no axis_name given, skipping anchor check");
        }
        let located = walker.locate(rule.axis_index, &rule.field_name, anchor)?;
        let current: TypedValue = codec::decode(buffer, &located.location)?;

        Ok(Reading {
            rule: position,
            field: rule.field_name.clone(),
            located,
            current,
            original,
            patched,
        })
    }
}
