//! # Patcher
//!
//! Field patchers turn a toggle rule into a located, decoded field. Each rule's `type` tag selects one patcher from
//! a registry, so new ways of finding a field can be added without touching the walker or the resolver.

pub mod byte;
pub mod legacy_axis;

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::descriptor::ToggleRule;
use crate::error::{PatchError, Result};
use crate::resolver::Reading;

/// Per-run state shared by every rule resolved against the same buffer
#[derive(Debug, Default)]
pub struct LocateCache {
    /// Record array offsets already found, keyed by record type
    arrays: HashMap<&'static str, usize>,
}
impl LocateCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached array offset for `record`, computing it with `find` on first use
    pub fn array_offset(
        &mut self,
        record: &'static str,
        find: impl FnOnce() -> Result<usize>,
    ) -> Result<usize> {
        if let Some(offset) = self.arrays.get(record) {
            return Ok(*offset);
        }
        let offset = find()?;
        self.arrays.insert(record, offset);
        Ok(offset)
    }
}

/// Locates and reads the field a toggle rule refers to
pub trait FieldPatcher: Send + Sync {
    /// Tag selecting this patcher in a rule's `type`
    fn tag(&self) -> &'static str;

    /// Resolves rule number `position` against `buffer` and reads its current value
    ///
    /// The returned reading carries the declared values already converted to the field's wire type.
    fn read(
        &self,
        buffer: &[u8],
        position: usize,
        rule: &ToggleRule,
        cache: &mut LocateCache,
    ) -> Result<Reading>;
}

lazy_static! {
    /// Patchers by tag
    static ref PATCHERS: HashMap<&'static str, Box<dyn FieldPatcher>> = {
        let mut map: HashMap<&'static str, Box<dyn FieldPatcher>> = HashMap::new();
        for patcher in [Box::new(legacy_axis::LegacyAxisPatcher::new()) as Box<dyn FieldPatcher>] {
            map.insert(patcher.tag(), patcher);
        }
        map
    };
}

/// Looks up the patcher registered for `tag`
pub fn patcher_for(tag: &str) -> Result<&'static dyn FieldPatcher> {
    PATCHERS
        .get(tag)
        .map(|p| p.as_ref())
        .ok_or_else(|| PatchError::UnsupportedToggleType(tag.to_string()))
}
