//! This module contains a byte patcher for in-memory file buffers

use std::ops::Range;

use crate::error::{PatchError, Result};

/// One overwrite of a byte range, remembering what it replaced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytePatch {
    /// Offset of the first byte written
    offset: usize,
    /// Bytes that were there before
    original: Vec<u8>,
    /// Bytes that were written
    patched: Vec<u8>,
}
impl BytePatch {
    /// Overwrites `buffer[offset..offset + patch.len()]` with `patch`
    ///
    /// The buffer is a slice, so a patch can never change its length.
    pub fn apply(buffer: &mut [u8], offset: usize, patch: &[u8]) -> Result<Self> {
        let range = offset..offset + patch.len();
        let target = buffer.get_mut(range.clone()).ok_or_else(|| {
            PatchError::SchemaMismatch(format!("write at {range:?} is outside the file"))
        })?;
        let original = target.to_vec();
        target.copy_from_slice(patch);
        Ok(Self {
            offset,
            original,
            patched: patch.to_vec(),
        })
    }

    /// Puts the original bytes back
    pub fn restore(&self, buffer: &mut [u8]) {
        buffer[self.range()].copy_from_slice(&self.original);
    }

    /// Byte range this patch covers
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.patched.len()
    }
}

/// Guard over a set of byte patches applied to one buffer
///
/// Dropping the guard restores every patch in reverse order. Call [`PatchSet::keep`] once every write has been
/// checked to leave them in place.
pub struct PatchSet<'a> {
    /// Buffer being patched
    buffer: &'a mut [u8],
    /// Applied patches, in application order
    patches: Vec<BytePatch>,
}
impl<'a> PatchSet<'a> {
    /// Starts an empty set over `buffer`
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            patches: Vec::new(),
        }
    }

    /// Writes `bytes` at `offset`. Writes may not overlap earlier writes in the same set.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let range = offset..offset + bytes.len();
        if let Some(other) = self
            .patches
            .iter()
            .find(|p| p.range().start < range.end && range.start < p.range().end)
        {
            return Err(PatchError::Descriptor(format!(
                "toggle writes overlap at {:?} and {:?}",
                other.range(),
                range
            )));
        }
        let patch = BytePatch::apply(&mut *self.buffer, offset, bytes)?;
        self.patches.push(patch);
        Ok(())
    }

    /// Patched view of the buffer
    pub fn buffer(&self) -> &[u8] {
        &*self.buffer
    }

    /// Keeps every write and releases the buffer
    pub fn keep(mut self) -> Vec<BytePatch> {
        std::mem::take(&mut self.patches)
    }
}
impl Drop for PatchSet<'_> {
    fn drop(&mut self) {
        for patch in self.patches.iter().rev() {
            patch.restore(&mut *self.buffer);
        }
    }
}
