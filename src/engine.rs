//! # Engine
//!
//! Applies or reverts a whole patch descriptor against one target file. Every rule is located and read before
//! anything is written, and either all planned writes reach disk or none do.

use std::path::Path;

use tracing::{debug, info};

use crate::codec;
use crate::descriptor::PatchDescriptor;
use crate::error::{PatchError, Result};
use crate::patcher::byte::{BytePatch, PatchSet};
use crate::patcher::{self, LocateCache};
use crate::resolver::{self, Outcome, PatchState, PlannedWrite, Reading};
use crate::target::TargetFile;

/// What a successful run did
#[derive(Debug, Clone, PartialEq)]
pub struct PatchReport {
    /// State the file was in before the run
    pub from: PatchState,
    /// Net effect of the run
    pub outcome: Outcome,
    /// One entry per rule, in rule order
    pub changes: Vec<PlannedWrite>,
    /// Raw byte writes, in rule order
    pub patches: Vec<BytePatch>,
}

/// Current state of a file, without changing it
#[derive(Debug, Clone)]
pub struct Inspection {
    /// Combined state of every rule
    pub state: PatchState,
    /// Per-rule readings
    pub readings: Vec<Reading>,
}

/// Locates and reads every rule of `descriptor` in `buffer`
pub fn read_rules(buffer: &[u8], descriptor: &PatchDescriptor) -> Result<Vec<Reading>> {
    let mut cache = LocateCache::new();
    descriptor
        .toggles
        .iter()
        .enumerate()
        .map(|(position, rule)| {
            let reading = patcher::patcher_for(&rule.kind)?.read(buffer, position, rule, &mut cache)?;
            debug!(
                rule = position,
                axis = reading.located.index,
                anchor = %reading.located.anchor,
                field = %reading.field,
                location = %reading.located.location,
                current = %reading.current,
                "read rule"
            );
            Ok(reading)
        })
        .collect()
}

/// Reports the state `buffer` is in
pub fn inspect(buffer: &[u8], descriptor: &PatchDescriptor) -> Result<Inspection> {
    let readings = read_rules(buffer, descriptor)?;
    Ok(Inspection {
        state: resolver::classify(&readings),
        readings,
    })
}

/// Toggles `buffer` in memory
///
/// On error the buffer is left exactly as it was passed in.
pub fn toggle_buffer(buffer: &mut [u8], descriptor: &PatchDescriptor) -> Result<PatchReport> {
    let readings = read_rules(buffer, descriptor)?;
    let plan = resolver::plan(&readings)?;
    info!(from = %plan.from, outcome = %plan.outcome, rules = plan.writes.len(), "resolved patch state");

    let mut set = PatchSet::new(buffer);
    for write in &plan.writes {
        let bytes = codec::encode(write.after, write.location.wire)?;
        set.write(write.location.offset, &bytes)?;
    }
    for write in &plan.writes {
        let written = codec::decode(set.buffer(), &write.location)?;
        if !written.matches(&write.after) {
            return Err(PatchError::SchemaMismatch(format!(
                "{}.{} reads back as {written} after writing {}",
                write.anchor, write.field, write.after
            )));
        }
    }
    let patches = set.keep();

    Ok(PatchReport {
        from: plan.from,
        outcome: plan.outcome,
        changes: plan.writes,
        patches,
    })
}

/// Applies `descriptor` to the file at `path` if it is unpatched, reverts it if it is patched
pub fn apply_or_revert(descriptor: &PatchDescriptor, path: &Path) -> Result<PatchReport> {
    let mut target = TargetFile::open(path)?;
    let report = toggle_buffer(target.bytes_mut(), descriptor)?;
    target.commit()?;
    info!(
        id = %descriptor.id,
        path = %path.display(),
        outcome = %report.outcome,
        "patch {}",
        report.outcome
    );
    Ok(report)
}

/// Reports the state of the file at `path` without writing
pub fn inspect_file(descriptor: &PatchDescriptor, path: &Path) -> Result<Inspection> {
    let target = TargetFile::open(path)?;
    inspect(target.bytes(), descriptor)
}
