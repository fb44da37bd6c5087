//! # Resolver
//!
//! Folds the current value of every toggle rule into one state for the whole descriptor and plans the opposite
//! transition. A descriptor is only actionable when all of its rules agree.

use std::fmt;

use crate::codec::TypedValue;
use crate::error::{PatchError, Result};
use crate::walker::{FieldLocation, LocatedField};

/// State of a whole descriptor against one file, recomputed on every run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchState {
    /// Every rule reads its original value
    Unpatched,
    /// Every rule reads its patched value
    Patched,
    /// Anything else
    Indeterminate,
}
impl fmt::Display for PatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unpatched => "unpatched",
            Self::Patched => "patched",
            Self::Indeterminate => "indeterminate",
        })
    }
}

/// Net effect of a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Patched values were written
    Applied,
    /// Original values were written back
    Reverted,
}
impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Applied => "applied",
            Self::Reverted => "reverted",
        })
    }
}

/// Which declared value a single rule currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    /// Holds `original`
    Original,
    /// Holds `patched`
    Patched,
    /// Holds neither
    Neither,
}

/// One rule's located field, its current value, and its two declared states
#[derive(Debug, Clone)]
pub struct Reading {
    /// Position of the rule in the descriptor
    pub rule: usize,
    /// Field name from the rule
    pub field: String,
    /// Where the value lives
    pub located: LocatedField,
    /// Value currently on disk
    pub current: TypedValue,
    /// Declared original value
    pub original: TypedValue,
    /// Declared patched value
    pub patched: TypedValue,
}
impl Reading {
    /// Compares the current value against both declared states
    pub fn state(&self) -> RuleState {
        if self.current.matches(&self.original) {
            RuleState::Original
        } else if self.current.matches(&self.patched) {
            RuleState::Patched
        } else {
            RuleState::Neither
        }
    }
}

/// A single field write of a planned transition
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWrite {
    /// Position of the rule in the descriptor
    pub rule: usize,
    /// Record name the field belongs to
    pub anchor: String,
    /// Field name
    pub field: String,
    /// Where to write
    pub location: FieldLocation,
    /// Value being replaced
    pub before: TypedValue,
    /// Value being written
    pub after: TypedValue,
}

/// The transition a run will perform
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// State before the transition
    pub from: PatchState,
    /// Net effect once written
    pub outcome: Outcome,
    /// One write per rule, in rule order
    pub writes: Vec<PlannedWrite>,
}

/// Overall state of a set of readings
pub fn classify(readings: &[Reading]) -> PatchState {
    if readings.is_empty() {
        return PatchState::Indeterminate;
    }
    let states: Vec<_> = readings.iter().map(Reading::state).collect();
    if states.iter().all(|s| *s == RuleState::Original) {
        PatchState::Unpatched
    } else if states.iter().all(|s| *s == RuleState::Patched) {
        PatchState::Patched
    } else {
        PatchState::Indeterminate
    }
}

/// Plans the opposite transition, or explains why the readings are not actionable
///
/// A rule holding neither declared value wins over a mix of original and patched rules, since it means the file is
/// in a state nobody described.
pub fn plan(readings: &[Reading]) -> Result<Plan> {
    let from = classify(readings);
    let outcome = match from {
        PatchState::Unpatched => Outcome::Applied,
        PatchState::Patched => Outcome::Reverted,
        PatchState::Indeterminate => return Err(indeterminate(readings)),
    };
    let writes = readings
        .iter()
        .map(|r| PlannedWrite {
            rule: r.rule,
            anchor: r.located.anchor.clone(),
            field: r.field.clone(),
            location: r.located.location,
            before: r.current,
            after: match outcome {
                Outcome::Applied => r.patched,
                Outcome::Reverted => r.original,
            },
        })
        .collect();
    Ok(Plan {
        from,
        outcome,
        writes,
    })
}

/// Builds the most specific error for readings that classify as indeterminate
fn indeterminate(readings: &[Reading]) -> PatchError {
    if readings.is_empty() {
        return PatchError::Descriptor("no toggle rules".into());
    }
    if let Some(r) = readings.iter().find(|r| r.state() == RuleState::Neither) {
        return PatchError::IndeterminateState {
            index: r.located.index,
            anchor: r.located.anchor.clone(),
            field: r.field.clone(),
            current: r.current,
            original: r.original,
            patched: r.patched,
        };
    }
    let by_state = |state| {
        readings
            .iter()
            .filter(|r| r.state() == state)
            .map(|r| r.rule)
            .collect::<Vec<_>>()
    };
    PatchError::PartialPatchDetected {
        original: by_state(RuleState::Original),
        patched: by_state(RuleState::Patched),
    }
}
