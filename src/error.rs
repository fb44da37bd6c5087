//! # Errors
//!
//! Every failure the engine can report. All of them are raised before a single byte reaches disk.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::codec::TypedValue;

/// Broad classification of a [`PatchError`], used by callers to decide how to report a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The game root, the target file, or the file system itself is the problem
    Environment,
    /// The patch descriptor is missing, malformed, or self-contradictory
    Descriptor,
    /// The container's layout is not what the record schema expects
    Format,
    /// The layout matched, but the values on disk are in neither declared state
    State,
}

/// Errors raised while locating, resolving, or writing toggles
#[derive(Debug, Error)]
pub enum PatchError {
    /// No directory satisfied every `root_contains` entry
    #[error("root sanity check failed at \"{}\" (missing: {})", .root.display(), .missing.join(", "))]
    RootNotFound {
        /// Last directory that was checked
        root: PathBuf,
        /// Entries that were not found under `root`
        missing: Vec<String>,
    },
    /// The target file does not exist or is not a regular file
    #[error("target file not found: \"{}\"", .0.display())]
    TargetFileNotFound(PathBuf),
    /// Another process holds the target file
    #[error("target file is in use by another process: \"{}\"", .0.display())]
    FileLocked(PathBuf),
    /// Underlying I/O failure on a specific path
    #[error("I/O error on \"{}\": {source}", .path.display())]
    Io {
        /// Path the operation was performed on
        path: PathBuf,
        /// Original error
        #[source]
        source: io::Error,
    },
    /// The descriptor could not be loaded or is invalid
    #[error("invalid patch descriptor: {0}")]
    Descriptor(String),
    /// A toggle rule names a strategy tag that is not registered
    #[error("unsupported toggle type: {0:?}")]
    UnsupportedToggleType(String),
    /// The requested record lies beyond the end of the record array
    #[error("axis index out of range: {index} (axes={count})")]
    IndexOutOfRange {
        /// Requested zero-based record index
        index: usize,
        /// Number of records in the array
        count: usize,
    },
    /// The container does not match the record schema
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    /// A value type cannot be represented by the field's wire type
    #[error("unsupported type for field {field:?}: {reason}")]
    UnsupportedType {
        /// Field the value was destined for
        field: String,
        /// What made the value unrepresentable
        reason: String,
    },
    /// A field holds neither its original nor its patched value
    #[error("unknown state for axis[{index}] {anchor:?}.{field}: current={current}, expected {original} or {patched}")]
    IndeterminateState {
        /// Record index of the offending rule
        index: usize,
        /// Name recovered from the record
        anchor: String,
        /// Field name
        field: String,
        /// Value currently on disk
        current: TypedValue,
        /// Declared original value
        original: TypedValue,
        /// Declared patched value
        patched: TypedValue,
    },
    /// Some rules read as original while others read as patched
    #[error("mixed apply/revert across entries: rules {original:?} are original, rules {patched:?} are patched")]
    PartialPatchDetected {
        /// Rule positions currently holding their original value
        original: Vec<usize>,
        /// Rule positions currently holding their patched value
        patched: Vec<usize>,
    },
}

impl PatchError {
    /// Wraps an [`io::Error`] with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classifies this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RootNotFound { .. }
            | Self::TargetFileNotFound(_)
            | Self::FileLocked(_)
            | Self::Io { .. } => ErrorKind::Environment,
            Self::Descriptor(_) | Self::UnsupportedToggleType(_) => ErrorKind::Descriptor,
            Self::IndexOutOfRange { .. }
            | Self::SchemaMismatch(_)
            | Self::UnsupportedType { .. } => ErrorKind::Format,
            Self::IndeterminateState { .. } | Self::PartialPatchDetected { .. } => ErrorKind::State,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PatchError>;
