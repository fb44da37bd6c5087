//! # Root
//!
//! Finding the game installation a descriptor belongs to, and the descriptor itself in quick mode.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{PatchError, Result};

/// Descriptor file name used when none is given
pub const DEFAULT_DESCRIPTOR: &str = "patch.json";

/// Entries of `items` that don't exist under `root`
pub fn missing_entries(root: &Path, items: &[String]) -> Vec<String> {
    items
        .iter()
        .filter(|item| !root.join(item).exists())
        .cloned()
        .collect()
}

/// Checks `start` against `items`, falling back to its parent once
///
/// The fallback covers launching from inside the data directory instead of the installation root.
pub fn resolve_root(start: &Path, items: &[String]) -> Result<PathBuf> {
    if items.is_empty() {
        return Ok(start.to_path_buf());
    }
    let missing = missing_entries(start, items);
    if missing.is_empty() {
        return Ok(start.to_path_buf());
    }
    let parent = match start.parent() {
        Some(parent) if parent != start && !parent.as_os_str().is_empty() => parent,
        _ => {
            return Err(PatchError::RootNotFound {
                root: start.to_path_buf(),
                missing,
            })
        }
    };
    info!(
        root = %start.display(),
        parent = %parent.display(),
        "root check failed, trying parent"
    );
    let missing = missing_entries(parent, items);
    if missing.is_empty() {
        Ok(parent.to_path_buf())
    } else {
        Err(PatchError::RootNotFound {
            root: parent.to_path_buf(),
            missing,
        })
    }
}

/// Resolves the descriptor path
///
/// Absolute paths are used as given. Relative paths are looked up next to the executable first, then under the game
/// root. When neither exists the executable-relative path is returned so the error names where it was expected.
pub fn resolve_descriptor(arg: &Path, exe_dir: Option<&Path>, root: &Path) -> PathBuf {
    if arg.is_absolute() {
        return arg.to_path_buf();
    }
    let candidates: Vec<PathBuf> = exe_dir
        .into_iter()
        .map(|dir| dir.join(arg))
        .chain(std::iter::once(root.join(arg)))
        .collect();
    for candidate in &candidates {
        debug!(candidate = %candidate.display(), "looking for descriptor");
        if candidate.is_file() {
            return candidate.clone();
        }
    }
    candidates
        .into_iter()
        .next()
        .unwrap_or_else(|| root.join(arg))
}
