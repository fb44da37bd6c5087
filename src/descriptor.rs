//! # Descriptor
//!
//! Patch descriptors are the JSON documents that say which fields to toggle and between which two values.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{PatchError, Result};

/// A loaded and validated patch descriptor. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct PatchDescriptor {
    /// Short identifier, defaults to the descriptor's file stem
    #[serde(default)]
    pub id: String,
    /// Display name, defaults to `id`
    #[serde(default)]
    pub name: String,
    /// Entries that must exist under the game root
    #[serde(default)]
    pub root_contains: Vec<String>,
    /// Target file, relative to the game root
    #[serde(default)]
    pub file: String,
    /// Rules to toggle together
    #[serde(rename = "toggle", default)]
    pub toggles: Vec<ToggleRule>,
}

/// One field to toggle
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleRule {
    /// Strategy tag
    #[serde(rename = "type")]
    pub kind: String,
    /// Zero-based position of the record in its array
    #[serde(rename = "axis")]
    pub axis_index: usize,
    /// Expected name of that record
    #[serde(rename = "axis_name", default)]
    pub anchor_name: Option<String>,
    /// Field inside the record
    #[serde(rename = "field")]
    pub field_name: String,
    /// Value of the unpatched state
    pub original: Value,
    /// Value of the patched state
    pub patched: Value,
    /// Offset of the record array's count, skipping the scan
    #[serde(default)]
    pub array_offset: Option<usize>,
}
impl ToggleRule {
    /// The anchor to verify, if one was given
    pub fn anchor(&self) -> Option<&str> {
        self.anchor_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}

impl PatchDescriptor {
    /// Reads and validates a descriptor file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                PatchError::Descriptor(format!("patch file not found (\"{}\")", path.display()))
            }
            _ => PatchError::io(path, e),
        })?;
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("patch");
        Self::from_json(&text, stem)
    }

    /// Parses and validates a descriptor, using `fallback_id` when the document has no `id`
    pub fn from_json(text: &str, fallback_id: &str) -> Result<Self> {
        let mut descriptor: Self =
            serde_json::from_str(text).map_err(|e| PatchError::Descriptor(e.to_string()))?;
        if descriptor.id.trim().is_empty() {
            descriptor.id = fallback_id.to_string();
        }
        if descriptor.name.trim().is_empty() {
            descriptor.name = descriptor.id.clone();
        }
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Checks the invariants serde can't express
    pub fn validate(&self) -> Result<()> {
        if self.file.trim().is_empty() {
            return Err(PatchError::Descriptor(
                "missing required string: 'file'".into(),
            ));
        }
        if Path::new(&self.file).is_absolute() {
            return Err(PatchError::Descriptor(format!(
                "'file' must be relative to the game root, got {:?}",
                self.file
            )));
        }
        if self.toggles.is_empty() {
            return Err(PatchError::Descriptor(
                "missing required non-empty list: 'toggle'".into(),
            ));
        }
        if let Some(item) = self.root_contains.iter().find(|s| s.trim().is_empty()) {
            return Err(PatchError::Descriptor(format!(
                "empty 'root_contains' entry {item:?}"
            )));
        }
        for (i, rule) in self.toggles.iter().enumerate() {
            if rule.field_name.trim().is_empty() {
                return Err(PatchError::Descriptor(format!("toggle[{i}] has an empty 'field'")));
            }
            if rule.original == rule.patched {
                return Err(PatchError::Descriptor(format!(
                    "toggle[{i}] has identical 'original' and 'patched' values"
                )));
            }
        }
        Ok(())
    }

    /// Absolute path of the target file under `root`
    pub fn target_path(&self, root: &Path) -> PathBuf {
        root.join(&self.file)
    }
}
