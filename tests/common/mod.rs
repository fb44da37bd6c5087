//! Synthetic Unity-style containers holding an `InputManager.m_Axes` array

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use input_patcher::PatchDescriptor;

/// Per-axis values that tests vary
#[derive(Debug, Clone)]
pub struct Axis {
    pub name: String,
    pub dead: f32,
    pub snap: bool,
    pub invert: bool,
    pub kind: i32,
    pub axis: i32,
    pub joy_num: i32,
}

/// Axis with default keyboard settings
pub fn axis(name: &str) -> Axis {
    Axis {
        name: name.to_string(),
        dead: 0.001,
        snap: false,
        invert: false,
        kind: 0,
        axis: 0,
        joy_num: 0,
    }
}

/// The stock five-axis layout
pub fn five_axes() -> Vec<Axis> {
    ["Horizontal", "Vertical", "Fire1", "Mouse Y", "Mouse ScrollWheel"]
        .iter()
        .map(|name| axis(name))
        .collect()
}

/// Serializes `axes` after a `header_words`-word header and before a short trailer
pub fn container(axes: &[Axis], header_words: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    for i in 0..header_words {
        buf.extend_from_slice(&(0xf000_0000u32 | i as u32).to_le_bytes());
    }
    buf.extend_from_slice(&(axes.len() as u32).to_le_bytes());
    for a in axes {
        string(&mut buf, &a.name);
        string(&mut buf, &format!("{} (descriptive)", a.name));
        string(&mut buf, "");
        string(&mut buf, "down");
        string(&mut buf, "up");
        string(&mut buf, "");
        string(&mut buf, "");
        buf.extend_from_slice(&1000.0f32.to_le_bytes());
        buf.extend_from_slice(&a.dead.to_le_bytes());
        buf.extend_from_slice(&0.1f32.to_le_bytes());
        buf.push(u8::from(a.snap));
        buf.push(u8::from(a.invert));
        align(&mut buf);
        buf.extend_from_slice(&a.kind.to_le_bytes());
        buf.extend_from_slice(&a.axis.to_le_bytes());
        buf.extend_from_slice(&a.joy_num.to_le_bytes());
    }
    buf.extend_from_slice(&[0xff; 16]);
    buf
}

/// Length-prefixed padded string
fn string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    align(buf);
}

/// Zero padding to four bytes
fn align(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

/// Descriptor JSON with one `legacy_axis_field` rule per `(axis, name, field, original, patched)`
pub fn descriptor(rules: &[(usize, &str, &str, &str, &str)]) -> PatchDescriptor {
    let toggles: Vec<String> = rules
        .iter()
        .map(|(axis, name, field, original, patched)| {
            format!(
                r#"{{"type": "legacy_axis_field", "axis": {axis}, "axis_name": "{name}", "field": "{field}", "original": {original}, "patched": {patched}}}"#
            )
        })
        .collect();
    let text = format!(
        r#"{{"id": "test", "name": "Test", "root_contains": ["Game_Data"], "file": "Game_Data/globalgamemanagers", "toggle": [{}]}}"#,
        toggles.join(",")
    );
    PatchDescriptor::from_json(&text, "test").unwrap()
}

/// Lays out a fake installation with `data` as its target file, returning the target's path
pub fn install(root: &Path, data: &[u8]) -> PathBuf {
    let data_dir = root.join("Game_Data");
    fs::create_dir_all(&data_dir).unwrap();
    let target = data_dir.join("globalgamemanagers");
    fs::write(&target, data).unwrap();
    target
}
