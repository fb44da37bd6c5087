#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::missing_crate_level_docs)]
#![doc = include_str!("../README.md")]

pub mod codec;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod patcher;
pub mod resolver;
pub mod root;
pub mod schema;
pub mod target;
pub mod walker;

#[cfg(test)]
mod testutil;

pub use descriptor::{PatchDescriptor, ToggleRule};
pub use engine::{apply_or_revert, inspect_file, PatchReport};
pub use error::{ErrorKind, PatchError, Result};
pub use resolver::{Outcome, PatchState};
