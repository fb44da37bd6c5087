//! # Target
//!
//! Exclusive, whole-file access to the container being patched. The file is read once, mutated only in memory,
//! and written back with a single flush while the lock is still held.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{PatchError, Result};

/// Windows' `ERROR_SHARING_VIOLATION`, returned when another process has the file open
#[cfg(windows)]
const ERROR_SHARING_VIOLATION: i32 = 32;

/// A target file loaded into memory and locked for the duration of one run
#[derive(Debug)]
pub struct TargetFile {
    /// Where the file lives
    path: PathBuf,
    /// Locked handle, kept open until the file is committed or dropped
    file: File,
    /// Full file contents
    data: Vec<u8>,
    /// Length at load time
    len: usize,
}
impl TargetFile {
    /// Opens `path` for exclusive read/write access and reads it fully
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PatchError::TargetFileNotFound(path.to_path_buf()));
        }

        let mut options = OpenOptions::new();
        options.read(true).write(true);
        #[cfg(windows)]
        {
            use std::os::windows::fs::OpenOptionsExt;
            options.share_mode(0);
        }
        let mut file = options.open(path).map_err(|e| open_error(path, e))?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if is_contended(&e) => return Err(PatchError::FileLocked(path.to_path_buf())),
            Err(e) => return Err(PatchError::io(path, e)),
        }

        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| PatchError::io(path, e))?;
        let len = data.len();
        debug!(path = %path.display(), len, "loaded target file");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            data,
            len,
        })
    }

    /// Contents as loaded
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable contents. A slice, so the length can't change.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Writes the buffer back over the file in one pass, syncs it, and releases the lock
    pub fn commit(mut self) -> Result<()> {
        if self.data.len() != self.len {
            return Err(PatchError::SchemaMismatch(format!(
                "buffer length changed from {} to {}",
                self.len,
                self.data.len()
            )));
        }
        let path = self.path.clone();
        let io_err = |e| PatchError::io(&path, e);
        self.file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        self.file.write_all(&self.data).map_err(io_err)?;
        self.file.sync_all().map_err(io_err)?;
        debug!(path = %self.path.display(), len = self.len, "flushed target file");
        Ok(())
    }
}

/// Maps an open failure, treating Windows sharing violations as a held lock
fn open_error(path: &Path, e: io::Error) -> PatchError {
    #[cfg(windows)]
    if e.raw_os_error() == Some(ERROR_SHARING_VIOLATION) {
        return PatchError::FileLocked(path.to_path_buf());
    }
    match e.kind() {
        io::ErrorKind::NotFound => PatchError::TargetFileNotFound(path.to_path_buf()),
        _ => PatchError::io(path, e),
    }
}

/// Whether a lock attempt failed because someone else holds the lock
fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
