//! Deleting files and directories

use std::fs;
use std::io;
use std::io::ErrorKind;
use std::path::Path;

/// The result of some unit of work on the file system
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WorkResult {
    did_work: bool,
}

impl WorkResult {
    /// Create a new work result
    pub fn new(did_work: bool) -> Self {
        Self { did_work }
    }

    /// Whether anything was changed
    pub fn did_work(&self) -> bool {
        self.did_work
    }
}

/// Deletes a file or a directory, recursively. Deleting something that doesn't exist does no
/// work.
pub fn delete(path: &Path) -> io::Result<WorkResult> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(WorkResult::new(false)),
        Err(e) => return Err(e),
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    trace!("deleted {:?}", path);
    Ok(WorkResult::new(true))
}
