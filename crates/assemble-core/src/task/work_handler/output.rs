use crate::cryptography::Sha256;
use crate::task::up_to_date::UpToDate;
use crate::task::work_handler::fingerprint_directory;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// The fingerprint of the output directories of a task.
///
/// Each directory maps the relative path of every file within it to the hash of that file. A
/// directory that does not exist has no fingerprint.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Output {
    directories: BTreeMap<PathBuf, Option<BTreeMap<PathBuf, Sha256>>>,
}

impl Output {
    /// Fingerprints the given directories as they currently are on disk
    pub fn new<P: AsRef<Path>>(directories: impl IntoIterator<Item = P>) -> io::Result<Self> {
        let mut output = BTreeMap::new();
        for dir in directories {
            let dir = dir.as_ref();
            let fingerprint = if dir.exists() {
                Some(fingerprint_directory(dir)?)
            } else {
                None
            };
            output.insert(dir.to_path_buf(), fingerprint);
        }
        Ok(Self {
            directories: output,
        })
    }

    /// The fingerprint of a single directory
    pub fn directory(&self, dir: &Path) -> Option<&BTreeMap<PathBuf, Sha256>> {
        self.directories.get(dir).and_then(Option::as_ref)
    }
}

impl UpToDate for Output {
    /// Output is up to date if fingerprinting the same directories again gives the same result
    fn up_to_date(&self) -> bool {
        match Output::new(self.directories.keys()) {
            Ok(regenerated) => {
                let same = &regenerated == self;
                if !same {
                    debug!("outputs changed since last run");
                }
                same
            }
            Err(e) => {
                debug!("could not fingerprint outputs: {}", e);
                false
            }
        }
    }
}
