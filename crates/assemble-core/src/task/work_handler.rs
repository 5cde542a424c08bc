//! Fingerprints the inputs and outputs of a task, and keeps the history of its last successful
//! execution.

use crate::cryptography::{hash_file_sha256, Sha256};
use crate::identifier::TaskId;
use crate::lazy_evaluation::anonymous::AnonymousProvider;
use crate::lazy_evaluation::{IntoProvider, Provider};
use crate::project::error::{ProjectError, ProjectResult};
use crate::task::up_to_date::UpToDate;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::fs::{create_dir_all, File};
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub mod input;
pub mod output;
pub mod serializer;

use input::Input;
use output::Output;

/// How much of the path of an input file is part of its fingerprint
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum PathSensitivity {
    /// The absolute path and the contents of the file
    #[default]
    Absolute,
    /// Only the contents of the file
    None,
}

type Fingerprinter = Box<dyn Fn() -> ProjectResult<String> + Send + Sync>;

/// Handles the inputs and outputs of a task
pub struct WorkHandler {
    task_id: TaskId,
    cache_location: PathBuf,
    inputs: IndexMap<String, Fingerprinter>,
    outputs: Vec<AnonymousProvider<PathBuf>>,
    final_input: OnceCell<Input>,
    execution_history: OnceCell<Option<TaskExecutionHistory>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TaskExecutionHistory {
    input: Input,
    output: Output,
}

impl Debug for WorkHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkHandler")
            .field("task_id", &self.task_id)
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .field("outputs", &self.outputs.len())
            .finish_non_exhaustive()
    }
}

impl WorkHandler {
    /// Creates a work handler that stores history within `cache_loc`
    pub fn new(id: &TaskId, cache_loc: PathBuf) -> Self {
        Self {
            task_id: id.clone(),
            cache_location: cache_loc,
            inputs: IndexMap::new(),
            outputs: vec![],
            final_input: OnceCell::new(),
            execution_history: OnceCell::new(),
        }
    }

    /// The file execution history is stored in
    pub fn history_file(&self) -> PathBuf {
        self.cache_location
            .join(self.task_id.as_path())
            .with_extension("ron")
    }

    /// Whether this task declares both inputs and outputs. Tasks without both are never up to
    /// date.
    pub fn has_inputs_and_outputs(&self) -> bool {
        !self.inputs.is_empty() && !self.outputs.is_empty()
    }

    fn add_fingerprinter(&mut self, id: &str, fingerprinter: Fingerprinter) -> ProjectResult {
        if self.final_input.get().is_some() {
            return Err(ProjectError::custom(format!(
                "inputs of {} were already fingerprinted",
                self.task_id
            ))
            .into());
        }
        if self.inputs.contains_key(id) {
            return Err(ProjectError::DuplicateInput(id.to_string()).into());
        }
        self.inputs.insert(id.to_string(), fingerprinter);
        Ok(())
    }

    /// Adds a value input. The value is fingerprinted by its serialized form.
    pub fn add_input<T, P>(&mut self, id: &str, value: P) -> ProjectResult
    where
        T: Serialize + Send + Sync + Clone + 'static,
        P: IntoProvider<T>,
        P::Provider: 'static,
    {
        let provider = value.into_provider();
        self.add_fingerprinter(
            id,
            Box::new(move || {
                let value = provider.fallible_get()?;
                serializer::to_string(&value)
            }),
        )
    }

    /// Adds a single input file. The file must exist when the inputs are fingerprinted.
    pub fn add_input_file<P>(
        &mut self,
        id: &str,
        value: P,
        sensitivity: PathSensitivity,
    ) -> ProjectResult
    where
        P: IntoProvider<PathBuf>,
        P::Provider: 'static,
    {
        let provider = value.into_provider();
        let task_id = self.task_id.clone();
        let input = id.to_string();
        self.add_fingerprinter(
            id,
            Box::new(move || {
                let path = provider.fallible_get()?;
                if !path.is_file() {
                    return Err(ProjectError::MissingInputFile {
                        task: task_id.clone(),
                        input: input.clone(),
                        path,
                    }
                    .into());
                }
                InputFile::new(&path, sensitivity).fingerprint()
            }),
        )
    }

    /// Adds an input file that must be an executable. Only the contents of the executable are part
    /// of the fingerprint.
    pub fn add_input_executable<P>(&mut self, id: &str, value: P) -> ProjectResult
    where
        P: IntoProvider<PathBuf>,
        P::Provider: 'static,
    {
        let provider = value.into_provider();
        let task_id = self.task_id.clone();
        let input = id.to_string();
        self.add_fingerprinter(
            id,
            Box::new(move || {
                let path = provider.fallible_get()?;
                if !path.is_file() {
                    return Err(ProjectError::MissingInputFile {
                        task: task_id.clone(),
                        input: input.clone(),
                        path,
                    }
                    .into());
                }
                if !is_executable(&path)? {
                    return Err(ProjectError::InputFileNotExecutable {
                        task: task_id.clone(),
                        input: input.clone(),
                        path,
                    }
                    .into());
                }
                InputFile::new(&path, PathSensitivity::None).fingerprint()
            }),
        )
    }

    /// Adds an ordered list of paths as an input. Each path is fingerprinted by its contents, with
    /// directories walked. Paths that don't exist are recorded as missing.
    pub fn add_input_files<P>(&mut self, id: &str, roots: P) -> ProjectResult
    where
        P: IntoProvider<Vec<PathBuf>>,
        P::Provider: 'static,
    {
        let provider = roots.into_provider();
        self.add_fingerprinter(
            id,
            Box::new(move || {
                let roots = provider.fallible_get()?;
                let data = roots
                    .into_iter()
                    .map(|root| {
                        let fingerprint = RootFingerprint::new(&root)?;
                        Ok((root, fingerprint))
                    })
                    .collect::<io::Result<Vec<_>>>()?;
                serializer::to_string(&data)
            }),
        )
    }

    /// Adds an output directory
    pub fn add_output_dir<P>(&mut self, dir: P)
    where
        P: IntoProvider<PathBuf>,
        P::Provider: 'static,
    {
        self.outputs.push(AnonymousProvider::new(dir));
    }

    /// Fingerprints every input. Only happens once, later calls return the same fingerprint.
    pub fn get_input(&self) -> ProjectResult<&Input> {
        self.final_input.get_or_try_init(|| {
            let mut fingerprints = BTreeMap::new();
            for (id, fingerprinter) in &self.inputs {
                trace!("fingerprinting input {:?} of {}", id, self.task_id);
                fingerprints.insert(id.clone(), fingerprinter()?);
            }
            Ok(Input::new(&self.task_id, fingerprints))
        })
    }

    /// Fingerprints the output directories as they are now
    pub fn get_output(&self) -> ProjectResult<Output> {
        let dirs = self
            .outputs
            .iter()
            .map(|dir| dir.fallible_get())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Output::new(dirs)?)
    }

    /// Removes execution history, if it exists.
    pub fn remove_execution_history(&self) -> io::Result<()> {
        let file_location = self.history_file();
        if file_location.exists() {
            trace!("removing history of {} at {:?}", self.task_id, file_location);
            std::fs::remove_file(file_location)?;
        }
        Ok(())
    }

    /// Stores execution history. Does nothing unless there are both inputs and outputs.
    pub fn store_execution_history(&self) -> ProjectResult {
        if !self.has_inputs_and_outputs() {
            return Ok(());
        }
        let history = TaskExecutionHistory {
            input: self.get_input()?.clone(),
            output: self.get_output()?,
        };
        let file_location = self.history_file();
        if let Some(parent) = file_location.parent() {
            create_dir_all(parent)?;
        }

        let mut file = File::create(&file_location)?;
        file.write_all(serializer::to_string(&history)?.as_bytes())?;
        trace!("stored history of {} at {:?}", self.task_id, file_location);
        Ok(())
    }

    fn try_get_execution_history(&self) -> Option<&TaskExecutionHistory> {
        self.execution_history
            .get_or_init(|| {
                let file_location = self.history_file();
                let contents = std::fs::read_to_string(&file_location).ok()?;
                match serializer::from_str(contents) {
                    Ok(history) => Some(history),
                    Err(e) => {
                        warn!("ignoring unreadable task history {:?}: {}", file_location, e);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// The inputs and outputs of the last successful execution, if any
    pub fn prev_work(&self) -> Option<(&Input, &Output)> {
        self.try_get_execution_history()
            .map(|history| (&history.input, &history.output))
    }
}

impl UpToDate for WorkHandler {
    /// A task is up to date if it has inputs and outputs, and neither have changed since the last
    /// successful execution
    fn up_to_date(&self) -> bool {
        if !self.has_inputs_and_outputs() {
            return false;
        }
        let (prev_input, prev_output) = match self.prev_work() {
            Some(prev) => prev,
            None => {
                debug!("no previous execution of {}", self.task_id);
                return false;
            }
        };
        let input = match self.get_input() {
            Ok(input) => input,
            Err(_) => return false,
        };
        !input.input_changed(Some(prev_input)) && prev_output.up_to_date()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    Ok(path.metadata()?.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> io::Result<bool> {
    Ok(path.is_file())
}

/// Hashes every file within a directory, by path relative to that directory
pub(crate) fn fingerprint_directory(dir: &Path) -> io::Result<BTreeMap<PathBuf, Sha256>> {
    let mut output = BTreeMap::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            let relative = entry
                .path()
                .strip_prefix(dir)
                .unwrap_or_else(|_| entry.path())
                .to_path_buf();
            output.insert(relative, hash_file_sha256(entry.path())?);
        }
    }
    Ok(output)
}

/// An input file, fingerprinted by its contents and optionally its path
#[derive(Debug)]
struct InputFile<'p> {
    path: &'p Path,
    sensitivity: PathSensitivity,
}

#[derive(Serialize)]
struct InputFileData<'p> {
    path: Option<&'p Path>,
    data: Sha256,
}

impl<'p> InputFile<'p> {
    fn new(path: &'p Path, sensitivity: PathSensitivity) -> Self {
        Self { path, sensitivity }
    }

    fn fingerprint(&self) -> ProjectResult<String> {
        let data = InputFileData {
            path: match self.sensitivity {
                PathSensitivity::Absolute => Some(self.path),
                PathSensitivity::None => None,
            },
            data: hash_file_sha256(self.path)?,
        };
        serializer::to_string(&data)
    }
}

#[derive(Debug, Serialize)]
enum RootFingerprint {
    Missing,
    File(Sha256),
    Directory(BTreeMap<PathBuf, Sha256>),
}

impl RootFingerprint {
    fn new(root: &Path) -> io::Result<Self> {
        if root.is_dir() {
            Ok(RootFingerprint::Directory(fingerprint_directory(root)?))
        } else if root.is_file() {
            Ok(RootFingerprint::File(hash_file_sha256(root)?))
        } else {
            Ok(RootFingerprint::Missing)
        }
    }
}
