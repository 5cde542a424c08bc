//! The exec spec helps with defining executables

use assemble_core::prelude::{ProjectError, ProjectResult};
use log::Level;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::str::Bytes;
use std::string::FromUtf8Error;
use std::thread::JoinHandle;
use std::{io, thread};

/// Input for exec
#[derive(Debug, Default, Clone)]
pub enum Input {
    /// No input
    #[default]
    Null,
    /// Get input bytes from a byte vector
    Bytes(Vec<u8>),
}

impl From<&[u8]> for Input {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Input {
    fn from(c: Vec<u8>) -> Self {
        Self::Bytes(c)
    }
}

impl<'a> From<Bytes<'a>> for Input {
    fn from(b: Bytes<'a>) -> Self {
        Self::Bytes(b.collect())
    }
}

impl From<&str> for Input {
    fn from(str: &str) -> Self {
        Self::from(str.bytes())
    }
}

/// Output types for exec
#[derive(Debug, Clone)]
pub enum Output {
    /// Throw the output away
    Null,
    /// Stream the output into the logger at a given level, one record per line
    Log(Level),
    /// Stream the output into a byte vector
    Bytes,
    /// Stream the output into the logger at a given level while also keeping the bytes
    Tee(Level),
}

impl From<Level> for Output {
    fn from(lvl: Level) -> Self {
        Output::Log(lvl)
    }
}

/// The exec spec helps define something to execute by the project
#[derive(Debug, Clone)]
pub struct ExecSpec {
    /// The working directory to run the executable in
    pub working_dir: PathBuf,
    /// The executable
    pub executable: OsString,
    /// The command line args for the executable
    pub clargs: Vec<OsString>,
    /// The environment variables for the executable.
    ///
    /// # Warning
    /// **ONLY** the environment variables in this map will be passed to the executable.
    pub env: HashMap<OsString, OsString>,
    /// The input to the program, if needed
    pub input: Input,
    /// Where the program's stdout is emitted
    pub output: Output,
    /// Where the program's stderr is emitted
    pub output_err: Output,
}

impl ExecSpec {
    /// The working directory of the exec spec. If the path is relative, then the relative
    /// path is calculated relative to the the base directory of a project.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The executable to run
    pub fn executable(&self) -> &OsStr {
        &self.executable
    }

    /// Command line args for the exec spec
    pub fn args(&self) -> &[OsString] {
        &self.clargs[..]
    }

    /// The environment variables for the exec spec
    pub fn env(&self) -> &HashMap<OsString, OsString> {
        &self.env
    }

    /// Try to executes an exec-spec, using the given path to resolve the current directory. If
    /// creating the program is successful, returns an [`ExecHandle`](ExecHandle). The program's
    /// output is drained on separate threads while it runs.
    ///
    /// # Error
    /// This method will return an error if the input of the spec can't be opened, or the
    /// executable specified by this spec can't be started.
    pub fn execute_spec<P>(self, path: P) -> ProjectResult<ExecHandle>
    where
        P: AsRef<Path>,
    {
        let working_dir = self.resolve_working_dir(path.as_ref());
        ExecHandle::create(self, &working_dir)
    }

    fn resolve_working_dir(&self, path: &Path) -> PathBuf {
        if self.working_dir().is_absolute() {
            self.working_dir.to_path_buf()
        } else {
            path.join(&self.working_dir)
        }
    }
}

/// Builds exec specs
#[derive(Debug)]
pub struct ExecSpecBuilder {
    /// The working directory to run the executable in
    pub working_dir: Option<PathBuf>,
    /// The executable
    pub executable: Option<OsString>,
    /// The command line args for the executable
    pub clargs: Vec<OsString>,
    /// The environment variables for the executable. By default, the exec spec will
    /// inherit from the parent process, including variables that aren't valid unicode.
    ///
    /// # Warning
    /// **ONLY** The environment variables in this map will be passed to the executable.
    pub env: HashMap<OsString, OsString>,
    stdin: Input,
    output: Output,
    output_err: Output,
}

/// An exec spec configuration error
#[derive(Debug, thiserror::Error)]
#[error("{}", error)]
pub struct ExecSpecBuilderError {
    error: String,
}

impl From<&str> for ExecSpecBuilderError {
    fn from(s: &str) -> Self {
        Self {
            error: s.to_string(),
        }
    }
}

impl From<ExecSpecBuilderError> for ProjectError {
    fn from(e: ExecSpecBuilderError) -> Self {
        ProjectError::custom(e)
    }
}

assemble_core::payload_from!(ExecSpecBuilderError, ProjectError);

impl Default for ExecSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecSpecBuilder {
    /// Create a new [ExecSpecBuilder](Self).
    ///
    /// Standard out is relayed at the info level and standard error at the warn level. Both are
    /// also captured, so they can be reported if the program fails.
    pub fn new() -> Self {
        Self {
            working_dir: Some(PathBuf::new()),
            executable: None,
            clargs: vec![],
            env: Self::default_env(),
            stdin: Input::default(),
            output: Output::Tee(Level::Info),
            output_err: Output::Tee(Level::Warn),
        }
    }

    /// The default environment variables
    pub fn default_env() -> HashMap<OsString, OsString> {
        std::env::vars_os().collect()
    }

    /// Add an arg to the command
    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.clargs.push(arg.as_ref().to_os_string());
        self
    }

    /// Add many args to the command
    pub fn args<I, S: AsRef<OsStr>>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
    {
        self.clargs
            .extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Add an arg to the command
    pub fn with_arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.arg(arg);
        self
    }

    /// Add many args to the command
    pub fn with_args<I, S: AsRef<OsStr>>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        self.args(args);
        self
    }

    /// Set the executable for the exec spec
    pub fn exec<E: AsRef<OsStr>>(&mut self, exec: E) -> &mut Self {
        self.executable = Some(exec.as_ref().to_os_string());
        self
    }

    /// Set the executable for the exec spec
    pub fn with_exec<E: AsRef<OsStr>>(mut self, exec: E) -> Self {
        self.exec(exec);
        self
    }

    /// Set the working directory for the exec spec. If the path is relative, it will be
    /// resolved to the project directory.
    pub fn working_dir<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        self.working_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the standard input for the executable. doesn't need to be set
    pub fn stdin<In>(&mut self, input: In) -> &mut Self
    where
        In: Into<Input>,
    {
        self.stdin = input.into();
        self
    }

    /// Set the standard input for the executable. doesn't need to be set
    pub fn with_stdin<In>(mut self, input: In) -> Self
    where
        In: Into<Input>,
    {
        self.stdin(input);
        self
    }

    /// Sets the output type for this exec spec
    pub fn stdout<O>(&mut self, output: O) -> &mut Self
    where
        O: Into<Output>,
    {
        self.output = output.into();
        self
    }

    /// Sets the output type for this exec spec
    pub fn with_stdout<O>(mut self, output: O) -> Self
    where
        O: Into<Output>,
    {
        self.stdout(output);
        self
    }

    /// Sets the error output type for this exec spec
    pub fn stderr<O>(&mut self, output: O) -> &mut Self
    where
        O: Into<Output>,
    {
        self.output_err = output.into();
        self
    }

    /// Sets the error output type for this exec spec
    pub fn with_stderr<O>(mut self, output: O) -> Self
    where
        O: Into<Output>,
    {
        self.stderr(output);
        self
    }

    /// Build the exec spec from the builder
    ///
    /// # Error
    /// Will return an error if the working directory or the executable isn't set.
    pub fn build(self) -> Result<ExecSpec, ExecSpecBuilderError> {
        Ok(ExecSpec {
            working_dir: self
                .working_dir
                .ok_or_else(|| ExecSpecBuilderError::from("Working directory not set"))?,
            executable: self
                .executable
                .ok_or_else(|| ExecSpecBuilderError::from("Executable not set"))?,
            clargs: self.clargs,
            env: self.env,
            input: self.stdin,
            output: self.output,
            output_err: self.output_err,
        })
    }
}

/// A handle into a running exec spec. Can be waited on to get the result.
pub struct ExecHandle {
    executable: OsString,
    handle: JoinHandle<io::Result<ExecResult>>,
}

impl ExecHandle {
    fn create(spec: ExecSpec, working_dir: &Path) -> ProjectResult<Self> {
        let mut command = Command::new(&spec.executable);
        command
            .current_dir(working_dir)
            .env_clear()
            .envs(&spec.env)
            .args(spec.args());

        let input = match &spec.input {
            Input::Null => Stdio::null(),
            Input::Bytes(b) => {
                let mut file = tempfile::tempfile()?;
                file.write_all(&b[..])?;
                file.seek(SeekFrom::Start(0))?;
                Stdio::from(file)
            }
        };
        command.stdin(input);
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let output = RealizedOutput::try_from(spec.output.clone())?;
        let output_err = RealizedOutput::try_from(spec.output_err.clone())?;

        trace!("attempting to execute command: {:?}", command);
        trace!("working_dir: {:?}", working_dir);
        let mut child = command.spawn()?;
        let executable = spec.executable;

        let handle = thread::spawn(move || -> io::Result<ExecResult> {
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| io::Error::new(ErrorKind::BrokenPipe, "stdout not piped"))?;
            let stderr = child
                .stderr
                .take()
                .ok_or_else(|| io::Error::new(ErrorKind::BrokenPipe, "stderr not piped"))?;

            thread::scope(|scope| {
                let out_join = scope.spawn(move || drain(stdout, output));
                let err_join = scope.spawn(move || drain(stderr, output_err));

                let code = child.wait()?;
                let bytes = out_join.join().map_err(|_| {
                    io::Error::new(ErrorKind::Interrupted, "emitting to output failed")
                })??;
                let bytes_err = err_join.join().map_err(|_| {
                    io::Error::new(ErrorKind::Interrupted, "emitting to error failed")
                })??;
                Ok(ExecResult {
                    code,
                    bytes,
                    bytes_err,
                })
            })
        });

        Ok(Self { executable, handle })
    }

    /// Wait for the exec spec handle to finish
    pub fn wait(self) -> ProjectResult<ExecResult> {
        let result = self.handle.join().map_err(|_| {
            ProjectError::custom(format!(
                "Couldn't join thread running {:?}",
                self.executable
            ))
        })??;
        Ok(result)
    }
}

/// Copies everything from a reader into an output line by line. Returns the captured bytes if the
/// output keeps them.
fn drain<R: Read>(reader: R, mut output: RealizedOutput) -> io::Result<Option<Vec<u8>>> {
    let mut reader = BufReader::new(reader);
    let mut line = vec![];
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        output.write_all(&line)?;
    }
    output.flush()?;
    Ok(output.into_bytes())
}

impl TryFrom<Output> for RealizedOutput {
    type Error = io::Error;

    fn try_from(value: Output) -> Result<Self, Self::Error> {
        match value {
            Output::Null => Ok(Self::Null),
            Output::Log(log) => Ok(Self::Log(log)),
            Output::Bytes => Ok(Self::Bytes(vec![])),
            Output::Tee(log) => Ok(Self::Tee(log, vec![])),
        }
    }
}

enum RealizedOutput {
    Null,
    Log(Level),
    Bytes(Vec<u8>),
    Tee(Level, Vec<u8>),
}

impl RealizedOutput {
    fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            RealizedOutput::Bytes(b) | RealizedOutput::Tee(_, b) => Some(b),
            _ => None,
        }
    }
}

fn log_line(level: Level, buf: &[u8]) {
    let line = String::from_utf8_lossy(buf);
    log!(level, "{}", line.trim_end_matches(&['\r', '\n'][..]));
}

impl Write for RealizedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            RealizedOutput::Null => Ok(buf.len()),
            RealizedOutput::Log(l) => {
                log_line(*l, buf);
                Ok(buf.len())
            }
            RealizedOutput::Bytes(b) => {
                b.extend_from_slice(buf);
                Ok(buf.len())
            }
            RealizedOutput::Tee(l, b) => {
                log_line(*l, buf);
                b.extend_from_slice(buf);
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Gets the result of the exec spec
#[derive(Debug)]
pub struct ExecResult {
    code: ExitStatus,
    bytes: Option<Vec<u8>>,
    bytes_err: Option<Vec<u8>>,
}

impl ExecResult {
    /// Gets the exit code for the exec spec
    pub fn code(&self) -> ExitStatus {
        self.code
    }

    /// Gets whether the exec spec is a success
    pub fn success(&self) -> bool {
        self.code.success()
    }

    /// Make this an error if exit code is not success. A program killed by a signal is not a
    /// success.
    pub fn expect_success(self) -> Result<Self, ExecError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ExecError {
                status: self.code,
                stdout: lossy(self.bytes()),
                stderr: lossy(self.bytes_err()),
            })
        }
    }

    /// Gets the output, in bytes, if the original exec spec kept its output
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// Try to convert the output bytes into a string
    pub fn utf8_string(&self) -> Option<Result<String, FromUtf8Error>> {
        self.bytes().map(|s| String::from_utf8(s.to_vec()))
    }

    /// Gets the error output, in bytes, if the original exec spec kept its error output
    pub fn bytes_err(&self) -> Option<&[u8]> {
        self.bytes_err.as_deref()
    }
}

fn lossy(bytes: Option<&[u8]>) -> String {
    bytes
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default()
}

/// A program exited unsuccessfully
#[derive(Debug, thiserror::Error)]
#[error("process failed with {status}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
pub struct ExecError {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl ExecError {
    /// The exit status of the program
    pub fn status(&self) -> ExitStatus {
        self.status
    }

    /// Everything the program emitted to standard out
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Everything the program emitted to standard error
    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_exec_spec() {
        let mut builder = ExecSpecBuilder::new();
        builder.exec("echo").arg("hello, world");
        let exec = builder.build().unwrap();
        assert_eq!(exec.executable, "echo");
        assert_eq!(exec.args(), &[OsString::from("hello, world")]);
    }

    #[test]
    fn missing_executable_is_a_builder_error() {
        let error = ExecSpecBuilder::new().build().unwrap_err();
        assert_eq!(error.to_string(), "Executable not set");
    }

    #[cfg(unix)]
    #[test]
    fn can_execute_spec() {
        let spec = ExecSpecBuilder::new()
            .with_exec("echo")
            .with_args(["hello", "world"])
            .with_stdout(Output::Bytes)
            .build()
            .expect("Couldn't build exec spec");

        let result = spec.execute_spec("/").expect("Couldn't create handle");
        let wait = result.wait().expect("couldn't finish exec spec");
        let bytes = wait.utf8_string().unwrap().unwrap();
        assert_eq!("hello world", bytes.trim());
    }

    #[cfg(unix)]
    #[test]
    fn stdin_bytes_are_read_from_start() {
        let spec = ExecSpecBuilder::new()
            .with_exec("cat")
            .with_stdin("from stdin")
            .build()
            .unwrap();

        let result = spec.execute_spec("/").unwrap().wait().unwrap();
        assert_eq!(result.utf8_string().unwrap().unwrap(), "from stdin");
    }

    #[cfg(unix)]
    #[test]
    fn failure_captures_output() {
        let spec = ExecSpecBuilder::new()
            .with_exec("sh")
            .with_args(["-c", "echo out; echo err >&2; exit 3"])
            .build()
            .unwrap();

        let result = spec.execute_spec("/").unwrap().wait().unwrap();
        assert!(!result.success());
        let error = result.expect_success().unwrap_err();
        assert_eq!(error.status().code(), Some(3));
        assert_eq!(error.stdout().trim(), "out");
        assert_eq!(error.stderr().trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_environment_is_passed_through() {
        use std::os::unix::ffi::OsStrExt;

        let value = OsStr::from_bytes(b"\xff\xfe");
        std::env::set_var("ASSEMBLE_EXEC_NON_UNICODE", value);
        let spec = ExecSpecBuilder::new()
            .with_exec("sh")
            .with_args(["-c", "printf %s \"$ASSEMBLE_EXEC_NON_UNICODE\""])
            .with_stdout(Output::Bytes)
            .build()
            .unwrap();
        let result = spec.execute_spec("/").and_then(|handle| handle.wait());
        std::env::remove_var("ASSEMBLE_EXEC_NON_UNICODE");

        let result = result.unwrap();
        assert!(result.success());
        assert_eq!(result.bytes(), Some(&b"\xff\xfe"[..]));
    }

    #[test]
    fn invalid_exec_can_be_detected() {
        let spec = ExecSpecBuilder::new()
            .with_exec("please-dont-exist")
            .with_stdout(Output::Null)
            .build()
            .expect("couldn't build");

        let spawn = spec.execute_spec("/");

        assert!(spawn.is_err(), "Should return an error");
    }
}
