//! The command line of `assemble-jdk`

use assemble_core::logging::LoggingArgs;
use clap::Parser;
use std::path::{Path, PathBuf};

/// The name of the build file looked for in the current directory
pub const DEFAULT_BUILD_FILE: &str = "assemble.toml";

/// Runs jlink and jpackage tasks declared in a build file
#[derive(Debug, Clone, Parser)]
#[clap(name = "assemble-jdk", version, author)]
pub struct JdkArgs {
    #[clap(flatten)]
    logging: LoggingArgs,

    /// Use a build file other than `assemble.toml`
    #[clap(short = 'F', long)]
    #[clap(value_name = "FILE")]
    build_file: Option<PathBuf>,

    /// Run every requested task, even if it is up to date
    #[clap(long)]
    rerun_tasks: bool,

    /// Show the backtrace of configuration errors
    #[clap(short = 'B', long)]
    backtrace: bool,

    /// The tasks to run
    #[clap(help_heading = None)]
    #[clap(value_name = "TASK")]
    tasks: Vec<String>,
}

impl JdkArgs {
    /// Parses the args of this process
    pub fn from_env() -> Self {
        Self::parse()
    }

    /// Parses args from a command line, which does not include the program name
    pub fn try_command_line<S: AsRef<str>>(cmd: S) -> Result<Self, clap::Error> {
        Self::try_parse_from(std::iter::once("assemble-jdk").chain(cmd.as_ref().split_whitespace()))
    }

    /// Gets the logging args
    pub fn logging(&self) -> &LoggingArgs {
        &self.logging
    }

    /// The build file to read, relative paths are resolved against `dir`
    pub fn build_file(&self, dir: &Path) -> PathBuf {
        dir.join(
            self.build_file
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_BUILD_FILE)),
        )
    }

    /// Whether to always rerun tasks
    pub fn rerun_tasks(&self) -> bool {
        self.rerun_tasks
    }

    /// Whether to emit backtraces
    pub fn backtrace(&self) -> bool {
        self.backtrace
    }

    /// The requested tasks, in the order given
    pub fn tasks(&self) -> &[String] {
        &self.tasks[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use log::LevelFilter;

    #[test]
    fn can_render_help() {
        let help = JdkArgs::command().render_help();
        assert!(help.to_string().contains("--rerun-tasks"));
    }

    #[test]
    fn tasks_and_flags_in_any_position() {
        let args = JdkArgs::try_command_line("jlink --debug -F other.toml jpackage --rerun-tasks")
            .unwrap();
        assert_eq!(args.tasks(), ["jlink", "jpackage"]);
        assert_eq!(args.logging().log_level_filter(), LevelFilter::Debug);
        assert!(args.rerun_tasks());
        assert!(!args.backtrace());
        assert_eq!(
            args.build_file(Path::new("/project")),
            PathBuf::from("/project/other.toml")
        );
    }

    #[test]
    fn default_build_file() {
        let args = JdkArgs::try_command_line("-B").unwrap();
        assert!(args.backtrace());
        assert!(args.tasks().is_empty());
        assert_eq!(
            args.build_file(Path::new("/project")),
            Path::new("/project").join(DEFAULT_BUILD_FILE)
        );
    }

    #[test]
    fn disallow_unknown_option() {
        assert!(JdkArgs::try_command_line("--parallel jlink").is_err());
    }
}
