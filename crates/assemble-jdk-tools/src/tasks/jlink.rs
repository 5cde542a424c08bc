//! Link runtime images with `jlink`

use crate::executable_path::{sibling_executable, JLINK_EXECUTABLE_NAME};
use crate::internal::{absolute_module_path, clean_destination, resolved, run_tool, ToolArgs};
use crate::prelude::*;
use crate::toolchain::JavaCompiler;
use assemble_core::file_collection::{FileCollection, FileSet};
use assemble_core::lazy_evaluation::IntoProvider;
use assemble_core::provider;
use std::path::PathBuf;

/// Links a runtime image by running `jlink`.
///
/// The destination directory is owned by this task, anything already there is deleted before
/// `jlink` runs.
#[derive(Debug)]
pub struct JLink {
    /// The module path to use when linking the runtime image
    pub module_path: FileSet,
    /// Root modules to resolve in addition to the initial modules from the module path. May
    /// also be `ALL-MODULE-PATH` to include all modules in the module path.
    pub add_modules: VecProp<String>,
    /// Whether to pass `--no-header-files`. `true` by default
    pub no_header_files: Prop<bool>,
    /// Whether to pass `--no-man-pages`. `true` by default
    pub no_man_pages: Prop<bool>,
    /// Additional arguments, passed after every other option except `--output`
    pub args: VecProp<String>,
    /// The `jlink` executable to use
    pub executable: Prop<PathBuf>,
    /// Where the runtime image is created
    pub destination_directory: Prop<PathBuf>,
}

impl JLink {
    /// Uses the `jlink` next to the executable of a java compiler.
    pub fn executable_from<P>(&mut self, compiler: P) -> ProjectResult
    where
        P: IntoProvider<JavaCompiler>,
        P::Provider: 'static,
    {
        self.executable.set_with(
            compiler
                .into_provider()
                .map(|c| sibling_executable(&c.executable_path, JLINK_EXECUTABLE_NAME)),
        )?;
        Ok(())
    }
}

impl CreateTask for JLink {
    fn new(using_id: &TaskId, _project: &Project) -> ProjectResult<Self> {
        let mut no_header_files = using_id.prop::<bool>("noHeaderFiles")?;
        no_header_files.set_convention(true)?;
        let mut no_man_pages = using_id.prop::<bool>("noManPages")?;
        no_man_pages.set_convention(true)?;
        Ok(Self {
            module_path: FileSet::new(),
            add_modules: using_id.vec_prop("addModules")?,
            no_header_files,
            no_man_pages,
            args: using_id.vec_prop("args")?,
            executable: using_id.prop("executable")?,
            destination_directory: using_id.prop("destinationDirectory")?,
        })
    }

    fn description() -> String {
        "Links a runtime image with jlink".to_string()
    }
}

impl Task for JLink {
    fn configure_io(task: &mut Executable<Self>, project: &Project) -> ProjectResult {
        let project_dir = project.project_dir().to_path_buf();
        let module_path = task.module_path.clone();
        let add_modules = task.add_modules.clone();
        let no_header_files = task.no_header_files.clone();
        let no_man_pages = task.no_man_pages.clone();
        let args = task.args.clone();
        let executable = resolved(&project_dir, &task.executable);
        let destination = resolved(&project_dir, &task.destination_directory);

        let work = task.work_mut();
        work.add_input_files(
            "modulePath",
            provider!(move || absolute_module_path(&project_dir, &module_path).roots()),
        )?;
        work.add_input::<Vec<String>, _>("addModules", add_modules)?;
        work.add_input::<bool, _>("noHeaderFiles", no_header_files)?;
        work.add_input::<bool, _>("noManPages", no_man_pages)?;
        work.add_input::<Vec<String>, _>("args", args)?;
        work.add_input_executable("executable", executable)?;
        work.add_output_dir(destination);
        Ok(())
    }

    fn task_action(task: &mut Executable<Self>, project: &Project) -> BuildResult {
        let module_path = absolute_module_path(project.project_dir(), &task.module_path);
        let add_modules = task.add_modules.finalize_and_get()?;
        let no_header_files = task.no_header_files.finalize_and_get()?;
        let no_man_pages = task.no_man_pages.finalize_and_get()?;
        let args = task.args.finalize_and_get()?;
        let executable = project.file(task.executable.finalize_and_get()?);
        let destination = project.file(task.destination_directory.finalize_and_get()?);

        if clean_destination(project, &destination)? {
            debug!("Deleted existing runtime image at '{}'.", destination.display());
        }

        let mut program_args = ToolArgs::new();
        program_args.module_path(&module_path)?;
        program_args.add_modules(&add_modules);
        program_args.flag("--no-header-files", no_header_files);
        program_args.flag("--no-man-pages", no_man_pages);
        program_args.extra(&args);
        program_args.output(&destination);

        run_tool(
            project,
            JLINK_EXECUTABLE_NAME,
            &executable,
            program_args.into_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::JavaInstallationMetadata;

    #[test]
    fn flags_default_to_true() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
        let handle = project.register_task::<JLink>("jlink").unwrap();
        let (headers, man_pages) = handle
            .configured(&project, |task| {
                (task.no_header_files.get(), task.no_man_pages.get())
            })
            .unwrap();
        assert!(headers);
        assert!(man_pages);
    }

    #[test]
    fn executable_from_compiler() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
        let handle = project.register_task::<JLink>("jlink").unwrap();
        let compiler = JavaCompiler {
            executable_path: PathBuf::from("/jdk/bin/javac"),
            metadata: JavaInstallationMetadata {
                installation_path: PathBuf::from("/jdk"),
                java_runtime_version: None,
                language_version: None,
            },
        };
        let executable = handle
            .configured(&project, move |task| {
                task.executable_from(Some(compiler)).unwrap();
                task.executable.get()
            })
            .unwrap();
        assert_eq!(executable, PathBuf::from("/jdk/bin/jlink"));
    }
}
