//! Package applications with `jpackage`

use crate::executable_path::{sibling_executable, JPACKAGE_EXECUTABLE_NAME};
use crate::internal::{absolute_module_path, clean_destination, resolved, run_tool, ToolArgs};
use crate::prelude::*;
use crate::toolchain::JavaCompiler;
use assemble_core::file_collection::{FileCollection, FileSet};
use assemble_core::lazy_evaluation::IntoProvider;
use assemble_core::provider;
use std::path::PathBuf;

/// Packages an application by running `jpackage`.
#[derive(Debug)]
pub struct JPackage {
    /// The module path to use when packaging the application
    pub module_path: FileSet,
    /// Root modules to resolve in addition to the initial modules from the module path. May
    /// also be `ALL-MODULE-PATH` to include all modules in the module path.
    pub add_modules: VecProp<String>,
    /// Additional arguments, passed after every other option except `--output`
    pub args: VecProp<String>,
    /// The `jpackage` executable to use
    pub executable: Prop<PathBuf>,
    /// Where the application package is created. Anything already there is deleted first.
    pub destination_directory: Prop<PathBuf>,
}

impl JPackage {
    /// Uses the `jpackage` next to the executable of a java compiler.
    pub fn executable_from<P>(&mut self, compiler: P) -> ProjectResult
    where
        P: IntoProvider<JavaCompiler>,
        P::Provider: 'static,
    {
        self.executable.set_with(
            compiler
                .into_provider()
                .map(|c| sibling_executable(&c.executable_path, JPACKAGE_EXECUTABLE_NAME)),
        )?;
        Ok(())
    }
}

impl CreateTask for JPackage {
    fn new(using_id: &TaskId, _project: &Project) -> ProjectResult<Self> {
        Ok(Self {
            module_path: FileSet::new(),
            add_modules: using_id.vec_prop("addModules")?,
            args: using_id.vec_prop("args")?,
            executable: using_id.prop("executable")?,
            destination_directory: using_id.prop("destinationDirectory")?,
        })
    }

    fn description() -> String {
        "Packages an application with jpackage".to_string()
    }
}

impl Task for JPackage {
    fn configure_io(task: &mut Executable<Self>, project: &Project) -> ProjectResult {
        let project_dir = project.project_dir().to_path_buf();
        let module_path = task.module_path.clone();
        let add_modules = task.add_modules.clone();
        let args = task.args.clone();
        let executable = resolved(&project_dir, &task.executable);
        let destination = resolved(&project_dir, &task.destination_directory);

        let work = task.work_mut();
        work.add_input_files(
            "modulePath",
            provider!(move || absolute_module_path(&project_dir, &module_path).roots()),
        )?;
        work.add_input::<Vec<String>, _>("addModules", add_modules)?;
        work.add_input::<Vec<String>, _>("args", args)?;
        work.add_input_executable("executable", executable)?;
        work.add_output_dir(destination);
        Ok(())
    }

    fn task_action(task: &mut Executable<Self>, project: &Project) -> BuildResult {
        let module_path = absolute_module_path(project.project_dir(), &task.module_path);
        let add_modules = task.add_modules.finalize_and_get()?;
        let args = task.args.finalize_and_get()?;
        let executable = project.file(task.executable.finalize_and_get()?);
        let destination = project.file(task.destination_directory.finalize_and_get()?);

        if clean_destination(project, &destination)? {
            debug!(
                "Deleted existing application package at '{}'.",
                destination.display()
            );
        }

        let mut program_args = ToolArgs::new();
        program_args.module_path(&module_path)?;
        program_args.add_modules(&add_modules);
        program_args.extra(&args);
        program_args.output(&destination);

        run_tool(
            project,
            JPACKAGE_EXECUTABLE_NAME,
            &executable,
            program_args.into_vec(),
        )
    }
}
