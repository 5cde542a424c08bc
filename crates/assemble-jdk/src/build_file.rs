//! The `assemble.toml` build file
//!
//! ```toml
//! [project]
//! name = "app"
//!
//! [java.toolchain]
//! language-version = 17
//!
//! [tasks.image]
//! type = "jlink"
//! module-path = ["build/libs/app.jar"]
//! add-modules = ["app"]
//! destination-directory = "build/image"
//! ```

use assemble_core::file_collection::FileSet;
use assemble_core::prelude::*;
use assemble_jdk_tools::extensions::JavaPluginExtension;
use assemble_jdk_tools::toolchain::JavaToolchainSpec;
use assemble_jdk_tools::{JLink, JPackage, JavaBasePlugin, JdkToolsPlugin};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{fs, io};

/// An error occurred while reading a build file
#[derive(Debug, thiserror::Error)]
pub enum BuildFileError {
    /// The build file could not be read
    #[error("Could not read build file {path:?}: {error}")]
    Read {
        /// The path of the build file
        path: PathBuf,
        /// The underlying error
        error: io::Error,
    },
    /// The build file is not valid
    #[error("Invalid build file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The contents of a build file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildFile {
    #[serde(default)]
    project: ProjectDeclaration,
    java: Option<JavaDeclaration>,
    #[serde(default)]
    tasks: BTreeMap<String, TaskDeclaration>,
}

/// The `[project]` table
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ProjectDeclaration {
    /// The id of the project. Defaults to the name of the project directory
    pub name: Option<String>,
    /// The build directory
    pub build_dir: Option<PathBuf>,
}

/// The `[java]` table. Its presence applies the java base plugin.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JavaDeclaration {
    /// The toolchain the jdk tools are taken from
    #[serde(default)]
    pub toolchain: JavaToolchainSpec,
}

/// A `[tasks.<name>]` table
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum TaskDeclaration {
    /// A [`JLink`](JLink) task
    #[serde(rename = "jlink")]
    JLink(JLinkDeclaration),
    /// A [`JPackage`](JPackage) task
    #[serde(rename = "jpackage")]
    JPackage(JPackageDeclaration),
}

/// The configuration of a [`JLink`](JLink) task
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct JLinkDeclaration {
    #[serde(default)]
    module_path: Vec<PathBuf>,
    #[serde(default)]
    add_modules: Vec<String>,
    no_header_files: Option<bool>,
    no_man_pages: Option<bool>,
    #[serde(default)]
    args: Vec<String>,
    destination_directory: PathBuf,
    executable: Option<PathBuf>,
}

impl JLinkDeclaration {
    fn configure(self, task: &mut JLink) -> ProjectResult {
        configure_tool(
            ToolDeclaration {
                module_path: self.module_path,
                add_modules: self.add_modules,
                args: self.args,
                destination_directory: self.destination_directory,
                executable: self.executable,
            },
            ToolProperties {
                module_path: &mut task.module_path,
                add_modules: &mut task.add_modules,
                args: &mut task.args,
                destination_directory: &mut task.destination_directory,
                executable: &mut task.executable,
            },
        )?;
        if let Some(no_header_files) = self.no_header_files {
            task.no_header_files.set(no_header_files)?;
        }
        if let Some(no_man_pages) = self.no_man_pages {
            task.no_man_pages.set(no_man_pages)?;
        }
        Ok(())
    }
}

/// The configuration of a [`JPackage`](JPackage) task
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct JPackageDeclaration {
    #[serde(default)]
    module_path: Vec<PathBuf>,
    #[serde(default)]
    add_modules: Vec<String>,
    #[serde(default)]
    args: Vec<String>,
    destination_directory: PathBuf,
    executable: Option<PathBuf>,
}

impl JPackageDeclaration {
    fn configure(self, task: &mut JPackage) -> ProjectResult {
        configure_tool(
            ToolDeclaration {
                module_path: self.module_path,
                add_modules: self.add_modules,
                args: self.args,
                destination_directory: self.destination_directory,
                executable: self.executable,
            },
            ToolProperties {
                module_path: &mut task.module_path,
                add_modules: &mut task.add_modules,
                args: &mut task.args,
                destination_directory: &mut task.destination_directory,
                executable: &mut task.executable,
            },
        )
    }
}

struct ToolDeclaration {
    module_path: Vec<PathBuf>,
    add_modules: Vec<String>,
    args: Vec<String>,
    destination_directory: PathBuf,
    executable: Option<PathBuf>,
}

struct ToolProperties<'a> {
    module_path: &'a mut FileSet,
    add_modules: &'a mut VecProp<String>,
    args: &'a mut VecProp<String>,
    destination_directory: &'a mut Prop<PathBuf>,
    executable: &'a mut Prop<PathBuf>,
}

fn configure_tool(declared: ToolDeclaration, task: ToolProperties) -> ProjectResult {
    task.module_path.extend(declared.module_path);
    task.add_modules.push_all(declared.add_modules)?;
    task.args.push_all(declared.args)?;
    task.destination_directory
        .set(declared.destination_directory)?;
    if let Some(executable) = declared.executable {
        task.executable.set(executable)?;
    }
    Ok(())
}

impl FromStr for BuildFile {
    type Err = BuildFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl BuildFile {
    /// Reads a build file
    pub fn read(path: impl AsRef<Path>) -> Result<Self, BuildFileError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|error| BuildFileError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        contents.parse()
    }

    /// The `[project]` table
    pub fn project(&self) -> &ProjectDeclaration {
        &self.project
    }

    /// The declared tasks, by name
    pub fn tasks(&self) -> &BTreeMap<String, TaskDeclaration> {
        &self.tasks
    }

    /// Creates the project described by this build file.
    ///
    /// The jdk tools plugin is always applied. The java base plugin, and with it the toolchain
    /// conventions of the tasks, is only applied when the file has a `[java]` table. Tasks are
    /// registered lazily.
    pub fn into_project(self, project_dir: impl AsRef<Path>) -> ProjectResult<Project> {
        let project_dir = project_dir.as_ref();
        let mut project = match &self.project.name {
            Some(name) => Project::in_dir_with_id(project_dir, name)?,
            None => Project::in_dir(project_dir)?,
        };
        if let Some(build_dir) = &self.project.build_dir {
            project.set_build_dir(build_dir)?;
        }

        project.apply_plugin::<JdkToolsPlugin>()?;
        if let Some(java) = self.java {
            let mut toolchain = java.toolchain;
            toolchain.installation = toolchain.installation.map(|home| project.file(home));
            project.apply_plugin::<JavaBasePlugin>()?;
            project
                .extension_mut::<JavaPluginExtension>()?
                .toolchain
                .set(toolchain)?;
        }

        for (name, declaration) in self.tasks {
            match declaration {
                TaskDeclaration::JLink(declaration) => {
                    project
                        .register_task::<JLink>(&name)?
                        .configure_with(move |task, _| declaration.configure(task))?;
                }
                TaskDeclaration::JPackage(declaration) => {
                    project
                        .register_task::<JPackage>(&name)?
                        .configure_with(move |task, _| declaration.configure(task))?;
                }
            }
        }
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assemble_jdk_tools::toolchain::JavaToolchainService;

    #[test]
    fn empty_build_file() {
        let build_file = BuildFile::from_str("").unwrap();
        assert!(build_file.tasks().is_empty());
        assert!(build_file.project().name.is_none());
    }

    #[test]
    fn task_types() {
        let build_file = BuildFile::from_str(
            r#"
            [tasks.image]
            type = "jlink"
            module-path = ["libs/a.jar", "mods"]
            add-modules = ["java.base"]
            no-man-pages = false
            destination-directory = "build/image"

            [tasks.package]
            type = "jpackage"
            args = ["--name", "app"]
            destination-directory = "build/package"
            executable = "/opt/jdk/bin/jpackage"
            "#,
        )
        .unwrap();
        let tasks = build_file.tasks();
        match &tasks["image"] {
            TaskDeclaration::JLink(jlink) => {
                assert_eq!(jlink.module_path.len(), 2);
                assert_eq!(jlink.no_man_pages, Some(false));
                assert_eq!(jlink.no_header_files, None);
            }
            other => panic!("expected jlink, got {:?}", other),
        }
        match &tasks["package"] {
            TaskDeclaration::JPackage(jpackage) => {
                assert_eq!(jpackage.args, ["--name", "app"]);
                assert_eq!(
                    jpackage.executable.as_deref(),
                    Some(Path::new("/opt/jdk/bin/jpackage"))
                );
            }
            other => panic!("expected jpackage, got {:?}", other),
        }
    }

    #[test]
    fn unknown_task_type_is_rejected() {
        assert!(BuildFile::from_str(
            r#"
            [tasks.compile]
            type = "javac"
            destination-directory = "out"
            "#
        )
        .is_err());
    }

    #[test]
    fn unknown_task_field_is_rejected() {
        assert!(BuildFile::from_str(
            r#"
            [tasks.image]
            type = "jlink"
            strip-debug = true
            destination-directory = "out"
            "#
        )
        .is_err());
    }

    #[test]
    fn destination_is_required() {
        assert!(BuildFile::from_str(
            r#"
            [tasks.image]
            type = "jlink"
            "#
        )
        .is_err());
    }

    #[test]
    fn configures_project() {
        let dir = tempfile::tempdir().unwrap();
        let build_file = BuildFile::from_str(
            r#"
            [project]
            name = "app"
            build-dir = "out"

            [java.toolchain]
            language-version = 17
            installation = "jdk"

            [tasks.image]
            type = "jlink"
            module-path = ["libs/a.jar"]
            no-header-files = false
            destination-directory = "out/image"
            "#,
        )
        .unwrap();
        let project = build_file.into_project(dir.path()).unwrap();
        assert_eq!(project.id().to_string(), ":app");
        assert_eq!(project.build_dir(), dir.path().join("out"));
        assert!(project.extension::<JavaToolchainService>().is_ok());
        assert_eq!(
            project
                .extension::<JavaPluginExtension>()
                .unwrap()
                .toolchain
                .get(),
            JavaToolchainSpec {
                language_version: Some(17),
                installation: Some(dir.path().join("jdk")),
            }
        );

        let id = project.find_task_id("image").unwrap();
        let handle = project.task_container().get_typed::<JLink>(&id).unwrap();
        assert!(!handle.is_configured());
        let (headers, man_pages, destination) = handle
            .configured(&project, |task| {
                (
                    task.no_header_files.get(),
                    task.no_man_pages.get(),
                    task.destination_directory.get(),
                )
            })
            .unwrap();
        assert!(!headers);
        assert!(man_pages);
        assert_eq!(destination, PathBuf::from("out/image"));
    }

    #[test]
    fn java_base_only_with_java_table() {
        let dir = tempfile::tempdir().unwrap();
        let project = BuildFile::default().into_project(dir.path()).unwrap();
        assert!(project.extension::<JavaPluginExtension>().is_err());
    }
}
