//! Contains the java base and jdk tools plugins

use crate::executable_path::{
    sibling_executable, JLINK_EXECUTABLE_NAME, JPACKAGE_EXECUTABLE_NAME,
};
use crate::extensions::JavaPluginExtension;
use crate::prelude::*;
use crate::tasks::jlink::JLink;
use crate::tasks::jpackage::JPackage;
use crate::toolchain::{JavaCompiler, JavaToolchainService};
use assemble_core::lazy_evaluation::anonymous::AnonymousProvider;

/// The name of the [`JavaPluginExtension`](JavaPluginExtension)
pub const JAVA_EXTENSION: &str = "java";
/// The name of the [`JavaToolchainService`](JavaToolchainService) extension
pub const JAVA_TOOLCHAINS_EXTENSION: &str = "javaToolchains";

/// Adds the java toolchain extensions to a project
#[derive(Debug, Default)]
pub struct JavaBasePlugin;

impl Plugin for JavaBasePlugin {
    fn apply(&self, project: &mut Project) -> ProjectResult {
        project
            .extensions_mut()
            .add(JAVA_EXTENSION, JavaPluginExtension::new())?;
        project
            .extensions_mut()
            .add(JAVA_TOOLCHAINS_EXTENSION, JavaToolchainService::new())?;
        Ok(())
    }
}

/// The jdk tools plugin.
///
/// Once the [`JavaBasePlugin`](JavaBasePlugin) is applied, every [`JLink`](JLink) and
/// [`JPackage`](JPackage) task uses the tool from the project's java toolchain as its default
/// executable, including tasks that were already created. No tasks are registered.
#[derive(Debug, Default)]
pub struct JdkToolsPlugin;

impl Plugin for JdkToolsPlugin {
    fn apply(&self, project: &mut Project) -> ProjectResult {
        project.with_plugin::<JavaBasePlugin, _>(|project| {
            project.with_type::<JLink, _>(|task, project| {
                let compiler = toolchain_compiler(project)?;
                task.executable.set_convention_with(
                    compiler.map(|c| sibling_executable(&c.executable_path, JLINK_EXECUTABLE_NAME)),
                )?;
                Ok(())
            })?;
            project.with_type::<JPackage, _>(|task, project| {
                let compiler = toolchain_compiler(project)?;
                task.executable.set_convention_with(compiler.map(|c| {
                    sibling_executable(&c.executable_path, JPACKAGE_EXECUTABLE_NAME)
                }))?;
                Ok(())
            })
        })
    }
}

/// The compiler of the toolchain configured in the java extension
fn toolchain_compiler(project: &Project) -> ProjectResult<AnonymousProvider<JavaCompiler>> {
    let java = project.extension::<JavaPluginExtension>()?;
    let toolchains = project.extension::<JavaToolchainService>()?;
    Ok(toolchains.compiler_for(java.toolchain.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::JavaToolchainSpec;
    use std::path::PathBuf;

    #[test]
    fn no_tasks_registered() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
        project.apply_plugin::<JavaBasePlugin>().unwrap();
        project.apply_plugin::<JdkToolsPlugin>().unwrap();
        assert!(project.task_container().is_empty());
    }

    #[test]
    fn extensions_added_by_java_base() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
        project.apply_plugin::<JavaBasePlugin>().unwrap();
        let java = project.extension::<JavaPluginExtension>().unwrap();
        assert_eq!(java.toolchain.get(), JavaToolchainSpec::default());
        assert!(project.extension::<JavaToolchainService>().is_ok());
    }

    #[test]
    fn convention_waits_for_java_base() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
        let home = dir.path().join("jdk");
        project.apply_plugin::<JdkToolsPlugin>().unwrap();

        let jlink = project.register_task::<JLink>("jlink").unwrap();
        project.apply_plugin::<JavaBasePlugin>().unwrap();
        project
            .extension_mut::<JavaPluginExtension>()
            .unwrap()
            .toolchain
            .set(JavaToolchainSpec {
                language_version: None,
                installation: Some(home.clone()),
            })
            .unwrap();

        let jpackage = project.register_task::<JPackage>("jpackage").unwrap();

        let jlink_exe = jlink
            .configured(&project, |task| task.executable.try_get())
            .unwrap();
        assert_eq!(jlink_exe, None, "no installation exists yet");

        std::fs::create_dir_all(home.join("bin")).unwrap();
        std::fs::write(
            home.join("bin").join(format!("javac{}", std::env::consts::EXE_SUFFIX)),
            "",
        )
        .unwrap();

        let expected = |tool: &str| -> PathBuf {
            home.join("bin")
                .join(format!("{}{}", tool, std::env::consts::EXE_SUFFIX))
        };
        assert_eq!(
            jlink
                .configured(&project, |task| task.executable.try_get())
                .unwrap(),
            Some(expected("jlink"))
        );
        assert_eq!(
            jpackage
                .configured(&project, |task| task.executable.try_get())
                .unwrap(),
            Some(expected("jpackage"))
        );
    }

    #[test]
    fn tasks_created_before_java_base_get_convention() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
        let home = dir.path().join("jdk");
        std::fs::create_dir_all(home.join("bin")).unwrap();
        std::fs::write(
            home.join("bin").join(format!("javac{}", std::env::consts::EXE_SUFFIX)),
            "",
        )
        .unwrap();

        project.apply_plugin::<JdkToolsPlugin>().unwrap();
        let jlink = project.register_task::<JLink>("jlink").unwrap();
        jlink.resolve(&project).unwrap();
        assert!(jlink.is_configured());

        project
            .with_plugin::<JavaBasePlugin, _>(move |project| {
                project
                    .extension_mut::<JavaPluginExtension>()?
                    .toolchain
                    .set(JavaToolchainSpec {
                        language_version: None,
                        installation: Some(home),
                    })?;
                Ok(())
            })
            .unwrap();
        project.apply_plugin::<JavaBasePlugin>().unwrap();

        let executable = jlink
            .configured(&project, |task| task.executable.try_get())
            .unwrap();
        assert_eq!(
            executable,
            Some(
                dir.path()
                    .join("jdk")
                    .join("bin")
                    .join(format!("jlink{}", std::env::consts::EXE_SUFFIX))
            )
        );
    }
}
