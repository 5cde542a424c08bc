#![cfg(unix)]

use assemble_core::prelude::*;
use assemble_core::task::TaskOutcome;
use assemble_jdk_tools::extensions::JavaPluginExtension;
use assemble_jdk_tools::toolchain::JavaToolchainSpec;
use assemble_jdk_tools::{JLink, JPackage, JavaBasePlugin, JdkToolsPlugin};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Tests write executables then run them. Running them one at a time keeps a concurrently forked
/// child from holding a writable handle to another test's script.
static LOCK: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Writes a stand-in tool that records its arguments, one per line, and creates the directory
/// passed to `--output`.
fn fake_tool(path: &Path, exit_code: i32) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let script = format!(
        r#"#!/bin/sh
printf '%s\n' "$@" > "{args}"
prev=""
for arg in "$@"; do
    if [ "$prev" = "--output" ]; then out="$arg"; fi
    prev="$arg"
done
mkdir -p "$out"
echo "image" > "$out/release"
echo "linking into $out"
exit {exit_code}
"#,
        args = args_file(path).display(),
        exit_code = exit_code
    );
    fs::write(path, script).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_path_buf()
}

fn args_file(tool: &Path) -> PathBuf {
    tool.with_extension("args")
}

fn recorded_args(tool: &Path) -> Vec<String> {
    fs::read_to_string(args_file(tool))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn count_files(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .map(|path| if path.is_dir() { count_files(&path) } else { 1 })
        .sum()
}

fn configure_jlink(
    project: &mut Project,
    executable: &Path,
    config: impl FnOnce(&mut JLink) -> ProjectResult + Send + Sync + 'static,
) -> TaskHandle<JLink> {
    let handle = project.register_task::<JLink>("jlink").unwrap();
    let executable = executable.to_path_buf();
    handle
        .configure_with(move |task, _| {
            task.executable.set(executable)?;
            task.destination_directory.set("build/image")?;
            config(&mut task.task)
        })
        .unwrap();
    handle
}

#[test]
fn default_jlink_arguments() {
    let _lock = lock();
    let dir = tempfile::tempdir().unwrap();
    let tool = fake_tool(&dir.path().join("jdk/bin/jlink"), 0);
    let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jlink = configure_jlink(&mut project, &tool, |_| Ok(()));

    assert_eq!(jlink.execute(&project, false).unwrap(), TaskOutcome::Executed);
    assert_eq!(
        recorded_args(&tool),
        [
            "--no-header-files".to_string(),
            "--no-man-pages".to_string(),
            "--output".to_string(),
            dir.path().join("build/image").display().to_string(),
        ]
    );
    assert!(dir.path().join("build/image/release").is_file());
}

#[test]
fn jlink_arguments_in_order() {
    let _lock = lock();
    let dir = tempfile::tempdir().unwrap();
    let tool = fake_tool(&dir.path().join("jdk/bin/jlink"), 0);
    fs::create_dir_all(dir.path().join("libs")).unwrap();
    fs::write(dir.path().join("libs/a.jar"), "a").unwrap();
    fs::create_dir_all(dir.path().join("mods")).unwrap();

    let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jlink = configure_jlink(&mut project, &tool, |task| {
        task.module_path.add("libs/a.jar");
        task.module_path.add("mods");
        task.module_path.add("libs/a.jar");
        task.add_modules.push_all(["java.base", "java.sql"])?;
        task.no_man_pages.set(false)?;
        task.args.push("--strip-debug")?;
        Ok(())
    });

    jlink.execute(&project, false).unwrap();
    let module_path = format!(
        "{}:{}",
        dir.path().join("libs/a.jar").display(),
        dir.path().join("mods").display()
    );
    assert_eq!(
        recorded_args(&tool),
        [
            "-p".to_string(),
            module_path,
            "--add-modules".to_string(),
            "java.base,java.sql".to_string(),
            "--no-header-files".to_string(),
            "--strip-debug".to_string(),
            "--output".to_string(),
            dir.path().join("build/image").display().to_string(),
        ]
    );
}

#[test]
fn relative_and_absolute_module_path_entries_collapse() {
    let _lock = lock();
    let dir = tempfile::tempdir().unwrap();
    let tool = fake_tool(&dir.path().join("jdk/bin/jlink"), 0);
    let absolute_jar = dir.path().join("libs/a.jar");
    let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jlink = configure_jlink(&mut project, &tool, move |task| {
        task.module_path.add("libs/a.jar");
        task.module_path.add(&absolute_jar);
        Ok(())
    });

    jlink.execute(&project, false).unwrap();
    let args = recorded_args(&tool);
    assert_eq!(args[0], "-p");
    assert_eq!(args[1], dir.path().join("libs/a.jar").display().to_string());
    assert_eq!(args[2], "--no-header-files");
}

#[test]
fn jpackage_arguments_in_order() {
    let _lock = lock();
    let dir = tempfile::tempdir().unwrap();
    let tool = fake_tool(&dir.path().join("jdk/bin/jpackage"), 0);
    let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jpackage = project.register_task::<JPackage>("jpackage").unwrap();
    let executable = tool.clone();
    jpackage
        .configure_with(move |task, _| {
            task.executable.set(executable)?;
            task.destination_directory.set("build/package")?;
            task.add_modules.push("ALL-MODULE-PATH")?;
            task.args.push_all(["--name", "app"])?;
            Ok(())
        })
        .unwrap();

    jpackage.execute(&project, false).unwrap();
    assert_eq!(
        recorded_args(&tool),
        [
            "--add-modules".to_string(),
            "ALL-MODULE-PATH".to_string(),
            "--name".to_string(),
            "app".to_string(),
            "--output".to_string(),
            dir.path().join("build/package").display().to_string(),
        ]
    );
}

#[test]
fn second_run_is_up_to_date() {
    let _lock = lock();
    let dir = tempfile::tempdir().unwrap();
    let tool = fake_tool(&dir.path().join("jdk/bin/jlink"), 0);
    let image = dir.path().join("build/image");

    let mut first = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jlink = configure_jlink(&mut first, &tool, |_| Ok(()));
    assert_eq!(jlink.execute(&first, false).unwrap(), TaskOutcome::Executed);
    let produced = fs::read(image.join("release")).unwrap();

    let mut second = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jlink = configure_jlink(&mut second, &tool, |_| Ok(()));
    assert_eq!(jlink.execute(&second, false).unwrap(), TaskOutcome::UpToDate);

    fs::write(image.join("stale"), "left over").unwrap();
    let mut forced = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jlink = configure_jlink(&mut forced, &tool, |_| Ok(()));
    assert_eq!(jlink.execute(&forced, true).unwrap(), TaskOutcome::Executed);
    assert!(!image.join("stale").exists(), "destination is deleted first");
    assert_eq!(fs::read(image.join("release")).unwrap(), produced);
    assert_eq!(count_files(&image), 1);
}

#[test]
fn changed_input_runs_again() {
    let _lock = lock();
    let dir = tempfile::tempdir().unwrap();
    let tool = fake_tool(&dir.path().join("jdk/bin/jlink"), 0);

    let mut first = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jlink = configure_jlink(&mut first, &tool, |_| Ok(()));
    jlink.execute(&first, false).unwrap();

    let mut second = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jlink = configure_jlink(&mut second, &tool, |task| {
        task.add_modules.push("java.base")?;
        Ok(())
    });
    assert_eq!(jlink.execute(&second, false).unwrap(), TaskOutcome::Executed);
}

#[test]
fn failing_tool_fails_task_without_history() {
    let _lock = lock();
    let dir = tempfile::tempdir().unwrap();
    let tool = fake_tool(&dir.path().join("jdk/bin/jlink"), 1);
    let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jlink = configure_jlink(&mut project, &tool, |_| Ok(()));

    let error = jlink.execute(&project, false).unwrap_err();
    let message = error.to_string();
    assert!(message.contains("exit status: 1"), "{}", message);
    assert!(message.contains("linking into"), "{}", message);
    assert!(dir.path().join("build/image").exists(), "partial output is kept");
    assert_eq!(count_files(&project.task_history_dir()), 0);

    fake_tool(&tool, 0);
    let mut retry = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jlink = configure_jlink(&mut retry, &tool, |_| Ok(()));
    assert_eq!(jlink.execute(&retry, false).unwrap(), TaskOutcome::Executed);
    assert_eq!(count_files(&retry.task_history_dir()), 1);
}

#[test]
fn missing_executable_fails_before_running() {
    let _lock = lock();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("jdk/bin/jlink");
    let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jlink = configure_jlink(&mut project, &missing, |_| Ok(()));

    let error = jlink.execute(&project, false).unwrap_err();
    assert!(error.to_string().contains("missing file"), "{}", error);
    assert!(!dir.path().join("build/image").exists());
}

#[test]
fn non_executable_file_is_rejected() {
    let _lock = lock();
    let dir = tempfile::tempdir().unwrap();
    let tool = fake_tool(&dir.path().join("jdk/bin/jlink"), 0);
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o644)).unwrap();
    let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
    let jlink = configure_jlink(&mut project, &tool, |_| Ok(()));

    let error = jlink.execute(&project, false).unwrap_err();
    assert!(error.to_string().contains("not an executable"), "{}", error);
    assert!(!args_file(&tool).exists());
}

#[test]
fn no_toolchain_and_no_executable() {
    let _lock = lock();
    let dir = tempfile::tempdir().unwrap();
    let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
    project.apply_plugin::<JdkToolsPlugin>().unwrap();
    let jlink = project.register_task::<JLink>("jlink").unwrap();
    jlink
        .configure_with(|task, _| {
            task.destination_directory.set("build/image")?;
            Ok(())
        })
        .unwrap();

    let error = jlink.execute(&project, false).unwrap_err();
    assert!(error.to_string().contains("has no value"), "{}", error);
}

#[test]
fn executable_from_toolchain() {
    let _lock = lock();
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().join("jdk-17");
    fs::create_dir_all(home.join("bin")).unwrap();
    fs::write(home.join("bin/javac"), "").unwrap();
    fs::write(home.join("release"), "JAVA_VERSION=\"17.0.2\"\n").unwrap();
    let tool = fake_tool(&home.join("bin/jlink"), 0);

    let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
    project.apply_plugin::<JdkToolsPlugin>().unwrap();
    project.apply_plugin::<JavaBasePlugin>().unwrap();
    project
        .extension_mut::<JavaPluginExtension>()
        .unwrap()
        .toolchain
        .set(JavaToolchainSpec {
            language_version: Some(17),
            installation: Some(home.clone()),
        })
        .unwrap();
    assert!(project.task_container().is_empty());

    let jlink = project.register_task::<JLink>("jlink").unwrap();
    jlink
        .configure_with(|task, _| {
            task.destination_directory.set("build/image")?;
            task.add_modules.push("java.base")?;
            Ok(())
        })
        .unwrap();

    assert_eq!(jlink.execute(&project, false).unwrap(), TaskOutcome::Executed);
    assert_eq!(recorded_args(&tool)[0], "--add-modules");
}

#[test]
#[ignore = "requires a JDK at JAVA_HOME"]
fn link_real_runtime_image() {
    if std::env::var_os("JAVA_HOME").is_none() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let mut project = Project::in_dir_with_id(dir.path(), "app").unwrap();
    project.apply_plugin::<JavaBasePlugin>().unwrap();
    project.apply_plugin::<JdkToolsPlugin>().unwrap();

    let jlink = project.register_task::<JLink>("jlink").unwrap();
    jlink
        .configure_with(|task, _| {
            task.destination_directory.set("build/jlink-image")?;
            task.add_modules.push("java.base")?;
            Ok(())
        })
        .unwrap();

    assert_eq!(jlink.execute(&project, false).unwrap(), TaskOutcome::Executed);
    assert!(dir.path().join("build/jlink-image/release").is_file());
}
