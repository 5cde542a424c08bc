#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::{Mutex, MutexGuard};

static LOCK: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A stand-in `jlink` that creates the `--output` directory, then exits with `exit_code`
fn fake_jlink(dir: &Path, exit_code: i32) {
    let bin = dir.join("jdk").join("bin");
    fs::create_dir_all(&bin).unwrap();
    fs::write(bin.join("javac"), "#!/bin/sh\n").unwrap();
    let script = format!(
        r#"#!/bin/sh
prev=""
for arg in "$@"; do
    if [ "$prev" = "--output" ]; then out="$arg"; fi
    prev="$arg"
done
mkdir -p "$out"
echo "image" > "$out/release"
exit {}
"#,
        exit_code
    );
    let jlink = bin.join("jlink");
    fs::write(&jlink, script).unwrap();
    fs::set_permissions(&jlink, fs::Permissions::from_mode(0o755)).unwrap();
}

fn build_file(dir: &Path) {
    fs::write(
        dir.join("assemble.toml"),
        r#"
[project]
name = "app"

[java.toolchain]
installation = "jdk"

[tasks.image]
type = "jlink"
add-modules = ["java.base"]
destination-directory = "build/image"
"#,
    )
    .unwrap();
}

fn assemble_jdk(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_assemble-jdk"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

#[test]
fn runs_task_with_toolchain_executable() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    fake_jlink(dir.path(), 0);
    build_file(dir.path());

    let output = assemble_jdk(dir.path(), &["image"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", stdout);
    assert!(dir.path().join("build/image/release").is_file());
    assert!(stdout.contains("BUILD SUCCESSFUL"), "{}", stdout);

    let output = assemble_jdk(dir.path(), &["image"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("UP-TO-DATE"), "{}", stdout);
}

#[test]
fn failing_tool_exits_with_failure() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    fake_jlink(dir.path(), 1);
    build_file(dir.path());

    let output = assemble_jdk(dir.path(), &["image"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("BUILD FAILED"), "{}", stdout);
}

#[test]
fn unknown_task_exits_with_failure() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    build_file(dir.path());

    let output = assemble_jdk(dir.path(), &["package"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn missing_build_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = assemble_jdk(dir.path(), &["-F", "other.toml", "image"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("other.toml"), "{}", stdout);
}
