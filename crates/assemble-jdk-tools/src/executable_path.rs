//! Finds the tools that live next to the compiler of a JDK

use std::path::{Path, PathBuf};

/// The name of the `jlink` executable, without any platform extension
pub const JLINK_EXECUTABLE_NAME: &str = "jlink";
/// The name of the `jpackage` executable, without any platform extension
pub const JPACKAGE_EXECUTABLE_NAME: &str = "jpackage";

/// Gets the path of a tool in the same directory as a compiler executable.
///
/// The part of the compiler's file name before the first `.` is replaced with the tool name, so
/// any platform extension is kept. A file name without a `.` is replaced entirely.
///
/// ```
/// # use std::path::Path;
/// # use assemble_jdk_tools::executable_path::sibling_executable;
/// assert_eq!(
///     sibling_executable(Path::new("jdk/bin/javac.exe"), "jlink"),
///     Path::new("jdk/bin/jlink.exe")
/// );
/// assert_eq!(
///     sibling_executable(Path::new("jdk/bin/javac"), "jlink"),
///     Path::new("jdk/bin/jlink")
/// );
/// ```
pub fn sibling_executable(compiler: &Path, tool: &str) -> PathBuf {
    let file_name = match compiler.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return compiler.join(tool),
    };
    let sibling = match file_name.find('.') {
        Some(index) => format!("{}{}", tool, &file_name[index..]),
        None => tool.to_string(),
    };
    compiler.with_file_name(sibling)
}
