//! The `assemble-jdk` executable.
//!
//! Reads an `assemble.toml` build file from the current directory, creates a project with the
//! [jdk tools plugin](assemble_jdk_tools::JdkToolsPlugin) applied, and runs the requested
//! `jlink` and `jpackage` tasks.

#[macro_use]
extern crate log;

use std::env::current_dir;
use std::path::Path;

use anyhow::{anyhow, Result};

use assemble_core::error::PayloadError;
use assemble_core::prelude::ProjectError;

use crate::build_file::BuildFile;
use crate::cli::JdkArgs;
use crate::runner::{emit_task_results, execute_tasks};

pub mod build_file;
pub mod cli;
pub mod runner;

/// Runs `assemble-jdk` with the args of this process
pub fn execute() -> std::result::Result<(), ()> {
    let args = JdkArgs::from_env();
    args.logging().init_root_logger().map_err(|_| ())?;

    let output = current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|dir| with_args(&args, &dir));

    if let Err(e) = output {
        error!("{:#}", e);
        if args.backtrace() {
            if let Some(payload) = e.downcast_ref::<PayloadError<ProjectError>>() {
                error!("{:?}", payload.backtrace());
            }
        }
        Err(())
    } else {
        Ok(())
    }
}

/// Runs the tasks requested in the args, with the build file found in `dir`
pub fn with_args(args: &JdkArgs, dir: &Path) -> Result<()> {
    let build_file = args.build_file(dir);
    debug!("reading build file {:?}", build_file);
    let project = BuildFile::read(&build_file)?.into_project(dir)?;

    let results = execute_tasks(&project, args)?;
    let failed = emit_task_results(&results, args.backtrace());
    if !failed.is_empty() {
        return Err(anyhow!("tasks failed: {:?}", failed));
    }
    Ok(())
}
