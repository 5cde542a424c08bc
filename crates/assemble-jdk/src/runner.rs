//! Runs requested tasks one after the other

use crate::cli::JdkArgs;
use assemble_core::error::PayloadError;
use assemble_core::prelude::*;
use assemble_core::task::TaskOutcome;
use colored::Colorize;
use std::time::{Duration, Instant};

/// The result of running a single task
#[derive(Debug)]
pub struct TaskResult {
    /// The id of the task
    pub id: TaskId,
    /// How the task finished
    pub result: BuildResult<TaskOutcome>,
    /// How long the task took
    pub duration: Duration,
}

/// Runs the tasks requested in the args, in the order they were requested.
///
/// Every request is resolved to a task before any task runs, so a misspelled task name fails the
/// build without side effects. Execution stops at the first failed task.
pub fn execute_tasks(project: &Project, args: &JdkArgs) -> ProjectResult<Vec<TaskResult>> {
    let ids = args
        .tasks()
        .iter()
        .map(|request| project.find_task_id(request))
        .collect::<ProjectResult<Vec<_>>>()?;

    if ids.is_empty() {
        info!("No tasks requested. Available tasks:");
        for id in project.task_container().task_ids() {
            info!("  {}", id);
        }
        return Ok(vec![]);
    }

    let mut results = Vec::with_capacity(ids.len());
    for id in ids {
        let handle = project.task_container().get_task(&id)?;
        let start = Instant::now();
        let result = handle.execute(project, args.rerun_tasks());
        let duration = start.elapsed();
        match &result {
            Ok(outcome) => info!("> Task {} {}", id, outcome.to_string().green()),
            Err(_) => error!("> Task {} {}", id, "FAILED".red()),
        }
        let failed = result.is_err();
        results.push(TaskResult {
            id,
            result,
            duration,
        });
        if failed {
            break;
        }
    }
    Ok(results)
}

/// Emits the errors of failed tasks, and returns the ids of those tasks.
pub fn emit_task_results(results: &[TaskResult], show_backtrace: bool) -> Vec<TaskId> {
    let mut failed = vec![];
    for task_r in results {
        trace!("{} finished in {:.3?}", task_r.id, task_r.duration);
        if let Err(err) = &task_r.result {
            error!("Task {} failed", task_r.id);
            error!("  {}", err);
            if show_backtrace {
                if let Some(payload) = payload(err) {
                    error!("{:?}", payload.backtrace());
                }
            }
            failed.push(task_r.id.clone());
        }
    }
    failed
}

fn payload(err: &BuildException) -> Option<&PayloadError<ProjectError>> {
    match err {
        BuildException::Error(e) => e.downcast_ref::<PayloadError<ProjectError>>(),
        _ => None,
    }
}

/// The status line printed after a build
pub fn build_status(success: bool, elapsed: Duration) -> String {
    let status = if success {
        "BUILD SUCCESSFUL".green().bold()
    } else {
        "BUILD FAILED".red().bold()
    };
    format!("{} in {:.2}s", status, elapsed.as_secs_f64())
}
