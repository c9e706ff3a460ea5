use std::fmt::Display;

use thiserror::Error;

use crate::task::Task;

/// Failures surfaced by the scheduler. Every variant aborts the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A task (or a concurrency group member) reported failure.
    #[error("task '{task}' failed: {reason}")]
    TaskExecutionFailure { task: String, reason: String },
    /// A nested target reached a runner without being inlined first.
    #[error("target '{target}' must be expanded before it can run")]
    UnexpandedTarget { target: String },
}

impl PipelineError {
    /// Wraps any error from an executor, keeping its full context chain.
    pub fn task_failed(task: &Task, err: impl Display) -> Self {
        Self::TaskExecutionFailure {
            task: task.to_string(),
            reason: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_failure_keeps_context_chain() {
        let err = anyhow::anyhow!("exit status 2").context("lessc failed");
        let wrapped = PipelineError::task_failed(&Task::CompileStyles, err);
        assert_eq!(
            wrapped.to_string(),
            "task 'compile-styles' failed: lessc failed: exit status 2"
        );
    }
}
