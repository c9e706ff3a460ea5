//! Turns a target into a runnable plan and drives it through a [`TaskRunner`].
//!
//! Sequential steps run one at a time and the first failure aborts the rest
//! of the pipeline. Concurrency groups start all members together and fail
//! fast: the first member error resolves the group, and the futures of the
//! remaining members are dropped, which cancels them.

use std::time::{Duration, Instant};

use futures::future::try_join_all;
use pipewright_core::{CommandGroup, PipelineError, Step, TargetRef, Task, TaskRunner};
use tracing::{error, info, instrument};

use crate::registry::TargetRegistry;

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: usize,
    pub elapsed: Duration,
}

/// Expands `target` and inlines nested build targets, yielding the exact
/// sequence the scheduler will execute.
pub fn plan(registry: &TargetRegistry, target: &TargetRef) -> Vec<Step> {
    let mut steps = Vec::new();
    for step in registry.expand(target) {
        match step {
            Step::Task(Task::Build { target: key }) => {
                let nested = TargetRef::new(CommandGroup::Build, key);
                steps.extend(plan(registry, &nested));
            }
            other => steps.push(other),
        }
    }
    steps
}

#[instrument(skip_all, fields(steps = steps.len()))]
pub async fn execute(steps: &[Step], runner: &dyn TaskRunner) -> Result<RunSummary, PipelineError> {
    let started = Instant::now();

    for (index, step) in steps.iter().enumerate() {
        let step_started = Instant::now();
        info!(target: "pipewright", "[{}/{}] start {}", index + 1, steps.len(), step);

        let outcome = match step {
            Step::Task(task) => runner.run_task(task).await,
            Step::Concurrent(tasks) => run_concurrent(tasks, runner).await,
        };

        if let Err(err) = outcome {
            error!(
                target: "pipewright",
                "{} failed after {:.2?}; skipping {} remaining step(s)",
                step,
                step_started.elapsed(),
                steps.len() - index - 1
            );
            return Err(err);
        }

        info!(target: "pipewright", "finished {} in {:.2?}", step, step_started.elapsed());
    }

    let elapsed = started.elapsed();
    info!(target: "pipewright", "pipeline completed {} step(s) in {:.2?}", steps.len(), elapsed);
    Ok(RunSummary {
        steps: steps.len(),
        elapsed,
    })
}

async fn run_concurrent(tasks: &[Task], runner: &dyn TaskRunner) -> Result<(), PipelineError> {
    try_join_all(tasks.iter().map(|task| runner.run_task(task))).await?;
    Ok(())
}
