use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use pipewright_core::constants::NODE_ENV;
use pipewright_core::{
    resolve_action, Environment, ExecutionAction, FileSet, KeepAlive, PipelineError,
    PipewrightConfig, Task, TaskRunner,
};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::builtin;

/// Runs pipeline tasks against the project on disk.
///
/// Builtin tasks run in-process; everything else is spawned from the
/// `[tasks]` table. Environment set by `set-environment` is shared by every
/// process spawned afterwards in the same run.
pub struct TaskExecutor {
    cfg: Arc<PipewrightConfig>,
    keepalive: KeepAlive,
    state: Mutex<RunState>,
}

#[derive(Default)]
struct RunState {
    env: HashMap<String, String>,
    background: Vec<(String, Child)>,
}

impl TaskExecutor {
    pub fn new(cfg: Arc<PipewrightConfig>, keepalive: KeepAlive) -> Self {
        Self {
            cfg,
            keepalive,
            state: Mutex::new(RunState::default()),
        }
    }

    /// Stops every background process started during the run.
    pub async fn shutdown(&self) {
        let background = std::mem::take(&mut self.state.lock().await.background);
        for (name, mut child) in background {
            match child.kill().await {
                Ok(()) => debug!("stopped {}", name),
                Err(err) => warn!("failed to stop {}: {}", name, err),
            }
        }
    }

    async fn dispatch(&self, task: &Task) -> Result<()> {
        let cfg = &self.cfg;
        match task {
            Task::Clean { target } => builtin::clean(&cfg.paths, target).await,
            Task::CopyHtml => self.copy_files(cfg.copy.html.clone()).await,
            Task::CopyStatic => self.copy_files(cfg.copy.static_files.clone()).await,
            Task::CopyDist => {
                let cfg = Arc::clone(cfg);
                tokio::task::spawn_blocking(move || builtin::copy_dist(&cfg))
                    .await
                    .context("copy-dist worker panicked")?
            }
            Task::InstallProductionConfig => builtin::install_production_config(&cfg.paths).await,
            Task::SetEnvironment(env) => {
                self.state
                    .lock()
                    .await
                    .env
                    .insert(NODE_ENV.to_string(), env.node_env().to_string());
                info!("{}={}", NODE_ENV, env.node_env());
                Ok(())
            }
            Task::StartServer(env) => self.start_background(task, Some(*env)).await,
            Task::AttachLiveEditor => self.start_background(task, None).await,
            Task::Wait => {
                let duration = cfg.wait.duration();
                debug!("waiting {:?}", duration);
                self.interruptible(async {
                    tokio::time::sleep(duration).await;
                    Ok(())
                })
                .await
            }
            Task::RepairReport => Ok(pipewright_report::repair_file(&cfg.paths.report)?),
            Task::ValidateReport => Ok(pipewright_report::validate_file(
                &cfg.paths.report,
                &cfg.report.failure_marker,
            )?),
            Task::WatchFiles if !self.has_action(task) => {
                info!("no watcher configured; press Ctrl-C to stop");
                self.keepalive.wait().await;
                Ok(())
            }
            _ => self.run_external(task).await,
        }
    }

    async fn copy_files(&self, sets: Vec<FileSet>) -> Result<()> {
        let copied = tokio::task::spawn_blocking(move || crate::copy::copy_sets(&sets))
            .await
            .context("copy worker panicked")??;
        info!("copied {} file(s)", copied);
        Ok(())
    }

    fn has_action(&self, task: &Task) -> bool {
        let tasks = &self.cfg.tasks;
        tasks.contains_key(&task.to_string()) || tasks.contains_key(task.id())
    }

    async fn action_for(&self, task: &Task) -> Result<ExecutionAction> {
        let env = self.state.lock().await.env.clone();
        resolve_action(&self.cfg.tasks, task, &env).ok_or_else(|| {
            anyhow!(
                "no command configured for '{}' (add a [tasks.{}] entry)",
                task,
                task.id()
            )
        })
    }

    #[instrument(skip(self), fields(task = %task))]
    async fn run_external(&self, task: &Task) -> Result<()> {
        let action = self.action_for(task).await?;
        let command_line = action.command_line();
        info!(target: "pipewright", "run {}", command_line);

        let status = self
            .interruptible(async {
                command(&action)
                    .status()
                    .await
                    .with_context(|| format!("failed to start '{}'", command_line))
            })
            .await?;

        if !status.success() {
            bail!("'{}' exited with {}", command_line, status);
        }
        Ok(())
    }

    /// Spawns a long-lived process and moves on; it is killed by [`Self::shutdown`].
    async fn start_background(&self, task: &Task, env: Option<Environment>) -> Result<()> {
        let mut action = self.action_for(task).await?;
        if let Some(env) = env {
            action
                .env
                .insert(NODE_ENV.to_string(), env.node_env().to_string());
        }

        let child = command(&action)
            .spawn()
            .with_context(|| format!("failed to start '{}'", action.command_line()))?;
        info!(
            target: "pipewright",
            "started {} in background (pid {})",
            action.command_line(),
            child.id().map_or_else(|| "?".to_string(), |pid| pid.to_string())
        );

        self.state
            .lock()
            .await
            .background
            .push((task.to_string(), child));
        Ok(())
    }

    /// Abandons `work` once shutdown is requested; dropping it kills any
    /// child process it owns.
    async fn interruptible<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            outcome = work => outcome,
            _ = self.keepalive.wait() => Err(anyhow!("interrupted")),
        }
    }
}

#[async_trait]
impl TaskRunner for TaskExecutor {
    async fn run_task(&self, task: &Task) -> Result<(), PipelineError> {
        if let Task::Build { target } = task {
            return Err(PipelineError::UnexpandedTarget {
                target: format!("build:{target}"),
            });
        }
        debug!(builtin = is_builtin(task), "dispatch {}", task);
        self.dispatch(task)
            .await
            .map_err(|err| PipelineError::task_failed(task, err))
    }
}

fn command(action: &ExecutionAction) -> Command {
    let mut cmd = Command::new(&action.program);
    cmd.args(&action.args).envs(&action.env).kill_on_drop(true);
    cmd
}

/// Tasks that never need a `[tasks]` entry.
pub(crate) fn is_builtin(task: &Task) -> bool {
    matches!(
        task,
        Task::Clean { .. }
            | Task::CopyHtml
            | Task::CopyStatic
            | Task::CopyDist
            | Task::InstallProductionConfig
            | Task::SetEnvironment(_)
            | Task::Wait
            | Task::RepairReport
            | Task::ValidateReport
            | Task::Build { .. }
    )
}
