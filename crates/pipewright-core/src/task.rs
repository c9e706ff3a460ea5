//! Task identifiers and the steps a pipeline is made of.

use std::fmt::{Display, Formatter};

use crate::environment::Environment;

/// A single unit of work in a pipeline.
///
/// Parameterised variants carry the selector the task was invoked
/// with (`clean:dist`, `start-server:prod`). [`Task::id`] is the stable name
/// used to look up an [`ExecutionAction`](crate::ExecutionAction) in config.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Task {
    Clean { target: String },
    CompileStyles,
    VendorPrefix,
    CopyHtml,
    CopyStatic,
    BundleScript,
    AnnotateForMinification,
    ExtractSourceMaps,
    CompileTemplates,
    CopyDist,
    InstallProductionConfig,
    MinifyStyles,
    MinifyScripts,
    /// Runs another build target in place; inlined by the scheduler.
    Build { target: String },
    SetEnvironment(Environment),
    StartServer(Environment),
    AttachLiveEditor,
    WatchFiles,
    RunProcessMonitor { profile: String },
    AttachInspector,
    RunServerTests,
    RunClientTests,
    RunE2eSuite,
    Wait,
    RepairReport,
    ValidateReport,
}

impl Task {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Clean { .. } => "clean",
            Self::CompileStyles => "compile-styles",
            Self::VendorPrefix => "vendor-prefix",
            Self::CopyHtml => "copy-html",
            Self::CopyStatic => "copy-static",
            Self::BundleScript => "bundle-script",
            Self::AnnotateForMinification => "annotate-for-minification",
            Self::ExtractSourceMaps => "extract-source-maps",
            Self::CompileTemplates => "compile-templates",
            Self::CopyDist => "copy-dist",
            Self::InstallProductionConfig => "install-production-config",
            Self::MinifyStyles => "minify-styles",
            Self::MinifyScripts => "minify-scripts",
            Self::Build { .. } => "build",
            Self::SetEnvironment(_) => "set-environment",
            Self::StartServer(_) => "start-server",
            Self::AttachLiveEditor => "attach-live-editor",
            Self::WatchFiles => "watch-files",
            Self::RunProcessMonitor { .. } => "run-process-monitor",
            Self::AttachInspector => "attach-inspector",
            Self::RunServerTests => "run-server-tests",
            Self::RunClientTests => "run-client-tests",
            Self::RunE2eSuite => "run-e2e-suite",
            Self::Wait => "wait",
            Self::RepairReport => "repair-report",
            Self::ValidateReport => "validate-report",
        }
    }

    fn selector(&self) -> Option<&str> {
        match self {
            Self::Clean { target } | Self::Build { target } => Some(target),
            Self::RunProcessMonitor { profile } => Some(profile),
            Self::SetEnvironment(env) | Self::StartServer(env) => Some(env.as_str()),
            _ => None,
        }
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.selector() {
            Some(selector) => write!(f, "{}:{}", self.id(), selector),
            None => f.write_str(self.id()),
        }
    }
}

/// One slot in an ordered pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Task(Task),
    /// Members start together and the slot completes when all of them have.
    Concurrent(Vec<Task>),
}

impl From<Task> for Step {
    fn from(task: Task) -> Self {
        Self::Task(task)
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task(task) => write!(f, "{task}"),
            Self::Concurrent(tasks) => {
                let names = tasks.iter().map(Task::to_string).collect::<Vec<_>>();
                write!(f, "concurrent[{}]", names.join(", "))
            }
        }
    }
}

/// Wraps plain tasks into sequential steps.
pub fn sequence(tasks: impl IntoIterator<Item = Task>) -> Vec<Step> {
    tasks.into_iter().map(Step::Task).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameterised_tasks_display_with_selector() {
        assert_eq!(
            Task::Clean {
                target: "dist".to_string()
            }
            .to_string(),
            "clean:dist"
        );
        assert_eq!(
            Task::StartServer(Environment::Production).to_string(),
            "start-server:prod"
        );
        assert_eq!(Task::RepairReport.to_string(), "repair-report");
    }

    #[test]
    fn concurrent_step_lists_members() {
        let step = Step::Concurrent(vec![
            Task::RunProcessMonitor {
                profile: "debug".to_string(),
            },
            Task::AttachInspector,
        ]);
        assert_eq!(
            step.to_string(),
            "concurrent[run-process-monitor:debug, attach-inspector]"
        );
    }
}
