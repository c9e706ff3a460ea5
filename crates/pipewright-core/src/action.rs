use std::collections::HashMap;

use serde::Deserialize;

use crate::task::Task;

/// An external program that carries out a task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutionAction {
    /// The executable program (e.g., "lessc", "browserify").
    pub program: String,
    /// The arguments to pass to the program.
    #[serde(default)]
    pub args: Vec<String>,
    /// Optional environment variables to set for the execution.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ExecutionAction {
    /// Human-readable command line, for logs and error messages.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            return self.program.clone();
        }
        format!("{} {}", self.program, self.args.join(" "))
    }
}

/// Looks up the action configured for `task` and layers the run environment
/// underneath the action's own variables.
///
/// A fully qualified entry (`start-server:prod`) wins over the bare task id
/// (`start-server`).
pub fn resolve_action(
    table: &HashMap<String, ExecutionAction>,
    task: &Task,
    run_env: &HashMap<String, String>,
) -> Option<ExecutionAction> {
    let mut action = table
        .get(&task.to_string())
        .or_else(|| table.get(task.id()))?
        .clone();

    let mut merged_env = run_env.clone();
    merged_env.extend(action.env);
    action.env = merged_env;
    Some(action)
}
