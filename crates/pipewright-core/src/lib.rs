//! Core vocabulary for the Pipewright build orchestrator.
//!
//! This crate defines the command groups and target references, the task and
//! step types pipelines are built from, the immutable project configuration,
//! and the runner contract the scheduler drives.

pub mod action;
pub mod command;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod runner;
pub mod shutdown;
pub mod task;

pub use action::{resolve_action, ExecutionAction};
pub use command::{CommandGroup, CommandParseError, TargetRef};
pub use config::{FileSet, PipewrightConfig};
pub use environment::Environment;
pub use error::PipelineError;
pub use runner::TaskRunner;
pub use shutdown::{shutdown_channel, KeepAlive, ShutdownTrigger};
pub use task::{sequence, Step, Task};
