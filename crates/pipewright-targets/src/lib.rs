//! Target registry and scheduler.
//!
//! [`TargetRegistry`] expands a `(group, key)` pair into an ordered list of
//! steps; [`plan`] inlines nested targets and [`execute`] runs the result.

pub mod registry;
pub mod schedule;

pub use registry::{Composer, TargetRegistry, LIVE_EDIT_KEYS};
pub use schedule::{execute, plan, RunSummary};
