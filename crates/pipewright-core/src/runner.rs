use async_trait::async_trait;

use crate::error::PipelineError;
use crate::task::Task;

/// Executes individual tasks on behalf of the scheduler.
///
/// Implementations must be cancel-safe: when a concurrency group fails, the
/// futures of its other members are dropped mid-flight.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run_task(&self, task: &Task) -> Result<(), PipelineError>;
}
