use std::time::Duration;

use presched_core::TaskId;

use super::guard::SharedResource;

/// Error type for a payload's unit of work.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Unit failed: {0}")]
    Failed(String),
}

/// What a payload sees during one work unit.
pub struct UnitContext<'a> {
    pub task: TaskId,
    /// Zero-based index of this unit within the burst.
    pub iteration: u32,
    /// The shared resource. Only reachable while the guard is held.
    pub resource: &'a mut SharedResource,
}

/// The body a worker executes once per work unit.
///
/// The dispatcher never sees payloads; it only schedules task ids. Each
/// worker owns its payload for the whole burst.
pub trait TaskPayload: Send {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Perform one unit of work. Called with the shared guard held.
    fn execute(&mut self, ctx: &mut UnitContext<'_>) -> Result<(), PayloadError>;

    /// External delay after each unit. The guard is released for its duration.
    fn unit_delay(&self) -> Duration;
}
