use thiserror::Error;

use crate::task::TaskId;

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("Invalid priority {0}: must be between 0 and 255")]
    InvalidPriority(i64),

    #[error("Invalid burst length {burst} for {task}: must be at least one work unit")]
    InvalidBurst { task: TaskId, burst: i64 },

    #[error("Task registered twice: {0}")]
    DuplicateTask(TaskId),

    #[error("No tasks registered")]
    EmptyTaskSet,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown task: {0}")]
    UnknownTask(TaskId),

    #[error("Arrival generator returned {0} twice")]
    DuplicateArrival(TaskId),

    #[error("Worker for {0} panicked")]
    WorkerPanicked(TaskId),

    #[error("Payload of {task} failed: {reason}")]
    Payload { task: TaskId, reason: String },

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SchedError>;
