//! Preemptive, priority-based scheduler for a small, statically known task set.
//!
//! One dispatcher thread and one worker thread per task contend for a single
//! [`SharedResource`]. Each tick the dispatcher admits an arrival into the
//! [`ReadyQueue`], grants the head task permission to run, waits one time
//! slice (or until the head completes) and preempts it. Workers observe
//! preemption at their next work-unit boundary through the
//! [`SharedResourceGuard`] suspend/resume protocol.

pub mod arrival;
pub mod guard;
pub mod metrics;
pub mod queue;
pub mod runner;
pub mod task;
pub mod tasks;
pub mod types;
mod worker;

pub use arrival::{ArrivalSource, RandomArrivals, ScriptedArrivals};
pub use guard::{SharedResource, SharedResourceGuard};
pub use metrics::SchedulerMetrics;
pub use queue::ReadyQueue;
pub use runner::Scheduler;
pub use task::{PayloadError, TaskPayload, UnitContext};
pub use tasks::MarkTask;
pub use types::{Admission, Mark, RunReport, SchedulerConfig, SliceOutcome, TaskState};
