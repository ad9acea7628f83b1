pub mod scheduler;

pub use scheduler::{
    Admission, ArrivalSource, Mark, MarkTask, PayloadError, RandomArrivals, ReadyQueue, RunReport,
    Scheduler, SchedulerConfig, SchedulerMetrics, ScriptedArrivals, SharedResource,
    SharedResourceGuard, SliceOutcome, TaskPayload, TaskState, UnitContext,
};
