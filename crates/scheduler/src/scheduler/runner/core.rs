use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use presched_core::{Result, SchedError, TaskId, TaskSpec};
use tracing::info;

use crate::scheduler::metrics::SchedulerMetrics;
use crate::scheduler::task::TaskPayload;
use crate::scheduler::tasks::MarkTask;
use crate::scheduler::types::SchedulerConfig;

/// The preemptive priority scheduler. Holds the static task set and each
/// task's payload until [`run`](Scheduler::run) hands them to workers.
pub struct Scheduler {
    pub(super) config: SchedulerConfig,
    /// Registered tasks, in registration order.
    pub(super) specs: Vec<TaskSpec>,
    /// Payload per task, moved into its worker at arrival.
    pub(super) payloads: HashMap<TaskId, Box<dyn TaskPayload>>,
    /// Scheduler metrics.
    pub(super) metrics: Arc<RwLock<SchedulerMetrics>>,
}

impl Scheduler {
    /// Create a scheduler with the given config. Rejects invalid configs.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            specs: Vec::new(),
            payloads: HashMap::new(),
            metrics: Arc::new(RwLock::new(SchedulerMetrics::default())),
        })
    }

    /// Register a task with its payload.
    pub fn register_task(&mut self, spec: TaskSpec, payload: Box<dyn TaskPayload>) -> Result<()> {
        spec.validate()?;
        if self.payloads.contains_key(&spec.id) {
            return Err(SchedError::DuplicateTask(spec.id));
        }
        info!(
            "Priority of {} is {} ({}), burst {}",
            spec.id,
            spec.priority,
            spec.display_label(),
            spec.burst
        );
        self.payloads.insert(spec.id, payload);
        self.specs.push(spec);
        Ok(())
    }

    /// Register a task whose payload appends its mark once per unit,
    /// with the configured work-unit delay.
    pub fn register_mark_task(&mut self, spec: TaskSpec) -> Result<()> {
        let payload = MarkTask::new(&spec, self.config.work_unit());
        self.register_task(spec, Box::new(payload))
    }

    /// Register every spec as a mark task.
    pub fn with_mark_tasks(config: SchedulerConfig, specs: impl IntoIterator<Item = TaskSpec>) -> Result<Self> {
        let mut scheduler = Self::new(config)?;
        for spec in specs {
            scheduler.register_mark_task(spec)?;
        }
        Ok(scheduler)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Registered task specs, in registration order.
    pub fn tasks(&self) -> &[TaskSpec] {
        &self.specs
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.specs.iter().map(|s| s.id).collect()
    }

    /// Get a snapshot of the current scheduler metrics.
    pub fn metrics(&self) -> SchedulerMetrics {
        self.metrics.read().map(|m| m.clone()).unwrap_or_default()
    }

    /// Get an Arc to the metrics (for reads while a run is in progress).
    pub fn metrics_handle(&self) -> Arc<RwLock<SchedulerMetrics>> {
        Arc::clone(&self.metrics)
    }
}
