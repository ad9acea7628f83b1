use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use presched_core::{Config, Result, SchedError, TaskId};

use super::metrics::SchedulerMetrics;

/// Scheduling state of a task, written only by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Suspended; the worker waits on its resume signal.
    Blocked,
    /// Entitled to the shared resource.
    Runnable,
}

/// How a time-slice wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SliceOutcome {
    /// The head task finished before the slice ran out.
    Completed,
    /// The full slice elapsed with the head still running.
    Elapsed,
}

/// One mark appended to the shared resource by a work unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    pub task: TaskId,
    /// Zero-based work unit index within the task's burst.
    pub iteration: u32,
    pub symbol: char,
}

/// Record of a task entering the ready queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Admission {
    pub task: TaskId,
    pub tick: u64,
    /// Number of marks already on the resource when the task was admitted.
    pub marks_before: usize,
}

/// Scheduler configuration, typically parsed from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Time slice granted to the head task while arrivals are pending.
    #[serde(default = "default_time_slice")]
    pub time_slice_ms: u64,
    /// External delay after every work unit, taken with the guard released.
    #[serde(default = "default_work_unit")]
    pub work_unit_ms: u64,
    /// Seed for random arrivals. `None` = seeded from entropy.
    #[serde(default)]
    pub arrival_seed: Option<u64>,
}

fn default_time_slice() -> u64 { 3000 }
fn default_work_unit() -> u64 { 1000 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            time_slice_ms: default_time_slice(),
            work_unit_ms: default_work_unit(),
            arrival_seed: None,
        }
    }
}

impl From<&Config> for SchedulerConfig {
    fn from(config: &Config) -> Self {
        Self {
            time_slice_ms: config.time_slice_ms,
            work_unit_ms: config.work_unit_ms,
            arrival_seed: config.arrival_seed,
        }
    }
}

impl SchedulerConfig {
    /// Config with millisecond-scale units, for tests and quick demos.
    pub fn fast(time_slice_ms: u64, work_unit_ms: u64) -> Self {
        Self {
            time_slice_ms,
            work_unit_ms,
            arrival_seed: None,
        }
    }

    pub fn time_slice(&self) -> Duration {
        Duration::from_millis(self.time_slice_ms)
    }

    pub fn work_unit(&self) -> Duration {
        Duration::from_millis(self.work_unit_ms)
    }

    /// Reject settings the dispatcher cannot make progress with.
    pub fn validate(&self) -> Result<()> {
        if self.time_slice_ms == 0 {
            return Err(SchedError::InvalidConfig(
                "time_slice_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a completed [`Scheduler::run`](super::Scheduler::run).
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Admissions in arrival order.
    pub admissions: Vec<Admission>,
    /// Every mark, in the order it was appended.
    pub marks: Vec<Mark>,
    pub metrics: SchedulerMetrics,
}

impl RunReport {
    /// Task ids in the order the arrival generator produced them.
    pub fn arrival_order(&self) -> Vec<TaskId> {
        self.admissions.iter().map(|a| a.task).collect()
    }

    /// The resource contents as a string of mark symbols.
    pub fn trace(&self) -> String {
        self.marks.iter().map(|m| m.symbol).collect()
    }

    /// Iteration indices of one task's marks, in resource order.
    pub fn iterations_of(&self, task: TaskId) -> Vec<u32> {
        self.marks
            .iter()
            .filter(|m| m.task == task)
            .map(|m| m.iteration)
            .collect()
    }

    /// Position in the mark sequence of the task's last mark.
    pub fn last_mark_index(&self, task: TaskId) -> Option<usize> {
        self.marks.iter().rposition(|m| m.task == task)
    }

    pub fn admission_of(&self, task: TaskId) -> Option<&Admission> {
        self.admissions.iter().find(|a| a.task == task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_config_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.time_slice_ms, 3000);
        assert_eq!(config.work_unit_ms, 1000);
        assert_eq!(config.arrival_seed, None);
        assert_eq!(config.time_slice(), Duration::from_secs(3));
        assert_eq!(config.work_unit(), Duration::from_secs(1));
    }

    #[test]
    fn zero_time_slice_rejected() {
        let config = SchedulerConfig::fast(0, 1);
        assert!(matches!(config.validate(), Err(SchedError::InvalidConfig(_))));
        assert!(SchedulerConfig::fast(1, 0).validate().is_ok());
    }

    #[test]
    fn config_parses_with_partial_fields() {
        let config: SchedulerConfig = serde_json::from_str(r#"{"time_slice_ms": 50}"#).unwrap();
        assert_eq!(config.time_slice_ms, 50);
        assert_eq!(config.work_unit_ms, 1000);
    }

    #[test]
    fn report_helpers() {
        let mark = |task, iteration, symbol| Mark { task: TaskId(task), iteration, symbol };
        let report = RunReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            admissions: vec![
                Admission { task: TaskId(1), tick: 1, marks_before: 0 },
                Admission { task: TaskId(0), tick: 2, marks_before: 2 },
            ],
            marks: vec![mark(1, 0, 'b'), mark(1, 1, 'b'), mark(0, 0, 'a')],
            metrics: SchedulerMetrics::default(),
        };

        assert_eq!(report.trace(), "bba");
        assert_eq!(report.arrival_order(), vec![TaskId(1), TaskId(0)]);
        assert_eq!(report.iterations_of(TaskId(1)), vec![0, 1]);
        assert_eq!(report.last_mark_index(TaskId(1)), Some(1));
        assert_eq!(report.last_mark_index(TaskId(5)), None);
        assert_eq!(report.admission_of(TaskId(0)).map(|a| a.marks_before), Some(2));
    }
}
