use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use presched_core::TaskId;
use serde::Serialize;

/// Dispatcher and worker counters for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerMetrics {
    /// Dispatcher loop iterations.
    pub ticks: u64,
    /// Times a head task was made runnable.
    pub grants: u64,
    /// Time slices that ran out with the head still working.
    pub preemptions: u64,
    /// Time-slice waits cut short by the head completing.
    pub early_completions: u64,
    /// Completed tasks removed from the head of the queue.
    pub drained: u64,
    /// Work units performed per task.
    pub units: HashMap<TaskId, u64>,
    /// Average work unit duration per task, including the external delay.
    pub avg_unit_duration: HashMap<TaskId, Duration>,
    /// When each task finished its last work unit.
    pub completed_at: HashMap<TaskId, DateTime<Utc>>,
}

impl SchedulerMetrics {
    /// Record one work unit.
    pub fn record_unit(&mut self, task: TaskId, duration: Duration) {
        let count = self.units.entry(task).or_default();
        *count += 1;
        let count = *count;

        let prev_avg = self.avg_unit_duration.get(&task).copied().unwrap_or_default();

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let new_avg = if count == 1 {
            duration
        } else {
            let prev_nanos = prev_avg.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / count as f64;
            Duration::from_nanos(avg_nanos as u64)
        };

        self.avg_unit_duration.insert(task, new_avg);
    }

    pub fn record_completion(&mut self, task: TaskId) {
        self.completed_at.insert(task, Utc::now());
    }

    pub fn record_drain(&mut self) {
        self.drained += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_single_unit() {
        let mut m = SchedulerMetrics::default();
        m.record_unit(TaskId(1), Duration::from_millis(100));

        assert_eq!(m.units[&TaskId(1)], 1);
        assert_eq!(m.avg_unit_duration[&TaskId(1)], Duration::from_millis(100));
    }

    #[test]
    fn record_multiple_units_averages() {
        let mut m = SchedulerMetrics::default();
        m.record_unit(TaskId(1), Duration::from_millis(100));
        m.record_unit(TaskId(1), Duration::from_millis(200));

        assert_eq!(m.units[&TaskId(1)], 2);
        let avg = m.avg_unit_duration[&TaskId(1)].as_millis();
        assert!((140..=160).contains(&avg), "expected ~150ms, got {}ms", avg);
    }

    #[test]
    fn completion_and_drain_recorded_separately() {
        let mut m = SchedulerMetrics::default();
        m.record_completion(TaskId(2));
        assert_eq!(m.drained, 0);
        assert!(m.completed_at.contains_key(&TaskId(2)));

        m.record_drain();
        assert_eq!(m.drained, 1);
    }

    #[test]
    fn default_metrics() {
        let m = SchedulerMetrics::default();
        assert_eq!(m.ticks, 0);
        assert_eq!(m.preemptions, 0);
        assert!(m.units.is_empty());
    }

    #[test]
    fn serializes_task_keyed_maps() {
        let mut m = SchedulerMetrics::default();
        m.record_unit(TaskId(3), Duration::from_millis(1));
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["units"]["3"], 1);
    }
}
