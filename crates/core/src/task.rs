use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedError};

/// Identity of one statically known task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u32);

impl TaskId {
    /// Mark used when a task is registered without one: `a` for task 0, `b` for task 1, ...
    pub fn default_mark(self) -> char {
        char::from(b'a' + (self.0 % 26) as u8)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task {}", self.0)
    }
}

/// Scheduling priority. Higher value = higher priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub u8);

impl Priority {
    pub const MIN: Priority = Priority(0);

    /// Validate an untrusted priority value (config files, CLI).
    pub fn new(value: i64) -> Result<Self> {
        u8::try_from(value)
            .map(Priority)
            .map_err(|_| SchedError::InvalidPriority(value))
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable description of a task, fixed at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: TaskId,
    pub priority: Priority,
    /// Burst length: number of work units before the task completes.
    pub burst: u32,
    /// Character appended to the shared resource on every work unit.
    pub mark: char,
    /// Human-readable tag for logs (e.g. "LOW", "HIGH").
    pub label: Option<String>,
}

impl TaskSpec {
    /// Build a validated task spec. Rejects negative or out-of-range
    /// priorities and bursts shorter than one work unit.
    pub fn new(id: u32, priority: i64, burst: i64) -> Result<Self> {
        let id = TaskId(id);
        let priority = Priority::new(priority)?;
        let burst = u32::try_from(burst)
            .ok()
            .filter(|b| *b > 0)
            .ok_or(SchedError::InvalidBurst { task: id, burst })?;

        Ok(Self {
            id,
            priority,
            burst,
            mark: id.default_mark(),
            label: None,
        })
    }

    /// Re-check a spec that may have been assembled through its public fields.
    pub fn validate(&self) -> Result<()> {
        if self.burst == 0 {
            return Err(SchedError::InvalidBurst { task: self.id, burst: 0 });
        }
        Ok(())
    }

    pub fn with_mark(mut self, mark: char) -> Self {
        self.mark = mark;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label if present, otherwise the priority number.
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("priority {}", self.priority),
        }
    }
}

/// The three-task scenario the scheduler was built to demonstrate:
/// one LOW task with a long burst and two HIGH tasks with short ones.
pub fn reference_tasks() -> Vec<TaskSpec> {
    vec![
        TaskSpec { id: TaskId(0), priority: Priority(0), burst: 10, mark: 'a', label: Some("LOW".into()) },
        TaskSpec { id: TaskId(1), priority: Priority(1), burst: 5, mark: 'b', label: Some("HIGH".into()) },
        TaskSpec { id: TaskId(2), priority: Priority(1), burst: 2, mark: 'c', label: Some("HIGH".into()) },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ordering_higher_wins() {
        assert!(Priority(1) > Priority(0));
        assert_eq!(Priority::MIN, Priority(0));
    }

    #[test]
    fn negative_priority_rejected() {
        let err = TaskSpec::new(0, -1, 5).unwrap_err();
        assert!(matches!(err, SchedError::InvalidPriority(-1)));
    }

    #[test]
    fn oversized_priority_rejected() {
        assert!(matches!(Priority::new(256), Err(SchedError::InvalidPriority(256))));
        assert_eq!(Priority::new(255).unwrap(), Priority(255));
    }

    #[test]
    fn non_positive_burst_rejected() {
        let err = TaskSpec::new(3, 0, 0).unwrap_err();
        assert!(matches!(err, SchedError::InvalidBurst { task: TaskId(3), burst: 0 }));

        let err = TaskSpec::new(3, 0, -4).unwrap_err();
        assert!(matches!(err, SchedError::InvalidBurst { burst: -4, .. }));
    }

    #[test]
    fn validate_catches_hand_built_zero_burst() {
        let mut spec = TaskSpec::new(5, 1, 2).unwrap();
        assert!(spec.validate().is_ok());

        spec.burst = 0;
        let err = spec.validate().unwrap_err();
        assert!(matches!(err, SchedError::InvalidBurst { task: TaskId(5), burst: 0 }));
    }

    #[test]
    fn default_mark_follows_id() {
        assert_eq!(TaskSpec::new(0, 0, 1).unwrap().mark, 'a');
        assert_eq!(TaskSpec::new(2, 0, 1).unwrap().mark, 'c');
        assert_eq!(TaskSpec::new(27, 0, 1).unwrap().mark, 'b');
    }

    #[test]
    fn builder_overrides() {
        let spec = TaskSpec::new(1, 2, 3).unwrap().with_mark('x').with_label("HIGH");
        assert_eq!(spec.mark, 'x');
        assert_eq!(spec.display_label(), "HIGH");
        assert_eq!(TaskSpec::new(1, 2, 3).unwrap().display_label(), "priority 2");
    }

    #[test]
    fn reference_scenario_shape() {
        let tasks = reference_tasks();
        let priorities: Vec<u8> = tasks.iter().map(|t| t.priority.0).collect();
        let bursts: Vec<u32> = tasks.iter().map(|t| t.burst).collect();
        assert_eq!(priorities, vec![0, 1, 1]);
        assert_eq!(bursts, vec![10, 5, 2]);
    }

    #[test]
    fn display_formats() {
        assert_eq!(TaskId(4).to_string(), "task 4");
        assert_eq!(Priority(7).to_string(), "7");
    }
}
