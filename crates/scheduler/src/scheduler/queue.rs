use std::collections::VecDeque;

use presched_core::{Priority, TaskId};

/// One queued task. The priority is copied in at insertion since task
/// priorities never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub task: TaskId,
    pub priority: Priority,
}

/// Priority-ordered ready queue. Front = head = the task entitled to run.
///
/// Traversing from the head always yields non-increasing priorities. Ties
/// are broken asymmetrically: a newcomer whose priority equals the head's
/// displaces the head (last arrival wins), while below the head equal
/// priorities keep arrival order (first arrival wins).
///
/// Owned by the dispatcher thread alone, so it carries no lock.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    entries: VecDeque<QueueEntry>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Insert a task at its priority position.
    pub fn insert(&mut self, task: TaskId, priority: Priority) {
        let entry = QueueEntry { task, priority };

        let head_priority = match self.entries.front() {
            Some(head) => head.priority,
            None => {
                self.entries.push_back(entry);
                return;
            }
        };

        if priority >= head_priority {
            self.entries.push_front(entry);
            return;
        }

        // Below the head: after every entry of greater or equal priority,
        // so A(1) B(1) C(0) D(0) queues as [B, A, C, D]. The pointer walk
        // this queue replaces stopped at the first non-greater node and
        // would have produced [B, A, D, C]; arrival order is kept instead.
        let position = self
            .entries
            .iter()
            .skip(1)
            .position(|e| e.priority < priority)
            .map(|i| i + 1)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
    }

    /// The highest-priority queued task.
    pub fn peek_head(&self) -> Option<TaskId> {
        self.entries.front().map(|e| e.task)
    }

    /// Drop the head entry.
    pub fn remove_head(&mut self) -> Option<TaskId> {
        self.entries.pop_front().map(|e| e.task)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.entries.iter().any(|e| e.task == task)
    }

    /// Queued task ids from the head down.
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.entries.iter().map(|e| e.task).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }
}
