use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use presched_core::{Result, SchedError, TaskId, TaskSpec};
use tracing::{debug, error};

use super::types::{Mark, SliceOutcome, TaskState};

/// The single resource every task contends for: an append-only mark log.
#[derive(Debug, Default, Clone)]
pub struct SharedResource {
    marks: Vec<Mark>,
}

impl SharedResource {
    pub fn append(&mut self, task: TaskId, iteration: u32, symbol: char) {
        self.marks.push(Mark { task, iteration, symbol });
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Mark symbols concatenated in append order.
    pub fn render(&self) -> String {
        self.marks.iter().map(|m| m.symbol).collect()
    }
}

/// Per-task scheduling record.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub spec: TaskSpec,
    pub state: TaskState,
    pub completed: bool,
}

/// Everything the guard's mutex protects.
#[derive(Debug)]
pub struct GuardState {
    pub(crate) resource: SharedResource,
    pub(crate) records: Vec<TaskRecord>,
    /// First fault reported by a worker. Wakes the dispatcher.
    fault: Option<SchedError>,
    /// Set when the dispatcher gives up; releases every suspended worker.
    aborted: bool,
}

impl GuardState {
    pub(crate) fn record(&self, slot: usize) -> &TaskRecord {
        &self.records[slot]
    }
}

/// Mutual exclusion plus per-task suspend/resume signaling.
///
/// One mutex covers the shared resource and every task's `state` and
/// `completed` fields. Each task has its own resume condvar; the dispatcher
/// flips a task to [`TaskState::Runnable`] and signals it. Preemption is a
/// plain flip back to [`TaskState::Blocked`] which the worker notices at
/// its next work-unit boundary.
pub struct SharedResourceGuard {
    state: Mutex<GuardState>,
    resume: Vec<Condvar>,
    /// Signaled whenever a task completes or a worker faults.
    completion: Condvar,
    slots: HashMap<TaskId, usize>,
}

impl SharedResourceGuard {
    /// Build records for a fixed task set. Every task starts blocked.
    pub fn new(specs: &[TaskSpec]) -> Result<Self> {
        if specs.is_empty() {
            return Err(SchedError::EmptyTaskSet);
        }

        let mut slots = HashMap::with_capacity(specs.len());
        for (slot, spec) in specs.iter().enumerate() {
            if slots.insert(spec.id, slot).is_some() {
                return Err(SchedError::DuplicateTask(spec.id));
            }
        }

        let records = specs
            .iter()
            .map(|spec| TaskRecord {
                spec: spec.clone(),
                state: TaskState::Blocked,
                completed: false,
            })
            .collect();

        Ok(Self {
            state: Mutex::new(GuardState {
                resource: SharedResource::default(),
                records,
                fault: None,
                aborted: false,
            }),
            resume: specs.iter().map(|_| Condvar::new()).collect(),
            completion: Condvar::new(),
            slots,
        })
    }

    /// Index of a task's record and condvar.
    pub fn slot(&self, task: TaskId) -> Result<usize> {
        self.slots
            .get(&task)
            .copied()
            .ok_or(SchedError::UnknownTask(task))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock()
    }

    // ── Dispatcher side ──────────────────────────────────────

    /// Make a task runnable and wake its worker.
    pub fn grant(&self, task: TaskId) -> Result<()> {
        let slot = self.slot(task)?;
        let mut state = self.state.lock();
        state.records[slot].state = TaskState::Runnable;
        self.resume[slot].notify_one();
        debug!(task = %task, "granted");
        Ok(())
    }

    /// Send a task back to blocked. Takes effect at its next unit boundary.
    pub fn preempt(&self, task: TaskId) -> Result<()> {
        let slot = self.slot(task)?;
        self.state.lock().records[slot].state = TaskState::Blocked;
        debug!(task = %task, "preempted");
        Ok(())
    }

    pub fn is_completed(&self, task: TaskId) -> Result<bool> {
        let slot = self.slot(task)?;
        Ok(self.state.lock().records[slot].completed)
    }

    pub fn task_state(&self, task: TaskId) -> Result<TaskState> {
        let slot = self.slot(task)?;
        Ok(self.state.lock().records[slot].state)
    }

    pub fn all_completed(&self) -> bool {
        self.state.lock().records.iter().all(|r| r.completed)
    }

    /// Number of marks on the resource so far.
    pub fn marks_len(&self) -> usize {
        self.state.lock().resource.len()
    }

    pub fn snapshot(&self) -> SharedResource {
        self.state.lock().resource.clone()
    }

    /// Wait up to `slice` for `task` to complete.
    ///
    /// Returns early on completion or on a worker fault; the lock is only
    /// held while checking, never across the wait.
    pub fn wait_slice(&self, task: TaskId, slice: Duration) -> Result<SliceOutcome> {
        let slot = self.slot(task)?;
        let deadline = Instant::now() + slice;
        let mut state = self.state.lock();

        loop {
            if state.records[slot].completed {
                return Ok(SliceOutcome::Completed);
            }
            if let Some(fault) = state.fault.take() {
                return Err(fault);
            }
            if self.completion.wait_until(&mut state, deadline).timed_out() {
                return Ok(if state.records[slot].completed {
                    SliceOutcome::Completed
                } else {
                    SliceOutcome::Elapsed
                });
            }
        }
    }

    /// Block until `task` completes, with no timeout.
    pub fn wait_completion(&self, task: TaskId) -> Result<()> {
        let slot = self.slot(task)?;
        let mut state = self.state.lock();

        while !state.records[slot].completed {
            if let Some(fault) = state.fault.take() {
                return Err(fault);
            }
            self.completion.wait(&mut state);
        }
        Ok(())
    }

    /// Surface a fault reported since the last wait, if any.
    pub fn take_fault(&self) -> Option<SchedError> {
        self.state.lock().fault.take()
    }

    /// Release every suspended worker without running it. Used when the
    /// dispatcher bails out so worker threads can be joined.
    pub fn abort(&self) {
        let mut state = self.state.lock();
        state.aborted = true;
        for cv in &self.resume {
            cv.notify_all();
        }
    }

    // ── Worker side ──────────────────────────────────────────

    /// Suspend while the task is blocked. Returns `false` if the run was
    /// aborted while waiting.
    pub(crate) fn await_turn(&self, state: &mut MutexGuard<'_, GuardState>, slot: usize) -> bool {
        while state.records[slot].state == TaskState::Blocked {
            if state.aborted {
                return false;
            }
            self.resume[slot].wait(state);
        }
        !state.aborted
    }

    /// Flag the task completed and wake the dispatcher.
    pub(crate) fn complete(&self, state: &mut MutexGuard<'_, GuardState>, slot: usize) {
        state.records[slot].completed = true;
        self.completion.notify_all();
    }

    /// Record a worker fault. Only the first one is kept.
    pub(crate) fn report_fault(&self, fault: SchedError) {
        error!(error = %fault, "worker fault");
        let mut state = self.state.lock();
        if state.fault.is_none() {
            state.fault = Some(fault);
        }
        self.completion.notify_all();
    }
}
