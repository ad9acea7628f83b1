//! Worker execution loop: one thread per task.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::MutexGuard;
use presched_core::{Result, SchedError, TaskId};
use tracing::{debug, info};

use super::guard::SharedResourceGuard;
use super::metrics::SchedulerMetrics;
use super::task::{TaskPayload, UnitContext};

/// Spawn the worker thread for `task`. Faults and panics are reported
/// through the guard so the dispatcher wakes up instead of waiting forever.
pub(crate) fn spawn(
    guard: Arc<SharedResourceGuard>,
    metrics: Arc<RwLock<SchedulerMetrics>>,
    task: TaskId,
    payload: Box<dyn TaskPayload>,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name(format!("presched-task-{}", task.0))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                run(&guard, &metrics, task, payload)
            }));
            match outcome {
                Ok(Ok(units)) => debug!(task = %task, units, "worker exiting"),
                Ok(Err(e)) => guard.report_fault(e),
                Err(_) => guard.report_fault(SchedError::WorkerPanicked(task)),
            }
        })?;
    Ok(handle)
}

/// Run the task's full burst. Returns the number of units performed.
///
/// The guard is held for the whole body and released only while suspended
/// or during a unit's external delay. `progress` is private to this loop.
fn run(
    guard: &SharedResourceGuard,
    metrics: &RwLock<SchedulerMetrics>,
    task: TaskId,
    mut payload: Box<dyn TaskPayload>,
) -> Result<u32> {
    let slot = guard.slot(task)?;
    let mut state = guard.lock();
    let burst = state.record(slot).spec.burst;
    let mut progress: u32 = 0;

    while progress < burst {
        if !guard.await_turn(&mut state, slot) {
            debug!(task = %task, progress, "run aborted, worker released");
            return Ok(progress);
        }

        let started = Instant::now();
        let mut ctx = UnitContext {
            task,
            iteration: progress,
            resource: &mut state.resource,
        };
        payload
            .execute(&mut ctx)
            .map_err(|e| SchedError::Payload { task, reason: e.to_string() })?;
        progress += 1;

        info!(
            task = %task,
            unit = progress,
            burst,
            "{} is using resource {}",
            payload.name(),
            state.resource.render()
        );

        let delay = payload.unit_delay();
        if !delay.is_zero() {
            MutexGuard::unlocked(&mut state, || thread::sleep(delay));
        }

        if let Ok(mut m) = metrics.write() {
            m.record_unit(task, started.elapsed());
        }
    }

    if let Ok(mut m) = metrics.write() {
        m.record_completion(task);
    }
    guard.complete(&mut state, slot);
    Ok(progress)
}
