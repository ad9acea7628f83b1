use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::Utc;
use presched_core::{Result, SchedError, TaskId};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::scheduler::arrival::{ArrivalSource, RandomArrivals};
use crate::scheduler::guard::SharedResourceGuard;
use crate::scheduler::metrics::SchedulerMetrics;
use crate::scheduler::queue::ReadyQueue;
use crate::scheduler::types::{Admission, RunReport, SliceOutcome};
use crate::scheduler::worker;

use super::Scheduler;

/// Dispatcher-owned state for a single run.
struct RunState {
    queue: ReadyQueue,
    workers: Vec<(TaskId, JoinHandle<()>)>,
    admissions: Vec<Admission>,
    tick: u64,
}

impl RunState {
    fn arrived(&self, task: TaskId) -> bool {
        self.admissions.iter().any(|a| a.task == task)
    }
}

impl Scheduler {
    /// Run with random arrivals, seeded from the config if a seed is set.
    pub fn run_random(self) -> Result<RunReport> {
        let ids = self.task_ids();
        let arrivals = match self.config.arrival_seed {
            Some(seed) => RandomArrivals::seeded(ids, seed),
            None => RandomArrivals::new(ids),
        };
        self.run(arrivals)
    }

    /// Run the dispatcher until every task has completed. Blocks the
    /// calling thread; worker threads are joined before returning.
    ///
    /// Each tick: admit one arrival, grant the queue head (draining heads
    /// that already completed), then either wait one time slice and preempt,
    /// or, once every task has arrived, wait for the head to finish.
    pub fn run<A: ArrivalSource>(mut self, mut arrivals: A) -> Result<RunReport> {
        if self.specs.is_empty() {
            return Err(SchedError::EmptyTaskSet);
        }

        let run_id = Uuid::new_v4();
        let span = info_span!("dispatcher", run = %run_id);
        let _enter = span.enter();

        let started_at = Utc::now();
        let guard = Arc::new(SharedResourceGuard::new(&self.specs)?);
        let mut run = RunState {
            queue: ReadyQueue::with_capacity(self.specs.len()),
            workers: Vec::with_capacity(self.specs.len()),
            admissions: Vec::with_capacity(self.specs.len()),
            tick: 0,
        };

        info!(
            "Scheduler starting with {} tasks, {}ms time slice",
            self.specs.len(),
            self.config.time_slice_ms
        );

        let result = self.dispatch_loop(&guard, &mut arrivals, &mut run);
        if let Err(e) = &result {
            warn!(error = %e, "dispatcher stopping early, releasing workers");
            guard.abort();
        }
        let joined = join_workers(run.workers);
        result?;
        joined?;

        let resource = guard.snapshot();
        let metrics = self.metrics();
        info!(
            ticks = metrics.ticks,
            preemptions = metrics.preemptions,
            "Scheduler finished, resource: {}",
            resource.render()
        );

        Ok(RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            admissions: run.admissions,
            marks: resource.marks().to_vec(),
            metrics,
        })
    }

    fn dispatch_loop(
        &mut self,
        guard: &Arc<SharedResourceGuard>,
        arrivals: &mut dyn ArrivalSource,
        run: &mut RunState,
    ) -> Result<()> {
        let total = self.specs.len();

        loop {
            run.tick += 1;
            self.record(|m| m.ticks += 1);

            if run.admissions.len() < total {
                self.admit_next(guard, arrivals, run)?;
            }

            let head = self.grant_head(guard, &mut run.queue)?;

            if let Some(head) = head {
                if run.admissions.len() < total {
                    match guard.wait_slice(head, self.config.time_slice())? {
                        SliceOutcome::Elapsed => {
                            guard.preempt(head)?;
                            self.record(|m| m.preemptions += 1);
                            debug!(task = %head, tick = run.tick, "time slice elapsed");
                        }
                        SliceOutcome::Completed => {
                            self.record(|m| m.early_completions += 1);
                            debug!(task = %head, tick = run.tick, "completed within slice");
                        }
                    }
                } else {
                    // Nothing left to arrive: the head runs to completion.
                    guard.wait_completion(head)?;
                }
            }

            if let Some(fault) = guard.take_fault() {
                return Err(fault);
            }

            if guard.all_completed() {
                // Tasks that finished after the last grant are still queued.
                while let Some(task) = run.queue.remove_head() {
                    self.record(|m| m.record_drain());
                    debug!(task = %task, "drained at shutdown");
                }
                info!(tick = run.tick, "all tasks completed");
                return Ok(());
            }
        }
    }

    /// Ask the arrival source for one task, start its worker, and queue it.
    fn admit_next(
        &mut self,
        guard: &Arc<SharedResourceGuard>,
        arrivals: &mut dyn ArrivalSource,
        run: &mut RunState,
    ) -> Result<()> {
        let task = arrivals.next_arrival().ok_or_else(|| {
            SchedError::Protocol(format!(
                "arrival source exhausted with {} tasks still pending",
                self.specs.len() - run.admissions.len()
            ))
        })?;

        let priority = self
            .specs
            .iter()
            .find(|s| s.id == task)
            .map(|s| s.priority)
            .ok_or(SchedError::UnknownTask(task))?;

        if run.arrived(task) {
            return Err(SchedError::DuplicateArrival(task));
        }
        let payload = self
            .payloads
            .remove(&task)
            .ok_or(SchedError::DuplicateArrival(task))?;

        let handle = worker::spawn(Arc::clone(guard), Arc::clone(&self.metrics), task, payload)?;
        run.workers.push((task, handle));
        run.admissions.push(Admission {
            task,
            tick: run.tick,
            marks_before: guard.marks_len(),
        });
        run.queue.insert(task, priority);

        info!(task = %task, priority = %priority, tick = run.tick, "{} is called", task);
        debug!(queue = ?run.queue.task_ids(), "ready queue");
        Ok(())
    }

    /// Grant the first queue head that has not completed yet, removing
    /// completed heads on the way. `None` when the queue runs dry.
    fn grant_head(&self, guard: &SharedResourceGuard, queue: &mut ReadyQueue) -> Result<Option<TaskId>> {
        while let Some(head) = queue.peek_head() {
            if !guard.is_completed(head)? {
                guard.grant(head)?;
                self.record(|m| m.grants += 1);
                return Ok(Some(head));
            }

            queue.remove_head();
            self.record(|m| m.record_drain());
            info!(task = %head, "{} completed, removed from queue", head);
        }
        Ok(None)
    }

    fn record(&self, f: impl FnOnce(&mut SchedulerMetrics)) {
        if let Ok(mut m) = self.metrics.write() {
            f(&mut m);
        }
    }
}

/// Join every worker thread, reporting the first that panicked.
fn join_workers(workers: Vec<(TaskId, JoinHandle<()>)>) -> Result<()> {
    let mut first_err = None;
    for (task, handle) in workers {
        if handle.join().is_err() && first_err.is_none() {
            first_err = Some(SchedError::WorkerPanicked(task));
        }
    }
    first_err.map_or(Ok(()), Err)
}
