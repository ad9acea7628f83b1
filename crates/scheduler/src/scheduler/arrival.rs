use std::collections::VecDeque;

use presched_core::TaskId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies not-yet-arrived task ids, one per call.
///
/// The dispatcher treats the order as opaque. An implementation must never
/// return the same id twice; the dispatcher checks this and fails the run
/// with [`SchedError::DuplicateArrival`](presched_core::SchedError::DuplicateArrival) if it does.
pub trait ArrivalSource {
    /// Next arriving task, or `None` once every task has arrived.
    fn next_arrival(&mut self) -> Option<TaskId>;
}

/// Picks uniformly among the tasks that have not started yet.
pub struct RandomArrivals {
    pending: Vec<TaskId>,
    rng: StdRng,
}

impl RandomArrivals {
    pub fn new(tasks: impl IntoIterator<Item = TaskId>) -> Self {
        Self {
            pending: tasks.into_iter().collect(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible arrival order for a given seed.
    pub fn seeded(tasks: impl IntoIterator<Item = TaskId>, seed: u64) -> Self {
        Self {
            pending: tasks.into_iter().collect(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl ArrivalSource for RandomArrivals {
    fn next_arrival(&mut self) -> Option<TaskId> {
        if self.pending.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.pending.len());
        Some(self.pending.remove(index))
    }
}

/// Replays a fixed arrival order.
#[derive(Debug, Clone)]
pub struct ScriptedArrivals {
    order: VecDeque<TaskId>,
}

impl ScriptedArrivals {
    pub fn new(order: impl IntoIterator<Item = TaskId>) -> Self {
        Self {
            order: order.into_iter().collect(),
        }
    }
}

impl ArrivalSource for ScriptedArrivals {
    fn next_arrival(&mut self) -> Option<TaskId> {
        self.order.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn ids(n: u32) -> Vec<TaskId> {
        (0..n).map(TaskId).collect()
    }

    fn drain(source: &mut impl ArrivalSource) -> Vec<TaskId> {
        std::iter::from_fn(|| source.next_arrival()).collect()
    }

    #[test]
    fn random_arrivals_yield_each_task_once() {
        let mut source = RandomArrivals::new(ids(8));
        let order = drain(&mut source);

        assert_eq!(order.len(), 8);
        let unique: HashSet<TaskId> = order.iter().copied().collect();
        assert_eq!(unique.len(), 8);
        assert_eq!(source.remaining(), 0);
        assert_eq!(source.next_arrival(), None);
    }

    #[test]
    fn seeded_arrivals_are_reproducible() {
        let first = drain(&mut RandomArrivals::seeded(ids(6), 42));
        let second = drain(&mut RandomArrivals::seeded(ids(6), 42));
        assert_eq!(first, second);
    }

    #[test]
    fn scripted_arrivals_replay_order() {
        let mut source = ScriptedArrivals::new([TaskId(2), TaskId(0), TaskId(1)]);
        assert_eq!(drain(&mut source), vec![TaskId(2), TaskId(0), TaskId(1)]);
    }
}
