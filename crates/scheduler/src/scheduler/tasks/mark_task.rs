use std::time::Duration;

use presched_core::TaskSpec;

use crate::scheduler::task::{PayloadError, TaskPayload, UnitContext};

/// Appends the task's mark to the shared resource once per work unit,
/// then holds the unit open for a fixed delay.
pub struct MarkTask {
    name: String,
    mark: char,
    delay: Duration,
}

impl MarkTask {
    pub fn new(spec: &TaskSpec, delay: Duration) -> Self {
        Self {
            name: format!("{} ({})", spec.id, spec.display_label()),
            mark: spec.mark,
            delay,
        }
    }
}

impl TaskPayload for MarkTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&mut self, ctx: &mut UnitContext<'_>) -> Result<(), PayloadError> {
        ctx.resource.append(ctx.task, ctx.iteration, self.mark);
        Ok(())
    }

    fn unit_delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::guard::SharedResource;

    #[test]
    fn execute_appends_mark() {
        let spec = TaskSpec::new(1, 1, 2).unwrap().with_label("HIGH");
        let mut task = MarkTask::new(&spec, Duration::from_millis(5));
        let mut resource = SharedResource::default();

        for iteration in 0..2 {
            let mut ctx = UnitContext { task: spec.id, iteration, resource: &mut resource };
            task.execute(&mut ctx).unwrap();
        }

        assert_eq!(resource.render(), "bb");
        assert_eq!(resource.marks()[1].iteration, 1);
        assert_eq!(task.name(), "task 1 (HIGH)");
        assert_eq!(task.unit_delay(), Duration::from_millis(5));
    }
}
