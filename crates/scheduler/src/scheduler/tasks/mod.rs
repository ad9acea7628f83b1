pub mod mark_task;

pub use mark_task::MarkTask;
