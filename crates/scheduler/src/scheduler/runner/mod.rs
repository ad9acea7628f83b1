//! Dispatcher -- owns the ready queue and drives the tick loop.
//!
//! Split into focused submodules:
//! - `core`: Scheduler struct, constructor, task registration, accessors
//! - `dispatch`: the admit / grant / drain / slice / preempt loop

mod core;
mod dispatch;

pub use self::core::Scheduler;
