//! Hierarchical tasks
//!
//! Goals decompose into trees of prerequisite tasks that advance one step
//! per tick. See [`task`] for the step protocol every variant follows.

pub mod construction;
pub mod context;
pub mod continuation;
pub mod household;
pub mod locate;
pub mod military;
pub mod movement;
pub mod production;
pub mod queue;
pub mod sourcing;
pub mod status;
pub mod task;
pub mod trade;

pub use context::TaskContext;
pub use continuation::Continuation;
pub use queue::TaskQueue;
pub use status::{TaskStatus, TaskValue};
pub use task::{Plan, Progress, Task, TaskBehavior, TaskKind};
