pub mod command;
pub mod goal_ops;
pub mod rollover;
pub mod session;
pub mod stats;
pub mod task_ops;
pub mod timer_ops;
pub mod transform;
