pub mod attempt;

pub use attempt::TaskIntervals;
pub(crate) use attempt::spawn_attempt_tasks;
