//! Batch orchestration: one work at a time, one volume at a time, with the
//! checkpoint observing progress at both granularities

pub mod batch_driver;
pub mod supervisor;
pub mod work_processor;

pub use batch_driver::{BatchDriver, BatchStats};
pub use supervisor::{RetryPolicy, Supervisor};
pub use work_processor::{WorkOutcome, WorkProcessor};
