//! Pipeline entry points for the relay.
//!
//! - `run_cycle`: one acquisition and delivery attempt
//! - `PollLoop`: resident scheduler driving cycles on an interval

pub mod cycle;
pub mod dedup;
pub mod poll;

pub use cycle::{Acquisition, CycleOutcome, run_cycle};
pub use dedup::DedupState;
pub use poll::{CycleReport, PollLoop};
