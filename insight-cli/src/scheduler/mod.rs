//! Scheduler layer
//!
//! Drives a submitted query to a terminal outcome. The poller probes the job
//! at a fixed pace, stops it early once enough rows have arrived, and turns
//! every non-success status into an explicit error.

pub mod delay;
pub mod poller;

pub use delay::{Delay, TokioDelay};
pub use poller::{PollError, PollOutcome, PollPolicy, QueryPoller};
