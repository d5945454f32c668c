//! Worker-side task execution: the reduce merge.
//!
//! The coordinator schedules reduce task numbers onto worker processes;
//! [`do_reduce`] is the body of one such task. Any error it returns is
//! fatal to the hosting worker process, which the coordinator then
//! observes as a dispatch failure and reassigns.

pub mod reduce;

pub use reduce::do_reduce;
