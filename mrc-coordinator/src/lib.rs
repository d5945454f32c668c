//! Task scheduling for the MapReduce master.
//!
//! [`schedule`] runs one phase of a job: it drains worker addresses from
//! a shared [`WorkerFeed`], hands every task to exactly one worker at a
//! time through the [`WorkerClient`] RPC collaborator, retries failed
//! tasks on fresh workers and returns once the whole phase is done.

pub mod client;
pub mod schedule;
pub mod worker_feed;

pub use client::{WorkerAddr, WorkerClient};
pub use schedule::{schedule, RetryPolicy};
pub use worker_feed::WorkerFeed;
