use std::fmt;

use serde::{Deserialize, Serialize};

/// The Map or Reduce stage of one job execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Map,
    Reduce,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Map => write!(f, "map"),
            Phase::Reduce => write!(f, "reduce"),
        }
    }
}

/// One unit of work handed to a worker over RPC.
///
/// Constructed fresh per dispatch attempt; there is no shared mutable
/// state between attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// The name of the whole MapReduce job.
    pub job_name: String,

    /// Input file for the task. Only meaningful during the map phase.
    pub file: String,

    /// Which phase this task belongs to.
    pub phase: Phase,

    /// Task index within the phase, dense in `[0, ntasks)`.
    pub task_number: usize,

    /// How many partition files the worker should produce (map) or
    /// consume (reduce).
    pub num_other_phase: usize,
}
