//! Shared data model for a MapReduce scheduling core.
//!
//! The master hands [`Task`]s to workers over an RPC collaborator, and
//! workers exchange intermediate data as flat files of [`KeyValue`]
//! records (see [`codec`]). Intermediate and output file names follow
//! one convention, exposed here so every side of the job agrees on it.

use std::fmt;
use std::fmt::Formatter;
use std::hash::Hasher;

use serde::{Deserialize, Serialize};

pub mod codec;
pub mod task;

pub use task::{Phase, Task};

/////////////////////////////////////////////////////////////////////////////
// MapReduce application types
/////////////////////////////////////////////////////////////////////////////

/// A reduce function takes a key and the ordered list of all values
/// observed for that key, and returns a single reduced value.
pub type ReduceFn = fn(key: &str, values: &[String]) -> String;

/////////////////////////////////////////////////////////////////////////////
// Key-value pairs
/////////////////////////////////////////////////////////////////////////////

/// A single key-value pair, the atomic unit of intermediate and output
/// data.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct KeyValue {
    /// The key.
    pub key: String,

    /// The value.
    pub value: String,
}

impl KeyValue {
    /// Construct a new key-value pair from the given key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.key, self.value)
    }
}

/// Hashes an intermediate key. Compute a reduce bucket for a given key
/// by calculating `ihash(key) % n_reduce`.
pub fn ihash(key: &[u8]) -> u32 {
    let mut hasher = fnv::FnvHasher::with_key(0);
    hasher.write(key);
    let value = hasher.finish() & 0x7fffffff;
    u32::try_from(value).expect("Failed to compute ihash of value")
}

/// The reduce task a key belongs to, given `n_reduce` partitions.
pub fn partition_for(key: &str, n_reduce: usize) -> usize {
    ihash(key.as_bytes()) as usize % n_reduce
}

/////////////////////////////////////////////////////////////////////////////
// File naming
/////////////////////////////////////////////////////////////////////////////

/// Name of the intermediate file that map task `map_task` produces for
/// reduce task `reduce_task`.
pub fn reduce_name(job_name: &str, map_task: usize, reduce_task: usize) -> String {
    format!("mrtmp.{job_name}-{map_task}-{reduce_task}")
}

/// Name of the output file written by reduce task `reduce_task`.
pub fn merge_name(job_name: &str, reduce_task: usize) -> String {
    format!("mrtmp.{job_name}-res-{reduce_task}")
}
