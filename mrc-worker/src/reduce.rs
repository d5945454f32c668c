use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use common::codec::{RecordReader, RecordWriter};
use common::{KeyValue, ReduceFn};

/// Runs one reduce task: reads the intermediate partition produced for
/// it by each of the `n_map` map tasks, sorts the records by key, calls
/// `reduce_fn` once per distinct key with all of that key's values, and
/// writes the reduced records to `out_file` in ascending key order.
///
/// `partition_path` locates the partition file for
/// `(job_name, map_task, reduce_task)`; the naming scheme belongs to
/// the embedding framework (see [`common::reduce_name`] for the default
/// convention).
///
/// A missing or unreadable partition is an error, as is a corrupt
/// record ([`common::codec::CodecError::Corrupt`]). Zero partitions or
/// all-empty partitions still produce `out_file`, with zero records.
pub fn do_reduce(
    job_name: &str,
    reduce_task: usize,
    out_file: &Path,
    n_map: usize,
    reduce_fn: ReduceFn,
    partition_path: impl Fn(&str, usize, usize) -> PathBuf,
) -> anyhow::Result<()> {
    info!("reduce task {reduce_task}: merging {n_map} partitions");

    let mut pairs: Vec<KeyValue> = Vec::new();
    for map_task in 0..n_map {
        let path = partition_path(job_name, map_task, reduce_task);
        let file = File::open(&path)
            .with_context(|| format!("failed to open partition {}", path.display()))?;
        for record in RecordReader::new(BufReader::new(file)) {
            pairs.push(record.with_context(|| format!("reading partition {}", path.display()))?);
        }
    }
    debug!("reduce task {reduce_task}: {} records", pairs.len());

    // Stable sort: records sharing a key keep map-index order, then
    // within-file order, so reduce_fn sees values in a reproducible
    // sequence.
    pairs.sort_by(|a, b| a.key.cmp(&b.key));

    let out = File::create(out_file)
        .with_context(|| format!("failed to create output {}", out_file.display()))?;
    let mut writer = RecordWriter::new(BufWriter::new(out));

    let mut start = 0;
    while start < pairs.len() {
        let mut stop = start + 1;
        while stop < pairs.len() && pairs[stop].key == pairs[start].key {
            stop += 1;
        }
        let values: Vec<String> = pairs[start..stop]
            .iter()
            .map(|kv| kv.value.clone())
            .collect();
        let reduced = reduce_fn(&pairs[start].key, &values);
        writer.write(&KeyValue::new(pairs[start].key.clone(), reduced))?;
        start = stop;
    }
    writer.flush()?;

    Ok(())
}
