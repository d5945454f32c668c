//! Newline-delimited JSON streams of [`KeyValue`] records.
//!
//! This is the serialization convention shared by the map-output writer,
//! the reduce merger's reader and the reduce output file. A reader
//! distinguishes a clean end of stream from trailing bytes that fail to
//! parse, so a truncated or damaged partition fails loudly instead of
//! silently shortening the merge input.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::KeyValue;

/// Errors produced while reading a record stream.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("record stream i/o: {0}")]
    Io(#[from] io::Error),

    /// Bytes were present but did not parse as a record.
    #[error("corrupt record on line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Streaming reader over a file of serialized [`KeyValue`] records.
pub struct RecordReader<R> {
    inner: R,
    line: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, line: 0 }
    }

    fn read_record(&mut self) -> Option<Result<KeyValue, CodecError>> {
        let mut buf = String::new();
        loop {
            buf.clear();
            match self.inner.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let record = buf.trim_end();
                    if record.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(record).map_err(|source| {
                        CodecError::Corrupt {
                            line: self.line,
                            source,
                        }
                    }));
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<KeyValue, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record()
    }
}

/// Writer emitting one serialized [`KeyValue`] record per line.
pub struct RecordWriter<W> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write(&mut self, kv: &KeyValue) -> io::Result<()> {
        serde_json::to_writer(&mut self.inner, kv).map_err(io::Error::from)?;
        self.inner.write_all(b"\n")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
