//! JsonlSource - newline-delimited JSON record reader
//!
//! Lines are read lazily; the source is an iterator that ends at EOF or at the
//! first I/O error. Lines that are not UTF-8 surface as parse errors.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{RawFrame, SourceParseError};
use tracing::{debug, error, info, instrument};

use crate::error::{IngestionError, Result};
use crate::metrics::IngestionMetrics;
use crate::record::parse_record;

/// Lazy record source over any buffered reader
#[derive(Debug)]
pub struct JsonlSource<R = BufReader<File>> {
    label: String,
    reader: R,
    line_no: u64,
    done: bool,
    metrics: Arc<IngestionMetrics>,
}

impl JsonlSource {
    /// Open a JSONL file. Failure here is fatal for the agent.
    #[instrument(name = "source_open", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| IngestionError::Open {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), "Record source opened");
        Ok(Self::from_reader(
            path.display().to_string(),
            BufReader::new(file),
        ))
    }
}

impl<R: BufRead> JsonlSource<R> {
    /// Wrap an already-open reader (tests, stdin)
    pub fn from_reader(label: impl Into<String>, reader: R) -> Self {
        Self {
            label: label.into(),
            reader,
            line_no: 0,
            done: false,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// Shared metrics handle, readable after the source is consumed
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl<R: BufRead> Iterator for JsonlSource<R> {
    type Item = std::result::Result<RawFrame, SourceParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut raw = Vec::new();
        loop {
            if self.done {
                return None;
            }

            raw.clear();
            match self.reader.read_until(b'\n', &mut raw) {
                Ok(0) => {
                    debug!(source = %self.label, lines = self.line_no, "Record source exhausted");
                    self.done = true;
                    return None;
                }
                Ok(_) => {
                    self.line_no += 1;
                    let line = match std::str::from_utf8(&raw) {
                        Ok(line) => line,
                        Err(_) => {
                            self.metrics.record_read();
                            self.metrics.record_parse_error();
                            return Some(Err(SourceParseError::new(self.line_no, "invalid UTF-8")));
                        }
                    };

                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    self.metrics.record_read();
                    let parsed = parse_record(self.line_no, trimmed);
                    match &parsed {
                        Ok(_) => self.metrics.record_parsed(),
                        Err(_) => self.metrics.record_parse_error(),
                    }
                    return Some(parsed);
                }
                Err(e) => {
                    error!(
                        source = %self.label,
                        line = self.line_no + 1,
                        error = %e,
                        "Record source read failed, ending stream"
                    );
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
