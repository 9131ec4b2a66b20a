//! Pull reader over a stream of raw records
//!
//! Wraps a [`RecordFramer`] and, in combination mode, folds consecutive records with the same
//! identifier into one combined record. Combination only merges adjacent records, so it gives
//! one record per identifier only when the input is sorted.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, warn};

use crate::config::StreamConfig;
use crate::error::Result;
use crate::raw_record::{RawRecord, ReadOutcome, RecordFramer};

/// I/O buffer for file-backed readers
const IO_BUFFER_SIZE: usize = 1024 * 1024;
/// Bytes of an unrecoverable fragment shown in the warning
const PREVIEW_LEN: usize = 24;

/// Counters kept while reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReaderStats {
    /// Framed records, before combination
    pub records: u64,
    /// Records framed by terminator rescan
    pub recovered: u64,
    /// Fragments dropped because no terminator could be found
    pub unrecoverable: u64,
    /// Records folded into a preceding record with the same identifier
    pub combined: u64,
}

pub struct RawRecordReader<R> {
    framer: RecordFramer<R>,
    combine: bool,
    /// Next record to hand out (possibly already combined)
    current: Option<RawRecord>,
    /// Record after `current`, only used to detect same-identifier runs
    following: Option<RawRecord>,
    exhausted: bool,
    stats: ReaderStats,
    label: String,
}

impl RawRecordReader<BufReader<File>> {
    pub fn open(path: &Path, config: &StreamConfig) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::with_capacity(IO_BUFFER_SIZE, file), config)
            .with_label(path.display().to_string()))
    }
}

impl<R: Read> RawRecordReader<R> {
    pub fn new(source: R, config: &StreamConfig) -> Self {
        Self {
            framer: RecordFramer::new(source).with_id_tag(config.id_tag),
            combine: config.combine_records,
            current: None,
            following: None,
            exhausted: false,
            stats: ReaderStats::default(),
            label: "<stream>".to_string(),
        }
    }

    /// Reader with default tag `001` and no combination.
    pub fn plain(source: R) -> Self {
        Self::new(source, &StreamConfig::default().with_combine(false))
    }

    /// Name used in log lines (usually the file path).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether another (possibly combined) record is available.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.current.is_none() {
            self.current = match self.following.take() {
                Some(record) => Some(record),
                None => self.read_one()?,
            };
        }
        if self.combine {
            self.fold_run()?;
        }
        Ok(self.current.is_some())
    }

    /// Next (possibly combined) record, or `None` at end of input.
    pub fn next_record(&mut self) -> Result<Option<RawRecord>> {
        if !self.has_next()? {
            return Ok(None);
        }
        Ok(self.current.take())
    }

    /// Identifier of the record `next_record` would return.
    pub fn peek_key(&mut self) -> Result<Option<&str>> {
        self.has_next()?;
        Ok(self.current.as_ref().map(RawRecord::key))
    }

    fn fold_run(&mut self) -> Result<()> {
        let Some(mut current) = self.current.take() else {
            return Ok(());
        };
        // Records without a usable identifier are never folded into one another
        if !current.identifier().is_ok_and(|id| !id.is_empty()) {
            self.current = Some(current);
            return Ok(());
        }
        loop {
            if self.following.is_none() {
                self.following = self.read_one()?;
            }
            match self.following.take() {
                Some(next) if next.key() == current.key() => {
                    debug!(id = current.key(), source = %self.label, "combining duplicate record");
                    self.stats.combined += 1;
                    current = current.combine(next);
                }
                other => {
                    self.following = other;
                    break;
                }
            }
        }
        self.current = Some(current);
        Ok(())
    }

    /// Frame the next record, logging and skipping fragments that cannot be recovered.
    fn read_one(&mut self) -> Result<Option<RawRecord>> {
        while !self.exhausted {
            match self.framer.next_frame()? {
                ReadOutcome::Record(record) => {
                    self.accept(&record);
                    return Ok(Some(record));
                }
                ReadOutcome::Recovered { record, reason } => {
                    self.stats.recovered += 1;
                    warn!(
                        source = %self.label,
                        id = record.key(),
                        "recovered malformed record: {reason}"
                    );
                    self.accept(&record);
                    return Ok(Some(record));
                }
                ReadOutcome::Unrecoverable { context, discarded } => {
                    self.stats.unrecoverable += 1;
                    warn!(
                        source = %self.label,
                        bytes = discarded.len(),
                        preview = %hex::encode(&discarded[..discarded.len().min(PREVIEW_LEN)]),
                        "dropping unrecoverable record: {context}"
                    );
                }
                ReadOutcome::End => self.exhausted = true,
            }
        }
        Ok(None)
    }

    fn accept(&mut self, record: &RawRecord) {
        self.stats.records += 1;
        if let Err(e) = record.identifier() {
            warn!(
                source = %self.label,
                record = self.stats.records,
                "record has no usable identifier: {e}"
            );
        }
    }
}

impl<R: Read> Iterator for RawRecordReader<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str) -> Vec<u8> {
        RawRecord::assemble([("001", id), ("245", title)])
            .unwrap()
            .into_bytes()
    }

    fn stream(parts: &[Vec<u8>]) -> Vec<u8> {
        parts.concat()
    }

    fn keys<R: Read>(reader: RawRecordReader<R>) -> Vec<String> {
        reader
            .map(|r| r.unwrap().key().to_string())
            .collect()
    }

    #[test]
    fn test_plain_reader_yields_every_record() {
        let data = stream(&[record("1", "a"), record("1", "b"), record("2", "c")]);
        let reader = RawRecordReader::plain(&data[..]);
        assert_eq!(keys(reader), vec!["1", "1", "2"]);
    }

    #[test]
    fn test_combination_folds_runs() {
        let parts = [
            record("1", "a"),
            record("2", "b"),
            record("2", "c"),
            record("2", "d"),
            record("3", "e"),
        ];
        let data = stream(&parts);
        let mut reader = RawRecordReader::new(&data[..], &StreamConfig::default());

        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(first.bytes(), &parts[0][..]);
        let run = reader.next_record().unwrap().unwrap();
        assert_eq!(run.bytes(), &parts[1..4].concat()[..]);
        assert_eq!(run.key(), "2");
        let last = reader.next_record().unwrap().unwrap();
        assert_eq!(last.bytes(), &parts[4][..]);
        assert!(reader.next_record().unwrap().is_none());

        let stats = reader.stats();
        assert_eq!(stats.records, 5);
        assert_eq!(stats.combined, 2);
    }

    #[test]
    fn test_combination_only_merges_adjacent() {
        let data = stream(&[record("2", "a"), record("1", "b"), record("2", "c")]);
        let reader = RawRecordReader::new(&data[..], &StreamConfig::default());
        assert_eq!(keys(reader), vec!["2", "1", "2"]);
    }

    #[test]
    fn test_records_without_identifier_stay_separate() {
        let untitled = |title: &str| {
            RawRecord::assemble([("245", title)])
                .unwrap()
                .into_bytes()
        };
        // 001 is the first directory entry; a non-numeric length makes it unreadable
        let mut broken = record("5", "x");
        broken[27..31].copy_from_slice(b"xxxx");
        let data = stream(&[
            untitled("a"),
            untitled("b"),
            broken.clone(),
            broken,
            record("7", "c"),
        ]);
        let mut reader = RawRecordReader::new(&data[..], &StreamConfig::default());
        let mut count = 0;
        while let Some(r) = reader.next_record().unwrap() {
            assert_eq!(r.constituents().count(), 1);
            count += 1;
        }
        assert_eq!(count, 5);
        assert_eq!(reader.stats().combined, 0);
    }

    #[test]
    fn test_has_next_is_idempotent() {
        let data = stream(&[record("1", "a")]);
        let mut reader = RawRecordReader::new(&data[..], &StreamConfig::default());
        assert!(reader.has_next().unwrap());
        assert!(reader.has_next().unwrap());
        assert_eq!(reader.peek_key().unwrap(), Some("1"));
        assert!(reader.next_record().unwrap().is_some());
        assert!(!reader.has_next().unwrap());
    }

    #[test]
    fn test_unrecoverable_tail_ends_stream() {
        let good = record("1", "a");
        let mut data = good.clone();
        let broken = record("2", "b");
        data.extend_from_slice(&broken[..broken.len() - 1]);

        let mut reader = RawRecordReader::plain(&data[..]);
        assert_eq!(reader.next_record().unwrap().unwrap().bytes(), &good[..]);
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.stats().unrecoverable, 1);
    }

    #[test]
    fn test_recovered_record_is_counted() {
        let mut bad = record("1", "a");
        bad[..5].copy_from_slice(b"abcde");
        let data = stream(&[bad, record("2", "b")]);
        let mut reader = RawRecordReader::plain(&data[..]);
        assert_eq!(reader.by_ref().count(), 2);
        assert_eq!(reader.stats().recovered, 1);
    }
}
