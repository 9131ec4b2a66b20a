//! marc-stream - Sorted-stream processing of raw MARC (ISO 2709) record files
//!
//! Records are kept as opaque framed bytes and keyed by a control-field identifier. On top of
//! a tolerant record framer the crate provides three single-pass algorithms over streams that
//! are sorted by identifier in natural order:
//!
//! - [`StreamMerger`]: apply new/modified records and deletes to a main file
//! - [`StreamSorter`]: sort a file, or check that it is sorted
//! - [`StreamDiffer`]: compare two snapshots
//!
//! ```no_run
//! use marc_stream::{DeleteLogReader, NaturalOrder, RawRecordReader, StreamConfig, StreamMerger};
//! use std::path::Path;
//!
//! # fn main() -> marc_stream::Result<()> {
//! let config = StreamConfig::default();
//! let main = RawRecordReader::open(Path::new("main.mrc"), &config)?;
//! let mods = RawRecordReader::open(Path::new("mods.mrc"), &config)?;
//! let deletes = DeleteLogReader::open_or_empty(Path::new("deletes.txt"))?;
//! let mut out = std::io::stdout().lock();
//! let stats = StreamMerger::new(NaturalOrder).merge(main, mods, deletes, &mut out)?;
//! eprintln!("{} records written", stats.written);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod decode;
pub mod delete_log;
pub mod error;
pub mod natural_order;
pub mod raw_record;
pub mod reader;
pub mod sort_merge;

pub use config::StreamConfig;
pub use decode::{LineFormat, RecordDecoder};
pub use delete_log::{DeleteEntry, DeleteLogReader};
pub use error::{MarcError, Result};
pub use natural_order::{natural_cmp, IdentifierOrder, LexicalOrder, NaturalOrder, OrderKind};
pub use raw_record::{RawRecord, ReadOutcome, RecordFramer, RecoveryReason, Tag};
pub use reader::{RawRecordReader, ReaderStats};
pub use sort_merge::{
    DiffEvent, DiffMode, DiffStats, MergeStats, SortCheck, StreamDiffer, StreamMerger,
    StreamSorter,
};
