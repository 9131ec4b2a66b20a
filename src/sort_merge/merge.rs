//! Apply a changeset to a sorted main file
//!
//! Three inputs, all sorted by identifier:
//! - main: the current master file, optionally one segment `[min_id, max_id)` of it
//! - mods: new and modified records
//! - deletes: identifiers to remove (text, one per line)
//!
//! At each step the main identifier is compared with the current mod and delete identifiers:
//!
//! | main vs mod | main vs del | action                                   |
//! |-------------|-------------|------------------------------------------|
//! | <           | <           | unchanged, main copied verbatim          |
//! | =           | =           | deleted (delete wins over the edit)      |
//! | <           | =           | deleted                                  |
//! | =           | <           | edited, mod written instead of main      |
//! | otherwise   |             | mod/del before main: cancel, add, or no-op |
//!
//! A mod and a delete with the same identifier that both sort before main cancel out: the
//! record was added and deleted in the same changeset and is not written.

use std::cmp::Ordering;
use std::io::{BufRead, Read, Write};

use serde::Serialize;
use tracing::debug;

use super::{compare_keys, Cursor};
use crate::delete_log::{DeleteEntry, DeleteLogReader};
use crate::error::Result;
use crate::natural_order::IdentifierOrder;
use crate::raw_record::RawRecord;
use crate::reader::{RawRecordReader, ReaderStats};

/// What happened to one identifier during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeAction {
    Unchanged,
    Edited,
    Added,
    Deleted,
    /// Added and deleted in the same changeset
    Canceled,
    /// Delete of an identifier that is not in main
    AbsentDelete,
    /// Changeset entry below the segment's lower bound
    SkippedBelowMin,
    /// Main record at or above the segment's upper bound, copied verbatim
    PassedThrough,
}

impl MergeAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Edited => "changed",
            Self::Added => "added",
            Self::Deleted => "deleted",
            Self::Canceled => "canceled",
            Self::AbsentDelete => "already absent",
            Self::SkippedBelowMin => "below segment",
            Self::PassedThrough => "beyond segment",
        }
    }

    /// Whether the action is reported on the diagnostics channel
    fn is_notable(&self) -> bool {
        !matches!(self, Self::Unchanged | Self::PassedThrough)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub unchanged: u64,
    pub edited: u64,
    pub added: u64,
    pub deleted: u64,
    pub canceled: u64,
    pub absent_deletes: u64,
    pub skipped_below_min: u64,
    pub passed_through: u64,
    /// Records written to the main output
    pub written: u64,
    pub main_reader: ReaderStats,
    pub mods_reader: ReaderStats,
}

impl MergeStats {
    fn count(&mut self, action: MergeAction) {
        let slot = match action {
            MergeAction::Unchanged => &mut self.unchanged,
            MergeAction::Edited => &mut self.edited,
            MergeAction::Added => &mut self.added,
            MergeAction::Deleted => &mut self.deleted,
            MergeAction::Canceled => &mut self.canceled,
            MergeAction::AbsentDelete => &mut self.absent_deletes,
            MergeAction::SkippedBelowMin => &mut self.skipped_below_min,
            MergeAction::PassedThrough => &mut self.passed_through,
        };
        *slot += 1;
    }
}

/// Outcome of rewriting a delete log against a changeset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteLogStats {
    /// Entries copied unchanged
    pub kept: u64,
    /// Entries deleted again, written with the new line
    pub rewritten: u64,
    /// Newly deleted identifiers
    pub added: u64,
    /// Entries dropped because the record came back in the mods
    pub revived: u64,
}

type RecordCursor<R> = Cursor<RawRecordReader<R>, RawRecord>;
type DeleteCursor<R> = Cursor<DeleteLogReader<R>, DeleteEntry>;

pub struct StreamMerger<'w, O> {
    order: O,
    min_id: Option<String>,
    max_id: Option<String>,
    new_records: Option<&'w mut dyn Write>,
    diagnostics: Option<&'w mut dyn Write>,
    stats: MergeStats,
}

impl<'w, O: IdentifierOrder> StreamMerger<'w, O> {
    pub fn new(order: O) -> Self {
        Self {
            order,
            min_id: None,
            max_id: None,
            new_records: None,
            diagnostics: None,
            stats: MergeStats::default(),
        }
    }

    /// Restrict the merge to the main segment `[min_id, max_id)`.
    pub fn with_bounds(mut self, min_id: Option<String>, max_id: Option<String>) -> Self {
        self.min_id = min_id;
        self.max_id = max_id;
        self
    }

    /// Also write added records to `out`.
    pub fn with_new_records(mut self, out: &'w mut dyn Write) -> Self {
        self.new_records = Some(out);
        self
    }

    /// Write one line per deleted/changed/added/canceled identifier to `out`.
    pub fn with_diagnostics(mut self, out: &'w mut dyn Write) -> Self {
        self.diagnostics = Some(out);
        self
    }

    pub fn stats(&self) -> &MergeStats {
        &self.stats
    }

    /// Merge `mods` and `deletes` into `main`, writing the updated main stream to `out`.
    pub fn merge<M, N, D, W>(
        &mut self,
        main: RawRecordReader<M>,
        mods: RawRecordReader<N>,
        deletes: DeleteLogReader<D>,
        out: &mut W,
    ) -> Result<MergeStats>
    where
        M: Read,
        N: Read,
        D: BufRead,
        W: Write + ?Sized,
    {
        self.stats = MergeStats::default();
        let mut main = Cursor::new(main)?;
        let mut mods = Cursor::new(mods)?;
        let mut dels = Cursor::new(deletes)?;

        self.skip_below_min(&mut mods)?;
        self.skip_below_min(&mut dels)?;

        loop {
            let (vs_mod, vs_del) = match main.key() {
                None => break,
                Some(key) if self.at_or_above_max(key) => break,
                Some(key) => (
                    compare_keys(&self.order, Some(key), mods.key()),
                    compare_keys(&self.order, Some(key), dels.key()),
                ),
            };

            match (vs_mod, vs_del) {
                (Ordering::Less, Ordering::Less) => {
                    if let Some(record) = main.advance()? {
                        self.emit(out, &record)?;
                        self.note(MergeAction::Unchanged, record.key())?;
                    }
                }
                (Ordering::Equal, Ordering::Equal) | (Ordering::Less, Ordering::Equal) => {
                    if vs_mod == Ordering::Equal {
                        mods.advance()?;
                    }
                    dels.advance()?;
                    if let Some(record) = main.advance()? {
                        self.note(MergeAction::Deleted, record.key())?;
                    }
                }
                (Ordering::Equal, Ordering::Less) => {
                    main.advance()?;
                    if let Some(record) = mods.advance()? {
                        self.emit(out, &record)?;
                        self.note(MergeAction::Edited, record.key())?;
                    }
                }
                _ => self.changeset_before_main(&mut mods, &mut dels, out)?,
            }
        }

        self.flush_trailing_mods(&mut mods, &mut dels, out)?;

        // Main records beyond the segment are not touched by this changeset
        while let Some(record) = main.advance()? {
            self.emit(out, &record)?;
            self.note(MergeAction::PassedThrough, record.key())?;
        }

        self.stats.main_reader = main.inner().stats();
        self.stats.mods_reader = mods.inner().stats();
        Ok(self.stats)
    }

    /// Rewrite an existing delete log (sorted) against the same changeset.
    ///
    /// The log takes the role of main: ids deleted again are rewritten, ids that came back in
    /// the mods are dropped, and new deletes are added in order.
    pub fn merge_delete_log<L, N, D, W>(
        &mut self,
        log: DeleteLogReader<L>,
        mods: RawRecordReader<N>,
        deletes: DeleteLogReader<D>,
        out: &mut W,
    ) -> Result<DeleteLogStats>
    where
        L: BufRead,
        N: Read,
        D: BufRead,
        W: Write + ?Sized,
    {
        let mut stats = DeleteLogStats::default();
        let mut log = Cursor::new(log)?;
        let mut mods = Cursor::new(mods)?;
        let mut dels = Cursor::new(deletes)?;

        loop {
            let (vs_mod, vs_del) = match log.key() {
                None => break,
                Some(key) => (
                    compare_keys(&self.order, Some(key), mods.key()),
                    compare_keys(&self.order, Some(key), dels.key()),
                ),
            };

            match (vs_mod, vs_del) {
                (Ordering::Less, Ordering::Less) => {
                    if let Some(entry) = log.advance()? {
                        write_line(out, &entry.line)?;
                        stats.kept += 1;
                    }
                }
                (Ordering::Equal, Ordering::Equal) | (Ordering::Less, Ordering::Equal) => {
                    if vs_mod == Ordering::Equal {
                        mods.advance()?;
                    }
                    log.advance()?;
                    if let Some(entry) = dels.advance()? {
                        write_line(out, &entry.line)?;
                        stats.rewritten += 1;
                    }
                }
                (Ordering::Equal, Ordering::Less) => {
                    mods.advance()?;
                    if let Some(entry) = log.advance()? {
                        debug!(id = %entry.id, "removing revived record from delete log");
                        stats.revived += 1;
                    }
                }
                _ => self.log_changeset_entry(&mut mods, &mut dels, &mut stats, out)?,
            }
        }

        while dels.key().is_some() {
            self.log_changeset_entry(&mut mods, &mut dels, &mut stats, out)?;
        }

        Ok(stats)
    }

    /// Smallest changeset entry when it sorts before the log entry: an added record needs
    /// no log line, a delete (canceled or not) gets one.
    fn log_changeset_entry<N, D, W>(
        &self,
        mods: &mut RecordCursor<N>,
        dels: &mut DeleteCursor<D>,
        stats: &mut DeleteLogStats,
        out: &mut W,
    ) -> Result<()>
    where
        N: Read,
        D: BufRead,
        W: Write + ?Sized,
    {
        match compare_keys(&self.order, mods.key(), dels.key()) {
            Ordering::Less => {
                mods.advance()?;
            }
            ordering => {
                if ordering == Ordering::Equal {
                    mods.advance()?;
                }
                if let Some(entry) = dels.advance()? {
                    write_line(out, &entry.line)?;
                    stats.added += 1;
                }
            }
        }
        Ok(())
    }

    /// Case where main is not the smallest identifier: a mod and/or delete sorts first.
    fn changeset_before_main<N, D, W>(
        &mut self,
        mods: &mut RecordCursor<N>,
        dels: &mut DeleteCursor<D>,
        out: &mut W,
    ) -> Result<()>
    where
        N: Read,
        D: BufRead,
        W: Write + ?Sized,
    {
        // The smaller of the two is the one before main
        match compare_keys(&self.order, mods.key(), dels.key()) {
            Ordering::Equal => {
                dels.advance()?;
                if let Some(record) = mods.advance()? {
                    self.note(MergeAction::Canceled, record.key())?;
                }
            }
            Ordering::Less => {
                if let Some(record) = mods.advance()? {
                    self.emit_added(out, &record)?;
                }
            }
            Ordering::Greater => {
                if let Some(entry) = dels.advance()? {
                    self.note(MergeAction::AbsentDelete, &entry.id)?;
                }
            }
        }
        Ok(())
    }

    /// After main is done: mods below the upper bound are adds unless canceled by a delete.
    fn flush_trailing_mods<N, D, W>(
        &mut self,
        mods: &mut RecordCursor<N>,
        dels: &mut DeleteCursor<D>,
        out: &mut W,
    ) -> Result<()>
    where
        N: Read,
        D: BufRead,
        W: Write + ?Sized,
    {
        while mods
            .key()
            .is_some_and(|key| !self.at_or_above_max(key))
        {
            self.changeset_before_main(mods, dels, out)?;
        }
        Ok(())
    }

    fn skip_below_min<I, T>(&mut self, cursor: &mut Cursor<I, T>) -> Result<()>
    where
        I: Iterator<Item = Result<T>>,
        T: super::Keyed,
    {
        let Some(min_id) = self.min_id.as_deref() else {
            return Ok(());
        };
        while cursor
            .key()
            .is_some_and(|key| self.order.compare(key, min_id) == Ordering::Less)
        {
            if let Some(item) = cursor.advance()? {
                debug!(id = item.key(), "skipping changeset entry below {min_id}");
                self.stats.count(MergeAction::SkippedBelowMin);
            }
        }
        Ok(())
    }

    fn at_or_above_max(&self, key: &str) -> bool {
        self.max_id
            .as_deref()
            .is_some_and(|max_id| self.order.compare(key, max_id) != Ordering::Less)
    }

    fn emit<W: Write + ?Sized>(&mut self, out: &mut W, record: &RawRecord) -> Result<()> {
        out.write_all(record.bytes())?;
        out.flush()?;
        self.stats.written += 1;
        Ok(())
    }

    fn emit_added<W: Write + ?Sized>(&mut self, out: &mut W, record: &RawRecord) -> Result<()> {
        self.emit(out, record)?;
        if let Some(new_records) = self.new_records.as_mut() {
            new_records.write_all(record.bytes())?;
            new_records.flush()?;
        }
        self.note(MergeAction::Added, record.key())
    }

    fn note(&mut self, action: MergeAction, id: &str) -> Result<()> {
        self.stats.count(action);
        if action.is_notable() {
            debug!(id, action = action.label(), "merge");
            if let Some(diagnostics) = self.diagnostics.as_mut() {
                writeln!(diagnostics, "{} {}", action.label(), id)?;
                diagnostics.flush()?;
            }
        }
        Ok(())
    }
}

fn write_line<W: Write + ?Sized>(out: &mut W, line: &str) -> Result<()> {
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
