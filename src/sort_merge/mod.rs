//! Sorted-stream algorithms
//!
//! Every algorithm here walks one or more inputs that are already sorted by identifier,
//! comparing the current identifier of each input in a single forward pass.
//!
//! ## Algorithms
//!
//! 1. **Merge**: apply a changeset (new/modified records + delete ids) to a main file
//! 2. **Sort**: order a file by identifier, or check that it already is
//! 3. **Diff**: classify identifiers of two snapshots as left-only, right-only or changed
//!
//! ## Memory Usage
//!
//! Merge and diff hold one current record per input. Sort in collect mode holds the whole
//! input.

pub mod diff;
pub mod merge;
pub mod sort;

pub use diff::{
    diff_lines, ChangeDetail, DiffEvent, DiffMode, DiffStats, LineChange, StreamDiffer,
};
pub use merge::{DeleteLogStats, MergeAction, MergeStats, StreamMerger};
pub use sort::{SortCheck, StreamSorter};

use std::cmp::Ordering;

use crate::delete_log::DeleteEntry;
use crate::error::Result;
use crate::natural_order::IdentifierOrder;
use crate::raw_record::RawRecord;

/// Anything a sorted input can be ordered by.
pub(crate) trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for RawRecord {
    fn key(&self) -> &str {
        RawRecord::key(self)
    }
}

impl Keyed for DeleteEntry {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Current item of one sorted input.
pub(crate) struct Cursor<I, T> {
    inner: I,
    current: Option<T>,
}

impl<I, T> Cursor<I, T>
where
    I: Iterator<Item = Result<T>>,
    T: Keyed,
{
    pub(crate) fn new(mut inner: I) -> Result<Self> {
        let current = inner.next().transpose()?;
        Ok(Self { inner, current })
    }

    pub(crate) fn key(&self) -> Option<&str> {
        self.current.as_ref().map(Keyed::key)
    }

    /// Hand out the current item and load the next one.
    pub(crate) fn advance(&mut self) -> Result<Option<T>> {
        let next = self.inner.next().transpose()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    pub(crate) fn inner(&self) -> &I {
        &self.inner
    }
}

/// Compare two optional keys; an exhausted input sorts after everything.
pub(crate) fn compare_keys<O: IdentifierOrder>(
    order: &O,
    a: Option<&str>,
    b: Option<&str>,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => order.compare(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::natural_order::NaturalOrder;

    #[test]
    fn test_exhausted_sorts_last() {
        assert_eq!(compare_keys(&NaturalOrder, Some("z"), None), Ordering::Less);
        assert_eq!(compare_keys(&NaturalOrder, None, Some("0")), Ordering::Greater);
        assert_eq!(compare_keys(&NaturalOrder, Some("9"), Some("10")), Ordering::Less);
    }

    #[test]
    fn test_cursor_advances() {
        let items = vec![Ok(DeleteEntry::new("1")), Ok(DeleteEntry::new("2"))];
        let mut cursor = Cursor::new(items.into_iter()).unwrap();
        assert_eq!(cursor.key(), Some("1"));
        assert_eq!(cursor.advance().unwrap().unwrap().id, "1");
        assert_eq!(cursor.key(), Some("2"));
        cursor.advance().unwrap();
        assert_eq!(cursor.key(), None);
        assert!(cursor.advance().unwrap().is_none());
    }
}
