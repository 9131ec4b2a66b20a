//! Compare two sorted record streams
//!
//! Walks `left` and `right` together. Identifiers present on one side only are reported as
//! such; records present on both sides are compared byte for byte and, when they differ,
//! described according to the [`DiffMode`]:
//!
//! - `Summary`: identifier only, no decoding
//! - `Full`: both records decoded to text
//! - `Lines`: decoded line by line, reporting only the differing lines

use std::cmp::Ordering;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{compare_keys, Cursor};
use crate::decode::RecordDecoder;
use crate::error::{MarcError, Result};
use crate::natural_order::IdentifierOrder;
use crate::reader::{RawRecordReader, ReaderStats};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    Summary,
    Full,
    #[default]
    Lines,
}

impl FromStr for DiffMode {
    type Err = MarcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "full" => Ok(Self::Full),
            "lines" => Ok(Self::Lines),
            _ => Err(MarcError::InvalidConfig(format!(
                "unknown diff mode {s:?} (expected summary, full or lines)"
            ))),
        }
    }
}

/// One line-level difference between two decoded records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum LineChange {
    Removed { line: String },
    Added { line: String },
    Modified { left: String, right: String },
}

impl LineChange {
    fn swapped(self) -> Self {
        match self {
            Self::Removed { line } => Self::Added { line },
            Self::Added { line } => Self::Removed { line },
            Self::Modified { left, right } => Self::Modified {
                left: right,
                right: left,
            },
        }
    }
}

impl fmt::Display for LineChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removed { line } => write!(f, "< {line}"),
            Self::Added { line } => write!(f, "> {line}"),
            Self::Modified { left, right } => write!(f, "< {left}\n> {right}"),
        }
    }
}

/// How a changed record is described.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "detail", rename_all = "snake_case")]
pub enum ChangeDetail {
    None,
    Dump { left: String, right: String },
    Lines { changes: Vec<LineChange> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffEvent {
    OnlyLeft { id: String },
    OnlyRight { id: String },
    Changed { id: String, detail: ChangeDetail },
}

impl DiffEvent {
    pub fn id(&self) -> &str {
        match self {
            Self::OnlyLeft { id } | Self::OnlyRight { id } | Self::Changed { id, .. } => id,
        }
    }

    /// The event as seen from a diff with the inputs exchanged.
    pub fn swapped(self) -> Self {
        match self {
            Self::OnlyLeft { id } => Self::OnlyRight { id },
            Self::OnlyRight { id } => Self::OnlyLeft { id },
            Self::Changed { id, detail } => Self::Changed {
                id,
                detail: match detail {
                    ChangeDetail::None => ChangeDetail::None,
                    ChangeDetail::Dump { left, right } => ChangeDetail::Dump {
                        left: right,
                        right: left,
                    },
                    ChangeDetail::Lines { changes } => ChangeDetail::Lines {
                        changes: changes.into_iter().map(LineChange::swapped).collect(),
                    },
                },
            },
        }
    }

    /// Text form: a header line, then any detail lines.
    pub fn write_text<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        match self {
            Self::OnlyLeft { id } => writeln!(out, "only in left: {id}")?,
            Self::OnlyRight { id } => writeln!(out, "only in right: {id}")?,
            Self::Changed { id, detail } => {
                writeln!(out, "changed: {id}")?;
                match detail {
                    ChangeDetail::None => {}
                    ChangeDetail::Dump { left, right } => {
                        writeln!(out, "--- left")?;
                        out.write_all(left.as_bytes())?;
                        writeln!(out, "--- right")?;
                        out.write_all(right.as_bytes())?;
                    }
                    ChangeDetail::Lines { changes } => {
                        for change in changes {
                            writeln!(out, "{change}")?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub same: u64,
    pub changed: u64,
    pub only_left: u64,
    pub only_right: u64,
    /// Changed records whose detail could not be decoded
    pub undecodable: u64,
    pub left_reader: ReaderStats,
    pub right_reader: ReaderStats,
}

impl DiffStats {
    pub fn has_differences(&self) -> bool {
        self.changed + self.only_left + self.only_right > 0
    }
}

pub struct StreamDiffer<O, D> {
    order: O,
    decoder: D,
    mode: DiffMode,
}

impl<O: IdentifierOrder, D: RecordDecoder> StreamDiffer<O, D> {
    pub fn new(order: O, decoder: D) -> Self {
        Self {
            order,
            decoder,
            mode: DiffMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: DiffMode) -> Self {
        self.mode = mode;
        self
    }

    /// Walk both streams, handing every difference to `on_event` in identifier order.
    pub fn diff<L, R, F>(
        &self,
        left: RawRecordReader<L>,
        right: RawRecordReader<R>,
        mut on_event: F,
    ) -> Result<DiffStats>
    where
        L: Read,
        R: Read,
        F: FnMut(DiffEvent) -> Result<()>,
    {
        let mut stats = DiffStats::default();
        let mut left = Cursor::new(left)?;
        let mut right = Cursor::new(right)?;

        while left.key().is_some() || right.key().is_some() {
            match compare_keys(&self.order, left.key(), right.key()) {
                Ordering::Less => {
                    if let Some(record) = left.advance()? {
                        stats.only_left += 1;
                        on_event(DiffEvent::OnlyLeft {
                            id: record.key().to_string(),
                        })?;
                    }
                }
                Ordering::Greater => {
                    if let Some(record) = right.advance()? {
                        stats.only_right += 1;
                        on_event(DiffEvent::OnlyRight {
                            id: record.key().to_string(),
                        })?;
                    }
                }
                Ordering::Equal => {
                    let (Some(l), Some(r)) = (left.advance()?, right.advance()?) else {
                        break;
                    };
                    if l.bytes() == r.bytes() {
                        stats.same += 1;
                        continue;
                    }
                    stats.changed += 1;
                    debug!(id = l.key(), "records differ");
                    let detail = match self.describe(l.bytes(), r.bytes()) {
                        Ok(detail) => detail,
                        Err(e) => {
                            stats.undecodable += 1;
                            warn!(
                                id = l.key(),
                                "cannot decode changed record, reporting id only: {e}"
                            );
                            ChangeDetail::None
                        }
                    };
                    on_event(DiffEvent::Changed {
                        id: l.key().to_string(),
                        detail,
                    })?;
                }
            }
        }

        stats.left_reader = left.inner().stats();
        stats.right_reader = right.inner().stats();
        Ok(stats)
    }

    /// [`diff`](Self::diff) with every event written as text to `out`.
    pub fn diff_to_writer<L, R, W>(
        &self,
        left: RawRecordReader<L>,
        right: RawRecordReader<R>,
        out: &mut W,
    ) -> Result<DiffStats>
    where
        L: Read,
        R: Read,
        W: Write + ?Sized,
    {
        let stats = self.diff(left, right, |event| event.write_text(out))?;
        out.flush()?;
        Ok(stats)
    }

    fn describe(&self, left: &[u8], right: &[u8]) -> Result<ChangeDetail> {
        Ok(match self.mode {
            DiffMode::Summary => ChangeDetail::None,
            DiffMode::Full => ChangeDetail::Dump {
                left: self.decoder.decode_to_text(left)?,
                right: self.decoder.decode_to_text(right)?,
            },
            DiffMode::Lines => {
                let left = self.decoder.decode_to_text(left)?;
                let right = self.decoder.decode_to_text(right)?;
                let left: Vec<&str> = left.lines().collect();
                let right: Vec<&str> = right.lines().collect();
                ChangeDetail::Lines {
                    changes: diff_lines(&left, &right),
                }
            }
        })
    }
}

/// Line diff between two decoded records.
///
/// Equal line counts are compared pairwise. Otherwise, at each mismatch the next occurrence of
/// the current line is searched on the other side; the strictly nearer match wins and the
/// skipped lines are reported as added or removed. With no match, or matches at the same
/// distance, the pair is a modification. Exchanging the inputs exchanges added and removed.
pub fn diff_lines(left: &[&str], right: &[&str]) -> Vec<LineChange> {
    if left.len() == right.len() {
        return left
            .iter()
            .zip(right)
            .filter(|(l, r)| l != r)
            .map(|(l, r)| LineChange::Modified {
                left: l.to_string(),
                right: r.to_string(),
            })
            .collect();
    }

    let mut changes = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if left[i] == right[j] {
            i += 1;
            j += 1;
            continue;
        }
        let in_right = right[j + 1..].iter().position(|r| *r == left[i]);
        let in_left = left[i + 1..].iter().position(|l| *l == right[j]);
        // Ties pair up as a modification
        match (in_right, in_left) {
            (Some(skip), None) => {
                changes.extend(added(&right[j..=j + skip]));
                j += skip + 1;
            }
            (Some(skip), Some(other)) if skip < other => {
                changes.extend(added(&right[j..=j + skip]));
                j += skip + 1;
            }
            (None, Some(skip)) => {
                changes.extend(removed(&left[i..=i + skip]));
                i += skip + 1;
            }
            (Some(other), Some(skip)) if skip < other => {
                changes.extend(removed(&left[i..=i + skip]));
                i += skip + 1;
            }
            _ => {
                changes.push(LineChange::Modified {
                    left: left[i].to_string(),
                    right: right[j].to_string(),
                });
                i += 1;
                j += 1;
            }
        }
    }
    changes.extend(removed(&left[i..]));
    changes.extend(added(&right[j..]));
    changes
}

fn added<'a>(lines: &'a [&'a str]) -> impl Iterator<Item = LineChange> + 'a {
    lines.iter().map(|line| LineChange::Added {
        line: line.to_string(),
    })
}

fn removed<'a>(lines: &'a [&'a str]) -> impl Iterator<Item = LineChange> + 'a {
    lines.iter().map(|line| LineChange::Removed {
        line: line.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamConfig;
    use crate::decode::LineFormat;
    use crate::natural_order::NaturalOrder;
    use crate::raw_record::RawRecord;

    fn record(id: &str, title: &str) -> Vec<u8> {
        RawRecord::assemble([("001", id), ("245", title)])
            .unwrap()
            .into_bytes()
    }

    fn reader(bytes: &[u8]) -> RawRecordReader<&[u8]> {
        RawRecordReader::new(bytes, &StreamConfig::default())
    }

    fn collect(mode: DiffMode, left: &[u8], right: &[u8]) -> (Vec<DiffEvent>, DiffStats) {
        let mut events = Vec::new();
        let stats = StreamDiffer::new(NaturalOrder, LineFormat)
            .with_mode(mode)
            .diff(reader(left), reader(right), |event| {
                events.push(event);
                Ok(())
            })
            .unwrap();
        (events, stats)
    }

    fn snapshots() -> (Vec<u8>, Vec<u8>) {
        let left = [record("1", "a"), record("2", "b"), record("9", "c"), record("10", "d")]
            .concat();
        let right = [record("2", "b"), record("3", "x"), record("9", "changed"), record("11", "e")]
            .concat();
        (left, right)
    }

    #[test]
    fn test_classifies_identifiers() {
        let (left, right) = snapshots();
        let (events, stats) = collect(DiffMode::Summary, &left, &right);
        assert_eq!(
            events,
            vec![
                DiffEvent::OnlyLeft { id: "1".into() },
                DiffEvent::OnlyRight { id: "3".into() },
                DiffEvent::Changed {
                    id: "9".into(),
                    detail: ChangeDetail::None
                },
                DiffEvent::OnlyLeft { id: "10".into() },
                DiffEvent::OnlyRight { id: "11".into() },
            ]
        );
        assert_eq!(stats.same, 1);
        assert!(stats.has_differences());
    }

    #[test]
    fn test_swapping_inputs_swaps_sides() {
        let (left, right) = snapshots();
        let (forward, _) = collect(DiffMode::Lines, &left, &right);
        let (backward, _) = collect(DiffMode::Lines, &right, &left);
        let swapped: Vec<DiffEvent> = backward.into_iter().map(DiffEvent::swapped).collect();
        assert_eq!(forward, swapped);
    }

    #[test]
    fn test_identical_streams() {
        let (left, _) = snapshots();
        let (events, stats) = collect(DiffMode::Full, &left, &left);
        assert!(events.is_empty());
        assert!(!stats.has_differences());
        assert_eq!(stats.same, 4);
    }

    #[test]
    fn test_changed_line_detail() {
        let left = record("9", "old title");
        let right = record("9", "new title");
        let (events, _) = collect(DiffMode::Lines, &left, &right);
        match &events[..] {
            [DiffEvent::Changed {
                detail: ChangeDetail::Lines { changes },
                ..
            }] => {
                assert_eq!(
                    changes,
                    &vec![LineChange::Modified {
                        left: "245 old title".into(),
                        right: "245 new title".into(),
                    }]
                );
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn test_diff_lines_pairwise() {
        let changes = diff_lines(&["a", "b", "c"], &["a", "x", "c"]);
        assert_eq!(
            changes,
            vec![LineChange::Modified {
                left: "b".into(),
                right: "x".into()
            }]
        );
    }

    #[test]
    fn test_diff_lines_realigns_insertions() {
        let changes = diff_lines(&["a", "b", "c"], &["a", "n1", "n2", "b", "c"]);
        assert_eq!(
            changes,
            vec![
                LineChange::Added { line: "n1".into() },
                LineChange::Added { line: "n2".into() },
            ]
        );
        let changes = diff_lines(&["a", "gone", "b", "c"], &["a", "b", "c"]);
        assert_eq!(changes, vec![LineChange::Removed { line: "gone".into() }]);
    }

    #[test]
    fn test_diff_lines_swaps_with_inputs() {
        let forward = diff_lines(&["p", "q"], &["q", "p", "z"]);
        let backward = diff_lines(&["q", "p", "z"], &["p", "q"]);
        let swapped: Vec<LineChange> = backward.into_iter().map(LineChange::swapped).collect();
        assert_eq!(forward, swapped);
        assert_eq!(
            forward,
            vec![
                LineChange::Modified {
                    left: "p".into(),
                    right: "q".into()
                },
                LineChange::Modified {
                    left: "q".into(),
                    right: "p".into()
                },
                LineChange::Added { line: "z".into() },
            ]
        );
    }

    #[test]
    fn test_undecodable_record_does_not_stop_diff() {
        let mut broken = record("9", "old title");
        // 245 is the second directory entry; claim a length past the end of the record
        let length = 24 + 12 + 3;
        broken[length..length + 4].copy_from_slice(b"9999");
        let left = [broken, record("10", "a")].concat();
        let right = [record("9", "new title"), record("11", "b")].concat();

        let (events, stats) = collect(DiffMode::Lines, &left, &right);
        assert_eq!(
            events,
            vec![
                DiffEvent::Changed {
                    id: "9".into(),
                    detail: ChangeDetail::None
                },
                DiffEvent::OnlyLeft { id: "10".into() },
                DiffEvent::OnlyRight { id: "11".into() },
            ]
        );
        assert_eq!(stats.undecodable, 1);
        assert_eq!(stats.changed, 1);
    }

    #[test]
    fn test_diff_lines_falls_back_to_pairs() {
        let changes = diff_lines(&["a", "x"], &["a", "y", "z"]);
        assert_eq!(
            changes,
            vec![
                LineChange::Modified {
                    left: "x".into(),
                    right: "y".into()
                },
                LineChange::Added { line: "z".into() },
            ]
        );
    }

    #[test]
    fn test_text_output() {
        let (left, right) = snapshots();
        let mut out = Vec::new();
        StreamDiffer::new(NaturalOrder, LineFormat)
            .with_mode(DiffMode::Summary)
            .diff_to_writer(reader(&left), reader(&right), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("only in left: 1\nonly in right: 3\nchanged: 9\n"));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("FULL".parse::<DiffMode>().unwrap(), DiffMode::Full);
        assert!("patch".parse::<DiffMode>().is_err());
    }
}
