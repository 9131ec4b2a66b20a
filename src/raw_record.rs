//! Raw ISO 2709 record framing
//!
//! A record on disk is:
//! - Leader: 24 bytes, `[0,5)` ASCII record length (`99999` = unknown), `[12,17)` base address
//! - Directory: 12-byte entries (tag 3 + length 4 + start 5), closed by a field terminator
//! - Field data: each field ends with a field terminator (0x1E)
//! - Record terminator: 0x1D, always the last byte
//!
//! `RawRecord` keeps the framed bytes untouched and only walks the directory when asked for a
//! field. Framing tolerates lying or missing length fields and truncated input by rescanning
//! for the record terminator.

use std::cell::OnceCell;
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use memchr::{memchr, memchr_iter};

use crate::error::{MarcError, Result};

pub const LEADER_LEN: usize = 24;
pub const FIELD_TERMINATOR: u8 = 0x1E;
pub const RECORD_TERMINATOR: u8 = 0x1D;
pub const SUBFIELD_DELIMITER: u8 = 0x1F;

const DIRECTORY_ENTRY_LEN: usize = 12;
const BASE_ADDRESS: std::ops::Range<usize> = 12..17;
/// Declared length meaning "too long to express, rescan"
const LENGTH_SENTINEL: usize = 99_999;
/// Read granularity for the framer
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Three-character field tag (`001`, `245`, ...).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag([u8; 3]);

impl Tag {
    pub const CONTROL_NUMBER: Tag = Tag(*b"001");

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII alphanumerics get past `from_str`
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self::CONTROL_NUMBER
    }
}

impl FromStr for Tag {
    type Err = MarcError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphanumeric) {
            return Err(MarcError::InvalidConfig(format!(
                "field tag must be three ASCII letters or digits, got {s:?}"
            )));
        }
        Ok(Tag([bytes[0], bytes[1], bytes[2]]))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.as_str())
    }
}

/// One framed record, or several same-identifier records concatenated.
#[derive(Debug, Clone)]
pub struct RawRecord {
    bytes: Vec<u8>,
    id_tag: Tag,
    /// `Err` holds the context of an undecodable directory
    id: OnceCell<std::result::Result<String, String>>,
}

impl PartialEq for RawRecord {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for RawRecord {}

/// One directory entry resolved against the data area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef<'a> {
    pub tag: &'a [u8],
    /// Field bytes without the trailing field terminator
    pub value: &'a [u8],
}

impl FieldRef<'_> {
    pub fn tag_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.tag)
    }
}

impl RawRecord {
    /// Wrap bytes that are already known to be one framed record.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            id_tag: Tag::CONTROL_NUMBER,
            id: OnceCell::new(),
        }
    }

    /// Frame exactly one record out of `bytes`, with the same recovery rules as a stream.
    pub fn frame(bytes: &[u8]) -> Result<ReadOutcome> {
        RecordFramer::new(bytes).next_frame()
    }

    pub fn with_id_tag(mut self, tag: Tag) -> Self {
        if tag != self.id_tag {
            self.id_tag = tag;
            self.id = OnceCell::new();
        }
        self
    }

    /// Append `other` to this record. Both are expected to share an identifier; the combined
    /// record keeps the identifier of its first constituent.
    pub fn combine(mut self, other: RawRecord) -> Self {
        self.bytes.extend_from_slice(&other.bytes);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn id_tag(&self) -> Tag {
        self.id_tag
    }

    pub fn leader(&self) -> &[u8] {
        &self.bytes[..self.bytes.len().min(LEADER_LEN)]
    }

    /// The identifier (value of the id tag), computed once. A record without the id field
    /// has the empty identifier.
    pub fn identifier(&self) -> Result<&str> {
        let cached = self.id.get_or_init(|| match self.field(self.id_tag.as_str()) {
            Ok(Some(value)) => Ok(String::from_utf8_lossy(value).into_owned()),
            Ok(None) => Ok(String::new()),
            Err(MarcError::InvalidState { context }) => Err(context),
            Err(e) => Err(e.to_string()),
        });
        cached
            .as_deref()
            .map_err(|context| MarcError::invalid_state(context.clone()))
    }

    /// Identifier used for ordering; undecodable records sort as the empty identifier.
    pub fn key(&self) -> &str {
        self.identifier().unwrap_or_default()
    }

    /// First field with `tag`, without its terminator and trimmed of ASCII whitespace.
    pub fn field(&self, tag: &str) -> Result<Option<&[u8]>> {
        for entry in self.directory()? {
            let entry = entry?;
            if entry.tag == tag.as_bytes() {
                return Ok(Some(entry.value.trim_ascii()));
            }
        }
        Ok(None)
    }

    /// Every directory entry of the first constituent, in directory order.
    pub fn directory(&self) -> Result<Directory<'_>> {
        Directory::new(&self.bytes)
    }

    /// Split a combined record back into its framed parts.
    pub fn constituents(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let mut start = 0;
        let mut ends = memchr_iter(RECORD_TERMINATOR, &self.bytes);
        std::iter::from_fn(move || {
            if start >= self.bytes.len() {
                return None;
            }
            let end = ends.next().map(|p| p + 1).unwrap_or(self.bytes.len());
            let part = &self.bytes[start..end];
            start = end;
            Some(part)
        })
    }

    /// Build a framed record from `(tag, value)` pairs.
    ///
    /// Values are written as given (include indicators and subfield delimiters for data
    /// fields); each gets a field terminator. A record longer than 99999 bytes carries the
    /// length sentinel.
    pub fn assemble<'a, I, V>(fields: I) -> Result<RawRecord>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: AsRef<[u8]>,
    {
        let mut directory = Vec::new();
        let mut data = Vec::new();

        for (tag, value) in fields {
            let tag: Tag = tag.parse()?;
            let value = value.as_ref();
            let field_len = value.len() + 1;
            if field_len > 9_999 || data.len() > 99_999 {
                return Err(MarcError::MalformedRecord {
                    context: format!("field {tag} does not fit an ISO 2709 directory entry"),
                });
            }
            directory.extend_from_slice(tag.as_bytes());
            directory.extend_from_slice(format!("{:04}{:05}", field_len, data.len()).as_bytes());
            data.extend_from_slice(value);
            data.push(FIELD_TERMINATOR);
        }
        directory.push(FIELD_TERMINATOR);

        let base = LEADER_LEN + directory.len();
        let total = base + data.len() + 1;
        if base > 99_999 {
            return Err(MarcError::MalformedRecord {
                context: format!("directory of {} bytes is too long", directory.len()),
            });
        }
        let declared = total.min(LENGTH_SENTINEL);

        let mut bytes = Vec::with_capacity(total);
        bytes.extend_from_slice(format!("{declared:05}nam a22{base:05} a 4500").as_bytes());
        bytes.extend_from_slice(&directory);
        bytes.extend_from_slice(&data);
        bytes.push(RECORD_TERMINATOR);
        Ok(RawRecord::from_bytes(bytes))
    }
}

/// Iterator over directory entries, resolving each against the data area.
pub struct Directory<'a> {
    bytes: &'a [u8],
    base: usize,
    pos: usize,
}

impl<'a> Directory<'a> {
    fn new(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < LEADER_LEN {
            return Err(MarcError::invalid_state(format!(
                "record of {} bytes is shorter than a leader",
                bytes.len()
            )));
        }
        let base = parse_decimal(&bytes[BASE_ADDRESS]).ok_or_else(|| {
            MarcError::invalid_state(format!(
                "base address {:?} is not numeric",
                String::from_utf8_lossy(&bytes[BASE_ADDRESS])
            ))
        })?;
        if base < LEADER_LEN || base > bytes.len() {
            return Err(MarcError::invalid_state(format!(
                "base address {base} outside record of {} bytes",
                bytes.len()
            )));
        }
        Ok(Self {
            bytes,
            base,
            pos: LEADER_LEN,
        })
    }
}

impl<'a> Iterator for Directory<'a> {
    type Item = Result<FieldRef<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos + DIRECTORY_ENTRY_LEN > self.base || self.bytes[self.pos] == FIELD_TERMINATOR
        {
            return None;
        }
        let entry = &self.bytes[self.pos..self.pos + DIRECTORY_ENTRY_LEN];
        let at = self.pos;
        self.pos += DIRECTORY_ENTRY_LEN;

        let length = parse_decimal(&entry[3..7]);
        let start = parse_decimal(&entry[7..12]);
        let (Some(length), Some(start)) = (length, start) else {
            // Stop after reporting, the rest of the directory is unreliable
            self.pos = self.base;
            return Some(Err(MarcError::invalid_state(format!(
                "directory entry at offset {at} is not numeric: {:?}",
                String::from_utf8_lossy(entry)
            ))));
        };

        let from = self.base + start;
        let to = from + length.saturating_sub(1);
        if to > self.bytes.len() {
            self.pos = self.base;
            return Some(Err(MarcError::invalid_state(format!(
                "field {} [{from}, {to}) runs past the end of a {} byte record",
                String::from_utf8_lossy(&entry[..3]),
                self.bytes.len()
            ))));
        }

        Some(Ok(FieldRef {
            tag: &entry[..3],
            value: &self.bytes[from..to],
        }))
    }
}

/// Why a record had to be re-framed by terminator position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RecoveryReason {
    /// The leader's length field is not a usable number
    UnparsableLength,
    /// The declared length does not end on a record terminator
    LengthMismatch { declared: usize, actual: usize },
    /// Input ended before the declared length; a terminator was found in what was read
    Truncated {
        declared: Option<usize>,
        actual: usize,
    },
}

impl fmt::Display for RecoveryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparsableLength => f.write_str("unparsable leader length, rescanned"),
            Self::LengthMismatch { declared, actual } => {
                write!(f, "declared length {declared} but terminator at {actual}")
            }
            Self::Truncated {
                declared: Some(declared),
                actual,
            } => write!(f, "input truncated: declared {declared}, recovered {actual} bytes"),
            Self::Truncated {
                declared: None,
                actual,
            } => write!(f, "input truncated inside leader, recovered {actual} bytes"),
        }
    }
}

/// Result of framing one record from a stream.
#[derive(Debug)]
pub enum ReadOutcome {
    Record(RawRecord),
    Recovered {
        record: RawRecord,
        reason: RecoveryReason,
    },
    /// Bytes that could not be framed; they have been consumed.
    Unrecoverable { context: String, discarded: Vec<u8> },
    End,
}

/// Pulls framed records out of a byte stream.
///
/// Bytes beyond the current record stay buffered, so re-framing after a lying length never
/// needs to seek the source.
pub struct RecordFramer<R> {
    source: R,
    buffer: Vec<u8>,
    pos: usize,
    eof: bool,
    id_tag: Tag,
}

impl<R: Read> RecordFramer<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            pos: 0,
            eof: false,
            id_tag: Tag::CONTROL_NUMBER,
        }
    }

    pub fn with_id_tag(mut self, tag: Tag) -> Self {
        self.id_tag = tag;
        self
    }

    fn pending(&self) -> &[u8] {
        &self.buffer[self.pos..]
    }

    /// Read until at least `want` bytes are pending or the source is exhausted.
    fn fill(&mut self, want: usize) -> io::Result<bool> {
        while self.pending().len() < want && !self.eof {
            if self.pos > 0 && self.pos >= self.buffer.len() / 2 {
                self.buffer.drain(..self.pos);
                self.pos = 0;
            }
            let old_len = self.buffer.len();
            self.buffer.resize(old_len + READ_CHUNK_SIZE, 0);
            let n = loop {
                match self.source.read(&mut self.buffer[old_len..]) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        self.buffer.truncate(old_len);
                        return Err(e);
                    }
                }
            };
            self.buffer.truncate(old_len + n);
            if n == 0 {
                self.eof = true;
            }
        }
        Ok(self.pending().len() >= want)
    }

    /// Position of the first record terminator in the pending bytes, reading more as needed.
    fn find_terminator(&mut self) -> io::Result<Option<usize>> {
        let mut searched = 0;
        loop {
            if let Some(p) = memchr(RECORD_TERMINATOR, &self.pending()[searched..]) {
                return Ok(Some(searched + p));
            }
            searched = self.pending().len();
            if self.eof {
                return Ok(None);
            }
            self.fill(searched + 1)?;
        }
    }

    fn take(&mut self, n: usize) -> Vec<u8> {
        let bytes = self.buffer[self.pos..self.pos + n].to_vec();
        self.pos += n;
        bytes
    }

    fn take_all(&mut self) -> Vec<u8> {
        let n = self.pending().len();
        self.take(n)
    }

    fn record(&self, bytes: Vec<u8>) -> RawRecord {
        RawRecord::from_bytes(bytes).with_id_tag(self.id_tag)
    }

    pub fn next_frame(&mut self) -> Result<ReadOutcome> {
        let have_leader = self.fill(LEADER_LEN)?;
        if self.pending().is_empty() {
            return Ok(ReadOutcome::End);
        }
        if !have_leader {
            return Ok(self.recover_truncated(None));
        }

        match parse_decimal(&self.pending()[..5]) {
            Some(declared) if declared != LENGTH_SENTINEL && declared > LEADER_LEN => {
                if !self.fill(declared)? {
                    return Ok(self.recover_truncated(Some(declared)));
                }
                if self.pending()[declared - 1] == RECORD_TERMINATOR {
                    let bytes = self.take(declared);
                    return Ok(ReadOutcome::Record(self.record(bytes)));
                }
                match self.find_terminator()? {
                    Some(p) => {
                        let bytes = self.take(p + 1);
                        Ok(ReadOutcome::Recovered {
                            record: self.record(bytes),
                            reason: RecoveryReason::LengthMismatch {
                                declared,
                                actual: p + 1,
                            },
                        })
                    }
                    None => Ok(self.unrecoverable(format!(
                        "declared length {declared} does not end on a record terminator \
                         and none follows"
                    ))),
                }
            }
            declared => match self.find_terminator()? {
                Some(p) => {
                    let bytes = self.take(p + 1);
                    if declared == Some(LENGTH_SENTINEL) {
                        Ok(ReadOutcome::Record(self.record(bytes)))
                    } else {
                        Ok(ReadOutcome::Recovered {
                            record: self.record(bytes),
                            reason: RecoveryReason::UnparsableLength,
                        })
                    }
                }
                None => Ok(self.unrecoverable(
                    "unusable leader length and no record terminator before end of input"
                        .to_string(),
                )),
            },
        }
    }

    /// Source is exhausted and fewer bytes than the record needs are pending.
    fn recover_truncated(&mut self, declared: Option<usize>) -> ReadOutcome {
        match memchr(RECORD_TERMINATOR, self.pending()) {
            Some(p) => {
                let bytes = self.take(p + 1);
                ReadOutcome::Recovered {
                    record: self.record(bytes),
                    reason: RecoveryReason::Truncated {
                        declared,
                        actual: p + 1,
                    },
                }
            }
            None => {
                let context = match declared {
                    Some(n) => format!(
                        "input ends {} bytes into a record declared as {n} bytes, no terminator",
                        self.pending().len()
                    ),
                    None => format!(
                        "input ends {} bytes into a leader, no terminator",
                        self.pending().len()
                    ),
                };
                self.unrecoverable(context)
            }
        }
    }

    fn unrecoverable(&mut self, context: String) -> ReadOutcome {
        ReadOutcome::Unrecoverable {
            context,
            discarded: self.take_all(),
        }
    }
}

/// ASCII decimal, digits only.
pub(crate) fn parse_decimal(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        bytes
            .iter()
            .fold(0usize, |acc, b| acc * 10 + usize::from(b - b'0')),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> RawRecord {
        RawRecord::assemble([
            ("001", id),
            ("008", "850101s1985    xx            000 0 eng d"),
            ("245", "10\x1faA title\x1fcSomeone."),
        ])
        .unwrap()
    }

    fn frame_one(bytes: &[u8]) -> ReadOutcome {
        RawRecord::frame(bytes).unwrap()
    }

    #[test]
    fn test_assemble_layout() {
        let record = sample("100");
        let bytes = record.bytes();
        let declared = parse_decimal(&bytes[..5]).unwrap();
        assert_eq!(declared, bytes.len());
        assert_eq!(*bytes.last().unwrap(), RECORD_TERMINATOR);
        // 3 entries of 12 bytes plus the directory terminator
        assert_eq!(parse_decimal(&bytes[12..17]).unwrap(), LEADER_LEN + 37);
    }

    #[test]
    fn test_identifier_and_field_lookup() {
        let record = sample("  u1234 ");
        assert_eq!(record.identifier().unwrap(), "u1234");
        assert_eq!(
            record.field("245").unwrap(),
            Some(&b"10\x1faA title\x1fcSomeone."[..])
        );
        assert_eq!(record.field("100").unwrap(), None);
    }

    #[test]
    fn test_first_of_repeated_tags_wins() {
        let record =
            RawRecord::assemble([("001", "7"), ("650", " 0\x1faFirst"), ("650", " 0\x1faSecond")])
                .unwrap();
        assert_eq!(record.field("650").unwrap(), Some(&b"0\x1faFirst"[..]));
        assert_eq!(record.directory().unwrap().count(), 3);
    }

    #[test]
    fn test_missing_identifier_is_empty() {
        let record = RawRecord::assemble([("245", "10\x1faNo control number")]).unwrap();
        assert_eq!(record.identifier().unwrap(), "");
    }

    #[test]
    fn test_alternate_id_tag() {
        let record = RawRecord::assemble([("001", "1"), ("035", "(OCoLC)42")])
            .unwrap()
            .with_id_tag("035".parse().unwrap());
        assert_eq!(record.key(), "(OCoLC)42");
    }

    #[test]
    fn test_undecodable_directory_is_invalid_state() {
        let mut bytes = sample("5").into_bytes();
        bytes[12..17].copy_from_slice(b"ab123");
        let record = RawRecord::from_bytes(bytes);
        assert!(matches!(
            record.identifier(),
            Err(MarcError::InvalidState { .. })
        ));
        assert!(matches!(record.field("245"), Err(MarcError::InvalidState { .. })));
        assert_eq!(record.key(), "");
    }

    #[test]
    fn test_frame_well_formed_round_trip() {
        let bytes = sample("100").into_bytes();
        match frame_one(&bytes) {
            ReadOutcome::Record(record) => assert_eq!(record.bytes(), &bytes[..]),
            other => panic!("expected clean record, got {other:?}"),
        }
    }

    #[test]
    fn test_frame_lying_length_too_long() {
        let first = sample("1").into_bytes();
        let second = sample("2").into_bytes();
        let mut lying = first.clone();
        let wrong = format!("{:05}", first.len() + 10);
        lying[..5].copy_from_slice(wrong.as_bytes());

        let mut stream = lying.clone();
        stream.extend_from_slice(&second);
        let mut framer = RecordFramer::new(&stream[..]);

        match framer.next_frame().unwrap() {
            ReadOutcome::Recovered { record, reason } => {
                assert_eq!(record.bytes(), &lying[..]);
                assert_eq!(
                    reason,
                    RecoveryReason::LengthMismatch {
                        declared: first.len() + 10,
                        actual: first.len()
                    }
                );
            }
            other => panic!("expected recovery, got {other:?}"),
        }
        match framer.next_frame().unwrap() {
            ReadOutcome::Record(record) => assert_eq!(record.key(), "2"),
            other => panic!("second record lost: {other:?}"),
        }
        assert!(matches!(framer.next_frame().unwrap(), ReadOutcome::End));
    }

    #[test]
    fn test_frame_lying_length_too_short() {
        let mut bytes = sample("1").into_bytes();
        bytes[..5].copy_from_slice(b"00030");
        match frame_one(&bytes) {
            ReadOutcome::Recovered { record, reason } => {
                assert_eq!(record.len(), bytes.len());
                assert!(matches!(reason, RecoveryReason::LengthMismatch { declared: 30, .. }));
            }
            other => panic!("expected recovery, got {other:?}"),
        }
    }

    #[test]
    fn test_frame_unparsable_and_sentinel_lengths() {
        let mut bytes = sample("1").into_bytes();
        bytes[..5].copy_from_slice(b"0x1F?");
        assert!(matches!(
            frame_one(&bytes),
            ReadOutcome::Recovered {
                reason: RecoveryReason::UnparsableLength,
                ..
            }
        ));

        bytes[..5].copy_from_slice(b"99999");
        match frame_one(&bytes) {
            ReadOutcome::Record(record) => assert_eq!(record.key(), "1"),
            other => panic!("sentinel length should rescan cleanly, got {other:?}"),
        }
    }

    #[test]
    fn test_frame_truncated_without_terminator() {
        let bytes = sample("1").into_bytes();
        let cut = &bytes[..bytes.len() - 8];
        match frame_one(cut) {
            ReadOutcome::Unrecoverable { discarded, .. } => assert_eq!(discarded, cut),
            other => panic!("expected unrecoverable, got {other:?}"),
        }
    }

    #[test]
    fn test_frame_truncated_with_terminator() {
        // declared length covers two records but the input stops inside the second
        let first = sample("1").into_bytes();
        let mut stream = first.clone();
        stream[..5].copy_from_slice(format!("{:05}", first.len() * 3).as_bytes());
        stream.extend_from_slice(&sample("2").into_bytes()[..30]);
        match frame_one(&stream) {
            ReadOutcome::Recovered { record, reason } => {
                assert_eq!(record.len(), first.len());
                assert!(matches!(reason, RecoveryReason::Truncated { .. }));
            }
            other => panic!("expected truncated recovery, got {other:?}"),
        }
    }

    #[test]
    fn test_frame_truncated_inside_leader() {
        let good = sample("1").into_bytes();
        let stream = [&good[..], &b"00042n\x1d"[..]].concat();
        let mut framer = RecordFramer::new(&stream[..]);
        assert!(matches!(framer.next_frame().unwrap(), ReadOutcome::Record(_)));
        match framer.next_frame().unwrap() {
            ReadOutcome::Recovered { record, reason } => {
                assert_eq!(record.bytes(), b"00042n\x1d");
                assert_eq!(
                    reason,
                    RecoveryReason::Truncated {
                        declared: None,
                        actual: 7
                    }
                );
            }
            other => panic!("expected truncated recovery, got {other:?}"),
        }
        assert!(matches!(framer.next_frame().unwrap(), ReadOutcome::End));
    }

    #[test]
    fn test_frame_empty_input() {
        assert!(matches!(frame_one(b""), ReadOutcome::End));
    }

    #[test]
    fn test_combine_and_constituents() {
        let a = sample("9");
        let b = sample("9");
        let c = sample("9");
        let combined = a.clone().combine(b.clone()).combine(c.clone());
        assert_eq!(combined.key(), "9");
        assert_eq!(combined.len(), a.len() + b.len() + c.len());
        let parts: Vec<&[u8]> = combined.constituents().collect();
        assert_eq!(parts, vec![a.bytes(), b.bytes(), c.bytes()]);
    }

    #[test]
    fn test_tag_parse() {
        assert_eq!("245".parse::<Tag>().unwrap().as_str(), "245");
        assert!("24".parse::<Tag>().is_err());
        assert!("2 5".parse::<Tag>().is_err());
    }
}
