//! Delete-id streams
//!
//! Plain text, one identifier per line. Only the leading identifier-shaped token of a line is
//! significant; anything after it (dates, reasons) is an annotation that is carried along but
//! never compared. Blank lines and lines starting with `#` are skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;

/// One line of a delete log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEntry {
    pub id: String,
    /// The full line as read (without line ending)
    pub line: String,
}

impl DeleteEntry {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            line: id.clone(),
            id,
        }
    }

    /// Parse one line; `None` for blank and comment lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let end = trimmed
            .find(|c: char| !is_identifier_char(c))
            .unwrap_or(trimmed.len());
        if end == 0 {
            return None;
        }
        Some(Self {
            id: trimmed[..end].to_string(),
            line: line.to_string(),
        })
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '(' | ')')
}

/// Pull reader over delete-log lines.
pub struct DeleteLogReader<R> {
    lines: Option<io::Lines<R>>,
    label: String,
    line_no: u64,
}

impl DeleteLogReader<BufReader<File>> {
    /// Open a delete log; a missing file is an empty log.
    pub fn open_or_empty(path: &Path) -> Result<Self> {
        match File::open(path) {
            Ok(file) => Ok(Self::new(BufReader::new(file)).with_label(path.display().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("delete log {} not found, treating as empty", path.display());
                Ok(Self::empty().with_label(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<R: BufRead> DeleteLogReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            lines: Some(source.lines()),
            label: "<deletes>".to_string(),
            line_no: 0,
        }
    }

    pub fn empty() -> Self {
        Self {
            lines: None,
            label: "<empty>".to_string(),
            line_no: 0,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn next_entry(&mut self) -> Result<Option<DeleteEntry>> {
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };
        for line in lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            if let Some(entry) = DeleteEntry::parse(&line) {
                return Ok(Some(entry));
            }
            if !line.trim().is_empty() && !line.trim_start().starts_with('#') {
                warn!(
                    source = %self.label,
                    line = self.line_no,
                    "ignoring delete line without identifier: {line:?}"
                );
            }
        }
        self.lines = None;
        Ok(None)
    }
}

impl<R: BufRead> Iterator for DeleteLogReader<R> {
    type Item = Result<DeleteEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}
