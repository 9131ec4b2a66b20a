//! Decode-to-text collaborator
//!
//! The stream algorithms treat records as opaque bytes. When two records with the same
//! identifier differ, the differ asks a [`RecordDecoder`] for a human-readable form. Real
//! deployments plug in a full MARC decoder with character-set conversion; [`LineFormat`] is
//! the built-in fallback used by the command line tools.

use std::fmt::Write as _;

use crate::error::Result;
use crate::raw_record::{RawRecord, LEADER_LEN, SUBFIELD_DELIMITER};

pub trait RecordDecoder {
    /// Render a (possibly combined) framed record as text, one line per field.
    fn decode_to_text(&self, bytes: &[u8]) -> Result<String>;
}

impl<F> RecordDecoder for F
where
    F: Fn(&[u8]) -> Result<String>,
{
    fn decode_to_text(&self, bytes: &[u8]) -> Result<String> {
        self(bytes)
    }
}

/// `LDR`/tag-per-line rendering, subfield delimiters shown as `$`.
///
/// ```text
/// LDR 00123nam a2200049 a 4500
/// 001 100
/// 245 10$aA title$cSomeone.
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl RecordDecoder for LineFormat {
    fn decode_to_text(&self, bytes: &[u8]) -> Result<String> {
        let record = RawRecord::from_bytes(bytes.to_vec());
        let mut text = String::new();
        for part in record.constituents() {
            render_part(part, &mut text)?;
        }
        Ok(text)
    }
}

fn render_part(part: &[u8], text: &mut String) -> Result<()> {
    let record = RawRecord::from_bytes(part.to_vec());
    let leader = &part[..part.len().min(LEADER_LEN)];
    let _ = writeln!(text, "LDR {}", String::from_utf8_lossy(leader));
    for field in record.directory()? {
        let field = field?;
        let value: Vec<u8> = field
            .value
            .iter()
            .map(|&b| if b == SUBFIELD_DELIMITER { b'$' } else { b })
            .collect();
        let _ = writeln!(
            text,
            "{} {}",
            field.tag_str(),
            String::from_utf8_lossy(&value)
        );
    }
    Ok(())
}
