//! Test helpers for building record streams
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use marc_stream::RawRecord;

/// Record with control number `id` and a 245 title that tells versions apart
pub fn record(id: &str, title: &str) -> Vec<u8> {
    RawRecord::assemble([
        ("001", id.to_string()),
        ("008", "850101s1985    xx            000 0 eng d".to_string()),
        ("245", format!("10\x1fa{title}")),
    ])
    .unwrap()
    .into_bytes()
}

/// One `v1` record per identifier
pub fn stream(ids: &[&str]) -> Vec<u8> {
    ids.iter().flat_map(|id| record(id, "v1")).collect()
}

/// Records from `(id, title)` pairs
pub fn versions(items: &[(&str, &str)]) -> Vec<u8> {
    items.iter().flat_map(|(id, title)| record(id, title)).collect()
}

/// Identifiers of every physical record in `bytes`
pub fn ids_of(bytes: &[u8]) -> Vec<String> {
    marc_stream::RawRecordReader::plain(bytes)
        .map(|r| r.unwrap().key().to_string())
        .collect()
}

/// `(id, title)` of every physical record in `bytes`
pub fn titles_of(bytes: &[u8]) -> Vec<(String, String)> {
    marc_stream::RawRecordReader::plain(bytes)
        .map(|r| {
            let r = r.unwrap();
            let title = r.field("245").unwrap().unwrap_or_default();
            let title = String::from_utf8_lossy(title)
                .trim_start_matches("10\x1fa")
                .to_string();
            (r.key().to_string(), title)
        })
        .collect()
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
