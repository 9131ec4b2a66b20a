//! Reading damaged and duplicated record files

mod common;

use common::{ids_of, record, write_file};
use marc_stream::{RawRecordReader, StreamConfig};

#[test]
fn test_damaged_file_keeps_good_records() {
    let dir = tempfile::tempdir().unwrap();

    let mut lying = record("2", "declared too long");
    let wrong = format!("{:05}", lying.len() + 100);
    lying[..5].copy_from_slice(wrong.as_bytes());
    let mut garbled = record("3", "garbled length");
    garbled[..5].copy_from_slice(b"12a45");
    let truncated = record("5", "cut off");

    let data = [
        record("1", "fine"),
        lying,
        garbled,
        record("4", "fine"),
        truncated[..truncated.len() / 2].to_vec(),
    ]
    .concat();
    let path = write_file(dir.path(), "damaged.mrc", &data);

    let mut reader = RawRecordReader::open(&path, &StreamConfig::default()).unwrap();
    let ids: Vec<String> = reader
        .by_ref()
        .map(|r| r.unwrap().key().to_string())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);

    let stats = reader.stats();
    assert_eq!(stats.records, 4);
    assert_eq!(stats.recovered, 2);
    assert_eq!(stats.unrecoverable, 1);
    assert_eq!(reader.label(), path.display().to_string());
}

#[test]
fn test_alternate_identifier_tag() {
    let bytes = [
        marc_stream::RawRecord::assemble([("001", "9"), ("035", "(OCoLC)2")]).unwrap(),
        marc_stream::RawRecord::assemble([("001", "8"), ("035", "(OCoLC)2")]).unwrap(),
    ]
    .iter()
    .flat_map(|r| r.bytes().to_vec())
    .collect::<Vec<u8>>();

    let config = StreamConfig::default().with_id_tag("035".parse().unwrap());
    let records: Vec<_> = RawRecordReader::new(&bytes[..], &config)
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key(), "(OCoLC)2");

    // Without combination the control numbers are the keys
    assert_eq!(ids_of(&bytes), vec!["9", "8"]);
}
