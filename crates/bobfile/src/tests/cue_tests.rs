use super::helpers::{header, record};
use crate::BobFile;
use std::fs;
use tempfile::tempdir;

// -------------------- Remaining space --------------------

#[test]
fn fresh_file_sits_on_a_boundary() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fresh.bob");

    let file = BobFile::create(&path, 512, 1024).unwrap();
    // Nothing has been committed, so the offset is exactly at boundary
    // zero and no space "remains" — the first record must open the cue.
    assert_eq!(file.cue_remaining().unwrap(), 0);
}

#[test]
fn remaining_shrinks_as_records_land() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shrink.bob");

    let mut file = BobFile::create(&path, 512, 1024).unwrap();
    file.new_cue().unwrap();
    file.write(&record(b"hello")).unwrap();
    file.commit().unwrap();

    // Header (11) plus record (7) committed.
    assert_eq!(file.cue_remaining().unwrap(), 1024 - 18);
}

// -------------------- Segment rotation --------------------

#[test]
fn new_cue_at_offset_zero_keeps_the_magic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("zero.bob");

    let mut file = BobFile::create(&path, 512, 1024).unwrap();
    // Discards the buffered header and writes it again at offset zero.
    assert_eq!(file.new_cue().unwrap(), 0);
    file.commit().unwrap();

    assert_eq!(fs::read(&path).unwrap(), header(true, 512, 1024));
}

#[test]
fn new_cue_seeks_to_the_next_boundary() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rotate.bob");

    let mut file = BobFile::create(&path, 512, 1024).unwrap();
    file.new_cue().unwrap();
    file.write(&record(b"hello")).unwrap();
    file.commit().unwrap();

    assert_eq!(file.new_cue().unwrap(), 1024);
    file.commit().unwrap();

    let bytes = fs::read(&path).unwrap();
    // Old segment, unwritten gap, fresh magicless header at the boundary.
    let mut expected = header(true, 512, 1024);
    expected.extend(record(b"hello"));
    expected.resize(1024, 0);
    expected.extend(header(false, 512, 1024));
    assert_eq!(bytes, expected);
}

// -------------------- Reclamation --------------------

#[test]
fn zap_keeps_the_logical_length() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("zap.bob");

    let mut file = BobFile::create(&path, 4096, 8192).unwrap();
    file.new_cue().unwrap();
    file.write(&record(&vec![0x5A; 9000])).unwrap();
    file.commit().unwrap();
    let start = file.new_cue().unwrap();
    assert_eq!(start, 16384);
    file.write(&record(b"fresh")).unwrap();
    file.commit().unwrap();
    let len_before = fs::metadata(&path).unwrap().len();

    file.zap(start).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), len_before);
    file.close().unwrap();

    // The survivor parses back on its own.
    let mut reopened = BobFile::open(&path).unwrap();
    assert_eq!(reopened.parse().unwrap(), b"fresh");
}
