//! Tests for LogFile
//!
//! These tests verify:
//! - Creating and reopening the data file
//! - Append offsets and the write offset
//! - Positioned reads, end-of-log and corruption
//! - Sequential iteration

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use minicask::config::SyncStrategy;
use minicask::log::{Entry, LogFile, HEADER_SIZE};
use minicask::CaskError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.data");
    (temp_dir, path)
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_creates_empty_file() {
    let (_temp, path) = setup_temp_log();

    let log = LogFile::open_or_create(&path, SyncStrategy::EveryWrite).unwrap();

    assert!(path.exists());
    assert!(log.is_empty());
    assert_eq!(log.write_offset(), 0);
    assert_eq!(log.path(), path.as_path());
}

#[test]
fn test_reopen_resumes_at_end() {
    let (_temp, path) = setup_temp_log();

    let end = {
        let mut log = LogFile::open_or_create(&path, SyncStrategy::EveryWrite).unwrap();
        log.append(&Entry::put(b"a".to_vec(), b"1".to_vec())).unwrap();
        log.append(&Entry::put(b"b".to_vec(), b"2".to_vec())).unwrap();
        let end = log.write_offset();
        log.close().unwrap();
        end
    };

    let mut log = LogFile::open_or_create(&path, SyncStrategy::EveryWrite).unwrap();
    assert_eq!(log.write_offset(), end);

    let offset = log.append(&Entry::put(b"c".to_vec(), b"3".to_vec())).unwrap();
    assert_eq!(offset, end);

    // Earlier records are untouched
    let first = log.read_at(0).unwrap().unwrap();
    assert_eq!(first.key, b"a");
}

#[test]
fn test_create_discards_existing_contents() {
    let (_temp, path) = setup_temp_log();

    {
        let mut log = LogFile::open_or_create(&path, SyncStrategy::OnClose).unwrap();
        log.append(&Entry::put(b"old".to_vec(), b"data".to_vec())).unwrap();
        log.close().unwrap();
    }

    let log = LogFile::create(&path, SyncStrategy::OnClose).unwrap();
    assert!(log.is_empty());
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
}

// =============================================================================
// Append/Read Tests
// =============================================================================

#[test]
fn test_append_returns_sequential_offsets() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open_or_create(&path, SyncStrategy::EveryWrite).unwrap();

    let e1 = Entry::put(b"key1".to_vec(), b"value1".to_vec());
    let e2 = Entry::delete(b"key1".to_vec());
    let e3 = Entry::put(b"k".to_vec(), Vec::new());

    let o1 = log.append(&e1).unwrap();
    let o2 = log.append(&e2).unwrap();
    let o3 = log.append(&e3).unwrap();

    assert_eq!(o1, 0);
    assert_eq!(o2, e1.encoded_size());
    assert_eq!(o3, e1.encoded_size() + e2.encoded_size());
    assert_eq!(
        log.write_offset(),
        e1.encoded_size() + e2.encoded_size() + e3.encoded_size()
    );
    assert_eq!(std::fs::metadata(&path).unwrap().len(), log.write_offset());
}

#[test]
fn test_read_at_each_offset() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open_or_create(&path, SyncStrategy::OnClose).unwrap();

    let entries = vec![
        Entry::put(b"a".to_vec(), b"alpha".to_vec()),
        Entry::put(b"b".to_vec(), b"beta".to_vec()),
        Entry::delete(b"a".to_vec()),
    ];
    let offsets: Vec<u64> = entries.iter().map(|e| log.append(e).unwrap()).collect();

    for (entry, offset) in entries.iter().zip(offsets) {
        assert_eq!(log.read_at(offset).unwrap().as_ref(), Some(entry));
    }
}

#[test]
fn test_read_at_end_is_none() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open_or_create(&path, SyncStrategy::OnClose).unwrap();

    log.append(&Entry::put(b"a".to_vec(), b"1".to_vec())).unwrap();

    assert!(log.read_at(log.write_offset()).unwrap().is_none());
    assert!(log.read_at(log.write_offset() + 100).unwrap().is_none());
}

#[test]
fn test_read_at_truncated_tail_is_corruption() {
    let (_temp, path) = setup_temp_log();

    {
        let mut file = OpenOptions::new().create(true).write(true).open(&path).unwrap();
        let bytes = Entry::put(b"key".to_vec(), b"value".to_vec()).encode().unwrap();
        file.write_all(&bytes[..HEADER_SIZE + 2]).unwrap();
    }

    let log = LogFile::open_or_create(&path, SyncStrategy::OnClose).unwrap();
    let err = log.read_at(0).unwrap_err();

    assert!(err.is_corruption());
}

#[test]
fn test_concurrent_positioned_reads() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open_or_create(&path, SyncStrategy::OnClose).unwrap();

    let offsets: Vec<u64> = (0..200)
        .map(|i| {
            log.append(&Entry::put(
                format!("key{}", i).into_bytes(),
                format!("value{}", i).into_bytes(),
            ))
            .unwrap()
        })
        .collect();

    let log = &log;
    let offsets = &offsets;
    crossbeam::thread::scope(|s| {
        for t in 0..4 {
            s.spawn(move |_| {
                for (i, &offset) in offsets.iter().enumerate().skip(t) {
                    let entry = log.read_at(offset).unwrap().unwrap();
                    assert_eq!(entry.key, format!("key{}", i).into_bytes());
                }
            });
        }
    })
    .unwrap();
}

// =============================================================================
// Truncate Tests
// =============================================================================

#[test]
fn test_truncate_drops_tail_and_resumes_appends() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open_or_create(&path, SyncStrategy::EveryWrite).unwrap();

    log.append(&Entry::put(b"a".to_vec(), b"1".to_vec())).unwrap();
    let cut = log.append(&Entry::put(b"b".to_vec(), b"2".to_vec())).unwrap();
    log.append(&Entry::put(b"c".to_vec(), b"3".to_vec())).unwrap();

    log.truncate(cut).unwrap();

    assert_eq!(log.write_offset(), cut);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), cut);
    assert!(log.read_at(cut).unwrap().is_none());

    // The next record lands exactly where its offset says
    let offset = log.append(&Entry::put(b"d".to_vec(), b"4".to_vec())).unwrap();
    assert_eq!(offset, cut);
    assert_eq!(log.read_at(offset).unwrap().unwrap().key, b"d");
    assert_eq!(std::fs::metadata(&path).unwrap().len(), log.write_offset());

    let keys: Vec<Vec<u8>> = log.iter().unwrap().map(|r| r.unwrap().1.key).collect();
    assert_eq!(keys, vec![b"a".to_vec(), b"d".to_vec()]);
}

#[test]
fn test_truncate_past_end_is_invalid_state() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open_or_create(&path, SyncStrategy::OnClose).unwrap();
    log.append(&Entry::put(b"a".to_vec(), b"1".to_vec())).unwrap();
    let end = log.write_offset();

    let err = log.truncate(end + 1).unwrap_err();

    assert!(matches!(err, CaskError::InvalidState(_)));
    assert_eq!(log.write_offset(), end);
}

#[test]
fn test_truncate_survives_reopen() {
    let (_temp, path) = setup_temp_log();

    {
        let mut log = LogFile::open_or_create(&path, SyncStrategy::OnClose).unwrap();
        log.append(&Entry::put(b"keep".to_vec(), b"1".to_vec())).unwrap();
        let cut = log.write_offset();
        log.append(&Entry::put(b"drop".to_vec(), b"2".to_vec())).unwrap();
        log.truncate(cut).unwrap();
        log.close().unwrap();
    }

    let log = LogFile::open_or_create(&path, SyncStrategy::OnClose).unwrap();
    let keys: Vec<Vec<u8>> = log.iter().unwrap().map(|r| r.unwrap().1.key).collect();
    assert_eq!(keys, vec![b"keep".to_vec()]);
}

// =============================================================================
// Iterator Tests
// =============================================================================

#[test]
fn test_iter_empty_log() {
    let (_temp, path) = setup_temp_log();
    let log = LogFile::open_or_create(&path, SyncStrategy::OnClose).unwrap();

    assert_eq!(log.iter().unwrap().count(), 0);
}

#[test]
fn test_iter_yields_offsets_in_write_order() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open_or_create(&path, SyncStrategy::OnClose).unwrap();

    let mut expected = Vec::new();
    for i in 0..50 {
        let entry = if i % 5 == 4 {
            Entry::delete(format!("key{}", i - 1).into_bytes())
        } else {
            Entry::put(format!("key{}", i).into_bytes(), vec![i as u8; i])
        };
        let offset = log.append(&entry).unwrap();
        expected.push((offset, entry));
    }

    let scanned: Vec<(u64, Entry)> = log.iter().unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(scanned, expected);
}

#[test]
fn test_iter_stops_at_corruption() {
    let (_temp, path) = setup_temp_log();

    {
        let mut log = LogFile::open_or_create(&path, SyncStrategy::OnClose).unwrap();
        log.append(&Entry::put(b"good".to_vec(), b"record".to_vec())).unwrap();
        log.close().unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0u8; 4]).unwrap(); // partial header
    }

    let log = LogFile::open_or_create(&path, SyncStrategy::OnClose).unwrap();
    let mut iter = log.iter().unwrap();

    let (offset, entry) = iter.next().unwrap().unwrap();
    assert_eq!(offset, 0);
    assert_eq!(entry.key, b"good");

    assert!(iter.next().unwrap().unwrap_err().is_corruption());
    assert!(iter.next().is_none());
}
