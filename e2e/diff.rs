//! End-to-end: diff two corpora end to end, exercising insert, update, and
//! the illegal-deletion failure mode through the public API only.

use hibp::diff::diff;
use hibp::error::HibpError;
use hibp::record::parse_line;
use hibp::store::{FlatFileReader, FlatFileWriter};

fn write_corpus(path: &std::path::Path, lines: &[&str]) {
    let mut w = FlatFileWriter::<20>::create(path).unwrap();
    for line in lines {
        w.append(&parse_line::<20>(line).unwrap()).unwrap();
    }
}

#[test]
fn mixed_insert_and_update_script() {
    let dir = tempfile::tempdir().unwrap();
    let old_path = dir.path().join("old.bin");
    let new_path = dir.path().join("new.bin");

    write_corpus(
        &old_path,
        &[
            "0000000000000000000000000000000000000010:10",
            "0000000000000000000000000000000000000020:20",
            "0000000000000000000000000000000000000040:40",
        ],
    );
    write_corpus(
        &new_path,
        &[
            "0000000000000000000000000000000000000010:10",
            "0000000000000000000000000000000000000020:21",
            "0000000000000000000000000000000000000030:5",
            "0000000000000000000000000000000000000040:40",
        ],
    );

    let mut old = FlatFileReader::<20>::open(&old_path).unwrap();
    let mut new = FlatFileReader::<20>::open(&new_path).unwrap();
    let mut out = Vec::new();
    diff(&mut old, &mut new, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(
        text,
        "U:00000001:0000000000000000000000000000000000000020:21\n\
         I:00000002:0000000000000000000000000000000000000030:5\n"
    );
}

#[test]
fn deletion_without_insertion_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let old_path = dir.path().join("old.bin");
    let new_path = dir.path().join("new.bin");
    write_corpus(
        &old_path,
        &[
            "0000000000000000000000000000000000000010:10",
            "0000000000000000000000000000000000000020:20",
        ],
    );
    write_corpus(&new_path, &["0000000000000000000000000000000000000010:10"]);

    let mut old = FlatFileReader::<20>::open(&old_path).unwrap();
    let mut new = FlatFileReader::<20>::open(&new_path).unwrap();
    let mut out = Vec::new();
    assert!(matches!(
        diff(&mut old, &mut new, &mut out),
        Err(HibpError::IllegalDeletion { .. })
    ));
}
