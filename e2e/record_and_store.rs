//! End-to-end: parse text records, write a flat-file corpus, read it back.

use hibp::record::parse_line;
use hibp::store::{FlatFileReader, FlatFileWriter};

#[test]
fn round_trips_a_small_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.bin");

    let lines = [
        "0000000000000000000000000000000000000010:10",
        "0000000000000000000000000000000000000020:20",
        "0000000000000000000000000000000000000030:30",
    ];
    {
        let mut w = FlatFileWriter::<20>::create(&path).unwrap();
        for line in lines {
            w.append(&parse_line::<20>(line).unwrap()).unwrap();
        }
    }

    let mut r = FlatFileReader::<20>::open(&path).unwrap();
    assert_eq!(r.len(), 3);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(r.get(i as u64).unwrap().format(), *line);
    }
}

#[test]
fn ntlm_and_sha1t64_widths_are_independent() {
    let dir = tempfile::tempdir().unwrap();

    let ntlm_path = dir.path().join("ntlm.bin");
    let mut ntlm_writer = FlatFileWriter::<16>::create(&ntlm_path).unwrap();
    ntlm_writer
        .append(&parse_line::<16>("00000000000000000000000000000010:1").unwrap())
        .unwrap();
    drop(ntlm_writer);
    let mut ntlm_reader = FlatFileReader::<16>::open(&ntlm_path).unwrap();
    assert_eq!(ntlm_reader.get(0).unwrap().count, 1);

    let t64_path = dir.path().join("t64.bin");
    let mut t64_writer = FlatFileWriter::<8>::create(&t64_path).unwrap();
    t64_writer
        .append(&parse_line::<8>("0000000000000010:1").unwrap())
        .unwrap();
    drop(t64_writer);
    let mut t64_reader = FlatFileReader::<8>::open(&t64_path).unwrap();
    assert_eq!(t64_reader.get(0).unwrap().count, 1);
}
