//! End-to-end: build a ToC over a corpus, persist it, and use it to locate
//! records by binary search.

use hibp::record::parse_line;
use hibp::store::{FlatFileReader, FlatFileWriter};
use hibp::toc::Toc;

fn build_corpus(path: &std::path::Path, n: u32) {
    let mut w = FlatFileWriter::<20>::create(path).unwrap();
    for i in 0..n {
        let line = format!("{i:05X}000000000000000000000000000000000:{i}");
        w.append(&parse_line::<20>(&line).unwrap()).unwrap();
    }
}

#[test]
fn build_then_search() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.bin");
    build_corpus(&path, 256);

    let mut reader = FlatFileReader::<20>::open(&path).unwrap();
    let toc = Toc::build(&mut reader, 8).unwrap();
    assert_eq!(toc.len(), 256);

    let needle = parse_line::<20>("0002A000000000000000000000000000000000").unwrap();
    let idx = toc.search(&mut reader, &needle).unwrap().unwrap();
    assert_eq!(reader.get(idx).unwrap().count, 0x2A);
}

#[test]
fn load_or_build_reuses_fresh_toc() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.bin");
    build_corpus(&path, 64);

    let mut reader = FlatFileReader::<20>::open(&path).unwrap();
    let built = Toc::load_or_build(&path, 6, &mut reader).unwrap();

    let mut reader2 = FlatFileReader::<20>::open(&path).unwrap();
    let loaded = Toc::load_or_build(&path, 6, &mut reader2).unwrap();
    assert_eq!(built.len(), loaded.len());
}
