//! End-to-end: extract the top N most-seen hashes from a larger corpus.

use hibp::record::parse_line;
use hibp::store::{FlatFileReader, FlatFileWriter};
use hibp::topn::top_n;

#[test]
fn extracts_highest_counts_in_hash_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.bin");

    let counts: Vec<i32> = (0..1000).map(|i| (i * 37) % 997).collect();
    {
        let mut w = FlatFileWriter::<20>::create(&path).unwrap();
        for (i, count) in counts.iter().enumerate() {
            let line = format!("{i:05X}00000000000000000000000000000000:{count}");
            w.append(&parse_line::<20>(&line).unwrap()).unwrap();
        }
    }

    let mut reader = FlatFileReader::<20>::open(&path).unwrap();
    let top = top_n(&mut reader, 20).unwrap();
    assert_eq!(top.len(), 20);

    let mut expected_counts = counts.clone();
    expected_counts.sort_unstable();
    let expected_min = expected_counts[expected_counts.len() - 20];
    for rec in &top {
        assert!(rec.count >= expected_min);
    }
    for w in top.windows(2) {
        assert!(w[0].cmp(&w[1]) == std::cmp::Ordering::Less);
    }
}
