//! End-to-end: drives the `hibp-sort`, `hibp-dupes`, `hibp-join`, and
//! `hibp-convert` binaries as subprocesses (cargo sets `CARGO_BIN_EXE_*` for
//! integration tests in this package), checking their on-disk effects
//! through the library's own reader/writer rather than re-parsing stdout.

use std::process::Command;

use hibp::record::parse_line;
use hibp::store::{FlatFileReader, FlatFileWriter};

fn run(exe: &str, args: &[&str]) -> std::process::Output {
    Command::new(exe)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {exe}: {e}"))
}

#[test]
fn sort_orders_a_scrambled_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("scrambled.bin");
    let output = dir.path().join("sorted.bin");
    {
        let mut w = FlatFileWriter::<20>::create(&input).unwrap();
        for hex in ["30", "10", "20"] {
            let line = format!("00000000000000000000000000000000000000{hex}:1");
            w.append(&parse_line::<20>(&line).unwrap()).unwrap();
        }
    }

    let output_status = run(
        env!("CARGO_BIN_EXE_hibp-sort"),
        &[
            "--input",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ],
    );
    assert!(output_status.status.success(), "{output_status:?}");

    let mut reader = FlatFileReader::<20>::open(&output).unwrap();
    assert_eq!(reader.len(), 3);
    for w in 0..2 {
        let a = reader.get(w).unwrap();
        let b = reader.get(w + 1).unwrap();
        assert!(a.cmp(&b) == std::cmp::Ordering::Less);
    }
}

#[test]
fn dupes_merges_adjacent_equal_hashes() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("withdupes.bin");
    let output = dir.path().join("deduped.bin");
    {
        let mut w = FlatFileWriter::<20>::create(&input).unwrap();
        w.append(&parse_line::<20>("0000000000000000000000000000000000000010:3").unwrap())
            .unwrap();
        w.append(&parse_line::<20>("0000000000000000000000000000000000000010:4").unwrap())
            .unwrap();
        w.append(&parse_line::<20>("0000000000000000000000000000000000000020:1").unwrap())
            .unwrap();
    }

    let result = run(
        env!("CARGO_BIN_EXE_hibp-dupes"),
        &[
            "--input",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ],
    );
    assert!(result.status.success(), "{result:?}");

    let mut reader = FlatFileReader::<20>::open(&output).unwrap();
    assert_eq!(reader.len(), 2);
    assert_eq!(reader.get(0).unwrap().count, 7);
    assert_eq!(reader.get(1).unwrap().count, 1);
}

#[test]
fn join_merges_two_sorted_corpora() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");
    let output = dir.path().join("joined.bin");
    {
        let mut wa = FlatFileWriter::<20>::create(&a).unwrap();
        wa.append(&parse_line::<20>("0000000000000000000000000000000000000010:1").unwrap())
            .unwrap();
        wa.append(&parse_line::<20>("0000000000000000000000000000000000000030:1").unwrap())
            .unwrap();
    }
    {
        let mut wb = FlatFileWriter::<20>::create(&b).unwrap();
        wb.append(&parse_line::<20>("0000000000000000000000000000000000000010:5").unwrap())
            .unwrap();
        wb.append(&parse_line::<20>("0000000000000000000000000000000000000020:2").unwrap())
            .unwrap();
    }

    let result = run(
        env!("CARGO_BIN_EXE_hibp-join"),
        &[
            "--inputs",
            a.to_str().unwrap(),
            b.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ],
    );
    assert!(result.status.success(), "{result:?}");

    let mut reader = FlatFileReader::<20>::open(&output).unwrap();
    assert_eq!(reader.len(), 3);
    assert_eq!(reader.get(0).unwrap().count, 6); // ...010, merged 1+5
    assert_eq!(reader.get(1).unwrap().count, 2); // ...020
    assert_eq!(reader.get(2).unwrap().count, 1); // ...030
}

#[test]
fn convert_round_trips_text_and_binary() {
    let dir = tempfile::tempdir().unwrap();
    let text_in = dir.path().join("in.txt");
    let binary = dir.path().join("mid.bin");
    let text_out = dir.path().join("out.txt");

    std::fs::write(
        &text_in,
        "0000000000000000000000000000000000000010:7\n0000000000000000000000000000000000000020:9\n",
    )
    .unwrap();

    let to_binary = run(
        env!("CARGO_BIN_EXE_hibp-convert"),
        &[
            "--input",
            text_in.to_str().unwrap(),
            "--output",
            binary.to_str().unwrap(),
        ],
    );
    assert!(to_binary.status.success(), "{to_binary:?}");

    let to_text = run(
        env!("CARGO_BIN_EXE_hibp-convert"),
        &[
            "--input",
            binary.to_str().unwrap(),
            "--output",
            text_out.to_str().unwrap(),
            "--to-text",
        ],
    );
    assert!(to_text.status.success(), "{to_text:?}");

    let roundtripped = std::fs::read_to_string(&text_out).unwrap();
    assert_eq!(roundtripped, std::fs::read_to_string(&text_in).unwrap());
}
