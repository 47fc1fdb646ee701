//! Diff (C5): edit script between two sorted corpora of the same hash kind.
//! Grounded on `src/diffutils.cpp`'s `run_diff`.

use std::io::Write as _;

use crate::error::{HibpError, HibpResult};
use crate::record::Record;
use crate::store::FlatFileReader;

/// Walks `old` and `new` in lockstep, writing `I:<idx8hex>:<record>` /
/// `U:<idx8hex>:<record>` lines to `out`. Fails with `IllegalDeletion` the
/// moment the evolution from `old` to `new` can't be explained by inserts
/// and in-place count updates alone.
pub fn diff<const H: usize>(
    old: &mut FlatFileReader<H>,
    new: &mut FlatFileReader<H>,
    out: &mut impl std::io::Write,
) -> HibpResult<()> {
    let on = old.len();
    let nn = new.len();
    let mut oi: u64 = 0;
    let mut ni: u64 = 0;

    loop {
        match (oi < on, ni < nn) {
            (false, false) => break,
            (true, false) => {
                return Err(HibpError::IllegalDeletion {
                    context: format!(
                        "NEW exhausted at index {ni} while OLD still has records from {oi}"
                    ),
                });
            }
            (false, true) => {
                while ni < nn {
                    let rec = new.get(ni)?;
                    writeln!(out, "I:{oi:08X}:{}", rec.format())
                        .map_err(|e| HibpError::io("<diff output>", e))?;
                    ni += 1;
                }
                break;
            }
            (true, true) => {
                let orec = old.get(oi)?;
                let nrec = new.get(ni)?;
                if orec.deep_eq(&nrec) {
                    oi += 1;
                    ni += 1;
                    continue;
                }
                if orec.hash_eq(&nrec) {
                    writeln!(out, "U:{oi:08X}:{}", nrec.format())
                        .map_err(|e| HibpError::io("<diff output>", e))?;
                    oi += 1;
                    ni += 1;
                    continue;
                }
                if ni + 1 < nn && deep_eq_at(&orec, new, ni + 1)? {
                    writeln!(out, "I:{oi:08X}:{}", nrec.format())
                        .map_err(|e| HibpError::io("<diff output>", e))?;
                    ni += 1;
                    continue;
                }
                return Err(HibpError::IllegalDeletion {
                    context: format!("OLD[{oi}] has no counterpart in NEW at/after {ni}"),
                });
            }
        }
    }
    Ok(())
}

fn deep_eq_at<const H: usize>(
    orec: &Record<H>,
    new: &mut FlatFileReader<H>,
    ni: u64,
) -> HibpResult<bool> {
    let lookahead = new.get(ni)?;
    Ok(orec.deep_eq(&lookahead))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_line;
    use crate::store::FlatFileWriter;
    use std::path::Path;

    fn write_corpus(dir: &Path, name: &str, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut w = FlatFileWriter::<20>::create(&path).unwrap();
        for line in lines {
            w.append(&parse_line::<20>(line).unwrap()).unwrap();
        }
        path
    }

    const OLD_LINES: [&str; 3] = [
        "0000000000000000000000000000000000000010:10",
        "0000000000000000000000000000000000000020:20",
        "0000000000000000000000000000000000000030:30",
    ];

    #[test]
    fn insert_at_head() {
        let dir = tempfile::tempdir().unwrap();
        let old_path = write_corpus(dir.path(), "old.bin", &OLD_LINES);
        let new_path = write_corpus(
            dir.path(),
            "new.bin",
            &[
                "0000000000000000000000000000000000000005:5",
                OLD_LINES[0],
                OLD_LINES[1],
                OLD_LINES[2],
            ],
        );
        let mut old = FlatFileReader::<20>::open(&old_path).unwrap();
        let mut new = FlatFileReader::<20>::open(&new_path).unwrap();
        let mut out = Vec::new();
        diff(&mut old, &mut new, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "I:00000000:0000000000000000000000000000000000000005:5\n"
        );
    }

    #[test]
    fn update_middle() {
        let dir = tempfile::tempdir().unwrap();
        let old_path = write_corpus(dir.path(), "old.bin", &OLD_LINES);
        let new_path = write_corpus(
            dir.path(),
            "new.bin",
            &[
                OLD_LINES[0],
                "0000000000000000000000000000000000000020:21",
                OLD_LINES[2],
            ],
        );
        let mut old = FlatFileReader::<20>::open(&old_path).unwrap();
        let mut new = FlatFileReader::<20>::open(&new_path).unwrap();
        let mut out = Vec::new();
        diff(&mut old, &mut new, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "U:00000001:0000000000000000000000000000000000000020:21\n"
        );
    }

    #[test]
    fn illegal_deletion_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let old_path = write_corpus(dir.path(), "old.bin", &OLD_LINES);
        let new_path = write_corpus(dir.path(), "new.bin", &[OLD_LINES[1], OLD_LINES[2]]);
        let mut old = FlatFileReader::<20>::open(&old_path).unwrap();
        let mut new = FlatFileReader::<20>::open(&new_path).unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            diff(&mut old, &mut new, &mut out),
            Err(HibpError::IllegalDeletion { .. })
        ));
    }

    #[test]
    fn identical_corpora_produce_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let old_path = write_corpus(dir.path(), "old.bin", &OLD_LINES);
        let new_path = write_corpus(dir.path(), "new.bin", &OLD_LINES);
        let mut old = FlatFileReader::<20>::open(&old_path).unwrap();
        let mut new = FlatFileReader::<20>::open(&new_path).unwrap();
        let mut out = Vec::new();
        diff(&mut old, &mut new, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
