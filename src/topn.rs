//! Top-N (C6): bounded partial sort by count, then re-sort the survivors by
//! hash. Grounded on `app/hibp_topn.cpp`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::prelude::*;

use crate::error::{HibpError, HibpResult};
use crate::record::Record;
use crate::store::FlatFileReader;

#[derive(Clone, Copy)]
struct ByCount<const H: usize>(Record<H>);

impl<const H: usize> PartialEq for ByCount<H> {
    fn eq(&self, other: &Self) -> bool {
        self.0.count == other.0.count
    }
}
impl<const H: usize> Eq for ByCount<H> {}
impl<const H: usize> PartialOrd for ByCount<H> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<const H: usize> Ord for ByCount<H> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.count.cmp(&other.0.count)
    }
}

/// Reads the whole corpus sequentially (disk-bound, kept single-threaded),
/// retains the `n` records with the highest count via a size-`n` min-heap,
/// then re-sorts the survivors ascending by hash (parallel: this pass is
/// in-memory, not disk-bound, so `rayon` is a legitimate tunable here).
pub fn top_n<const H: usize>(reader: &mut FlatFileReader<H>, n: usize) -> HibpResult<Vec<Record<H>>>
where
    Record<H>: Send,
{
    let len = reader.len() as usize;
    if len <= n {
        return Err(HibpError::InputTooSmall { len, n });
    }

    let mut heap: BinaryHeap<std::cmp::Reverse<ByCount<H>>> = BinaryHeap::with_capacity(n + 1);
    for i in 0..reader.len() {
        let rec = reader.get(i)?;
        if heap.len() < n {
            heap.push(std::cmp::Reverse(ByCount(rec)));
        } else if let Some(std::cmp::Reverse(smallest)) = heap.peek() {
            if rec.count > smallest.0.count {
                heap.pop();
                heap.push(std::cmp::Reverse(ByCount(rec)));
            }
        }
    }

    let mut result: Vec<Record<H>> = heap.into_iter().map(|r| r.0 .0).collect();
    result.par_sort_unstable_by(|a, b| a.cmp(b));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_line;
    use crate::store::FlatFileWriter;

    fn corpus_of(dir: &std::path::Path, counts: &[i32]) -> std::path::PathBuf {
        let path = dir.join("corpus.bin");
        let mut w = FlatFileWriter::<20>::create(&path).unwrap();
        for (i, &count) in counts.iter().enumerate() {
            let line = format!("{i:040X}:{count}");
            w.append(&parse_line::<20>(&line).unwrap()).unwrap();
        }
        path
    }

    #[test]
    fn keeps_highest_counts_sorted_by_hash() {
        let dir = tempfile::tempdir().unwrap();
        let counts = [5, 1, 9, 3, 7, 2, 8, 4, 6, 0];
        let path = corpus_of(dir.path(), &counts);
        let mut reader = FlatFileReader::<20>::open(&path).unwrap();
        let top = top_n(&mut reader, 3).unwrap();
        assert_eq!(top.len(), 3);
        let kept_counts: Vec<i32> = top.iter().map(|r| r.count).collect();
        assert_eq!(kept_counts.iter().copied().max().unwrap(), 9);
        // ascending by hash (= ascending by original index here)
        for w in top.windows(2) {
            assert!(w[0].cmp(&w[1]) == Ordering::Less);
        }
        let mut sorted_counts = counts.to_vec();
        sorted_counts.sort_unstable();
        assert_eq!(kept_counts.iter().copied().min().unwrap(), 7);
    }

    #[test]
    fn rejects_when_input_not_larger_than_n() {
        let dir = tempfile::tempdir().unwrap();
        let path = corpus_of(dir.path(), &[1, 2, 3]);
        let mut reader = FlatFileReader::<20>::open(&path).unwrap();
        assert!(matches!(
            top_n(&mut reader, 3),
            Err(HibpError::InputTooSmall { len: 3, n: 3 })
        ));
    }
}
