//! Table-of-contents index (C7): build/load/query a prefix -> first-record
//! offset array. Grounded on `include/toc.hpp` / `src/toc.cpp`.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::error::{HibpError, HibpResult};
use crate::record::Record;
use crate::store::FlatFileReader;

pub struct Toc {
    bits: u8,
    table: Vec<u32>,
}

impl Toc {
    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Builds the table by a single linear scan. A gap — a prefix value with
    /// no record and more data beyond it — is fatal. A short final bucket
    /// (the corpus doesn't reach `2^bits - 1`) just shortens the table.
    pub fn build<const H: usize>(reader: &mut FlatFileReader<H>, bits: u8) -> HibpResult<Self> {
        let capacity = 1u32 << bits;
        let n = reader.len();
        let mut table = Vec::with_capacity(capacity as usize);
        let mut pos: u64 = 0;
        for i in 0..capacity {
            while pos < n && reader.get(pos)?.prefix(bits) < i {
                pos += 1;
            }
            if pos >= n {
                break;
            }
            let found_prefix = reader.get(pos)?.prefix(bits);
            if found_prefix != i {
                return Err(HibpError::ToCMissingPrefix { prefix: i, bits });
            }
            table.push(pos as u32);
        }
        Ok(Self { bits, table })
    }

    /// Binary-searches the candidate range `[T[p], T[p+1])` (or `[T[p], n)`
    /// for the last populated bucket) for `needle`.
    pub fn search<const H: usize>(
        &self,
        reader: &mut FlatFileReader<H>,
        needle: &Record<H>,
    ) -> HibpResult<Option<u64>> {
        let prefix = needle.prefix(self.bits) as usize;
        if prefix >= self.table.len() {
            return Ok(None);
        }
        let lo = self.table[prefix] as u64;
        let hi = if prefix + 1 < self.table.len() {
            self.table[prefix + 1] as u64
        } else {
            reader.len()
        };

        let mut l = lo;
        let mut h = hi;
        while l < h {
            let mid = l + (h - l) / 2;
            let rec = reader.get(mid)?;
            match rec.cmp(needle) {
                Ordering::Less => l = mid + 1,
                Ordering::Greater => h = mid,
                Ordering::Equal => return Ok(Some(mid)),
            }
        }
        Ok(None)
    }

    /// `<corpus>.<bits>.toc`, a raw little-endian `u32` array.
    pub fn toc_path(corpus_path: &Path, bits: u8) -> PathBuf {
        let mut s = corpus_path.as_os_str().to_owned();
        s.push(format!(".{bits}.toc"));
        PathBuf::from(s)
    }

    pub fn save(&self, corpus_path: &Path) -> HibpResult<()> {
        let path = Self::toc_path(corpus_path, self.bits);
        let mut buf = Vec::with_capacity(self.table.len() * 4);
        for v in &self.table {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        std::fs::write(&path, &buf).map_err(|e| HibpError::io(&path, e))
    }

    pub fn load(corpus_path: &Path, bits: u8) -> HibpResult<Self> {
        let path = Self::toc_path(corpus_path, bits);
        let bytes = std::fs::read(&path).map_err(|e| HibpError::io(&path, e))?;
        let table = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        Ok(Self { bits, table })
    }

    /// Loads an up-to-date ToC if one exists (mtime newer than the corpus's),
    /// otherwise rebuilds it from `reader` and persists the result.
    pub fn load_or_build<const H: usize>(
        corpus_path: &Path,
        bits: u8,
        reader: &mut FlatFileReader<H>,
    ) -> HibpResult<Self> {
        let toc_path = Self::toc_path(corpus_path, bits);
        if let (Ok(corpus_meta), Ok(toc_meta)) =
            (std::fs::metadata(corpus_path), std::fs::metadata(&toc_path))
        {
            let corpus_mtime = FileTime::from_last_modification_time(&corpus_meta);
            let toc_mtime = FileTime::from_last_modification_time(&toc_meta);
            if toc_mtime > corpus_mtime {
                return Self::load(corpus_path, bits);
            }
        }
        let toc = Self::build(reader, bits)?;
        toc.save(corpus_path)?;
        Ok(toc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_line;
    use crate::store::FlatFileWriter;

    fn build_corpus(dir: &Path, lines: &[&str]) -> PathBuf {
        let path = dir.join("corpus.bin");
        let mut w = FlatFileWriter::<20>::create(&path).unwrap();
        for line in lines {
            w.append(&parse_line::<20>(line).unwrap()).unwrap();
        }
        path
    }

    #[test]
    fn monotonicity_and_exactness() {
        let dir = tempfile::tempdir().unwrap();
        let lines: Vec<String> = (0u32..64)
            .map(|i| format!("{i:05X}000000000000000000000000000000000:{i}"))
            .collect();
        let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let path = build_corpus(dir.path(), &line_refs);

        let mut reader = FlatFileReader::<20>::open(&path).unwrap();
        let toc = Toc::build(&mut reader, 6).unwrap();
        assert_eq!(toc.len(), 64);

        // I4: monotonic
        for i in 0..toc.table.len() - 1 {
            assert!(toc.table[i] <= toc.table[i + 1]);
        }

        // I5: exactness — every record's index lies within its bucket range
        for i in 0..reader.len() {
            let rec = reader.get(i).unwrap();
            let p = rec.prefix(6) as usize;
            let lo = toc.table[p] as u64;
            let hi = if p + 1 < toc.table.len() {
                toc.table[p + 1] as u64
            } else {
                reader.len()
            };
            assert!(lo <= i && i < hi);
        }
    }

    #[test]
    fn search_hit_and_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = build_corpus(
            dir.path(),
            &["0000000000000000000000000000000000000010:10"],
        );
        let mut reader = FlatFileReader::<20>::open(&path).unwrap();
        let toc = Toc::build(&mut reader, 4).unwrap();

        let hit_needle = parse_line::<20>("0000000000000000000000000000000000000010").unwrap();
        let idx = toc.search(&mut reader, &hit_needle).unwrap().unwrap();
        assert_eq!(reader.get(idx).unwrap().count, 10);

        let miss_needle = parse_line::<20>("0000000000000000000000000000000000000011").unwrap();
        assert!(toc.search(&mut reader, &miss_needle).unwrap().is_none());
    }

    #[test]
    fn shortened_for_partial_corpus() {
        let dir = tempfile::tempdir().unwrap();
        // Only prefix 0 populated; bits=4 means capacity 16, but corpus is
        // partial (doesn't reach prefix 15), so the table should be length 1.
        let path = build_corpus(
            dir.path(),
            &["0000000000000000000000000000000000000010:10"],
        );
        let mut reader = FlatFileReader::<20>::open(&path).unwrap();
        let toc = Toc::build(&mut reader, 4).unwrap();
        assert_eq!(toc.len(), 1);
    }

    #[test]
    fn gap_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // bits=4: prefixes 0 and 2 populated but not 1, with more data
        // beyond (prefix 2), so this is a genuine gap, not a partial corpus.
        let path = build_corpus(
            dir.path(),
            &[
                "0000000000000000000000000000000000000010:1",
                "2000000000000000000000000000000000000010:1",
            ],
        );
        let mut reader = FlatFileReader::<20>::open(&path).unwrap();
        assert!(matches!(
            Toc::build(&mut reader, 4),
            Err(HibpError::ToCMissingPrefix { prefix: 1, bits: 4 })
        ));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = build_corpus(
            dir.path(),
            &["0000000000000000000000000000000000000010:10"],
        );
        let mut reader = FlatFileReader::<20>::open(&path).unwrap();
        let toc = Toc::build(&mut reader, 4).unwrap();
        toc.save(&path).unwrap();
        let loaded = Toc::load(&path, 4).unwrap();
        assert_eq!(toc.table, loaded.table);
    }
}
