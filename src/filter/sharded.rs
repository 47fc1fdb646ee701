//! On-disk container for per-prefix-shard binary fuse filters.
//!
//! Grounded on `include/filter.hpp`'s sharded-file layout:
//!
//! ```text
//! offset 0 .. 16        header: ASCII tag "sbinfuse<ff>-<SSSS>"
//!                       <ff> = fingerprint width ("08"; 16-bit filters are
//!                       not built by this crate, see DESIGN.md), <SSSS> =
//!                       shard count zero-padded to 4 digits
//! offset 16 .. 16+8*S   index: S little-endian 64-bit byte offsets of each
//!                       shard's filter body, or u64::MAX for "empty"
//! offset 16+8*S .. end  bodies: filters appended in increasing prefix order
//! ```
//! A shard's body length isn't stored explicitly: it runs from its offset to
//! the next populated shard's offset, or to end-of-file for the last one.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{HibpError, HibpResult};

const HEADER_LEN: u64 = 16;
const EMPTY: u64 = u64::MAX;
const FINGERPRINT_WIDTH: &[u8; 2] = b"08";

/// Builds a sharded filter file, one shard at a time, in strictly ascending
/// prefix order (mirrors the downloader writer's ordering contract).
pub struct ShardedFilterWriter {
    file: File,
    path: PathBuf,
    shard_bits: u8,
    num_shards: u32,
    index: Vec<u64>,
    next_expected: u32,
    body_cursor: u64,
}

impl ShardedFilterWriter {
    pub fn create(path: impl AsRef<Path>, shard_bits: u8) -> HibpResult<Self> {
        let path = path.as_ref().to_path_buf();
        let num_shards = 1u32 << shard_bits;
        let body_start = HEADER_LEN + num_shards as u64 * 8;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| HibpError::io(&path, e))?;
        file.set_len(body_start).map_err(|e| HibpError::io(&path, e))?;
        Ok(Self {
            file,
            path,
            shard_bits,
            num_shards,
            index: vec![EMPTY; num_shards as usize],
            next_expected: 0,
            body_cursor: body_start,
        })
    }

    /// Appends shard `prefix`'s already-serialized filter bytes. Shards must
    /// arrive in order; a gap is `ShardOrder`, a repeat is `ShardDuplicate`.
    pub fn add_shard(&mut self, prefix: u32, filter_bytes: &[u8]) -> HibpResult<()> {
        self.check_order(prefix)?;
        self.file
            .seek(SeekFrom::Start(self.body_cursor))
            .map_err(|e| HibpError::io(&self.path, e))?;
        self.file
            .write_all(filter_bytes)
            .map_err(|e| HibpError::io(&self.path, e))?;
        self.index[prefix as usize] = self.body_cursor;
        self.body_cursor += filter_bytes.len() as u64;
        self.next_expected += 1;
        Ok(())
    }

    /// Skips `prefix` (an empty shard with no filter); its index entry stays
    /// `EMPTY`, so queries against it fail with `MissingShard`.
    pub fn skip_shard(&mut self, prefix: u32) -> HibpResult<()> {
        self.check_order(prefix)?;
        self.next_expected += 1;
        Ok(())
    }

    fn check_order(&self, prefix: u32) -> HibpResult<()> {
        if prefix >= self.num_shards {
            return Err(HibpError::ShardOrder {
                expected: self.next_expected,
                got: prefix,
            });
        }
        if prefix < self.next_expected {
            return Err(HibpError::ShardDuplicate { prefix });
        }
        if prefix != self.next_expected {
            return Err(HibpError::ShardOrder {
                expected: self.next_expected,
                got: prefix,
            });
        }
        Ok(())
    }

    /// Writes the header and index table, finalising the file.
    pub fn finish(mut self) -> HibpResult<()> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| HibpError::io(&self.path, e))?;
        let mut header = [0u8; HEADER_LEN as usize];
        header[0..8].copy_from_slice(b"sbinfuse");
        header[8..10].copy_from_slice(FINGERPRINT_WIDTH);
        header[10] = b'-';
        let count_digits = format!("{:04}", self.num_shards);
        header[11..15].copy_from_slice(count_digits.as_bytes());
        self.file
            .write_all(&header)
            .map_err(|e| HibpError::io(&self.path, e))?;

        let mut index_buf = Vec::with_capacity(self.index.len() * 8);
        for offset in &self.index {
            index_buf.extend_from_slice(&offset.to_le_bytes());
        }
        self.file
            .write_all(&index_buf)
            .map_err(|e| HibpError::io(&self.path, e))?;
        self.file.flush().map_err(|e| HibpError::io(&self.path, e))
    }
}

/// Read-only, memory-mapped view of a sharded filter file.
pub struct ShardedFilterFile {
    mmap: Mmap,
    shard_bits: u8,
    num_shards: u32,
}

impl ShardedFilterFile {
    pub fn open(path: impl AsRef<Path>) -> HibpResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| HibpError::io(path, e))?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| HibpError::io(path, e))?;
        if mmap.len() < HEADER_LEN as usize || &mmap[0..8] != b"sbinfuse" {
            return Err(HibpError::CorruptFilterFile {
                path: path.to_path_buf(),
                reason: "bad magic".to_string(),
            });
        }
        let count_str = std::str::from_utf8(&mmap[11..15]).map_err(|_| {
            HibpError::CorruptFilterFile {
                path: path.to_path_buf(),
                reason: "non-utf8 shard count".to_string(),
            }
        })?;
        let num_shards: u32 = count_str.parse().map_err(|_| HibpError::CorruptFilterFile {
            path: path.to_path_buf(),
            reason: format!("bad shard count {count_str:?}"),
        })?;
        let shard_bits = 32 - num_shards.leading_zeros() as u8 - 1;
        if 1u32 << shard_bits != num_shards {
            return Err(HibpError::CorruptFilterFile {
                path: path.to_path_buf(),
                reason: format!("shard count {num_shards} is not a power of two"),
            });
        }
        let expected_min = HEADER_LEN + num_shards as u64 * 8;
        if (mmap.len() as u64) < expected_min {
            return Err(HibpError::CorruptFilterFile {
                path: path.to_path_buf(),
                reason: "index table truncated".to_string(),
            });
        }
        Ok(Self {
            mmap,
            shard_bits,
            num_shards,
        })
    }

    pub fn shard_bits(&self) -> u8 {
        self.shard_bits
    }

    fn offset_of(&self, prefix: u32) -> u64 {
        let entry_off = (HEADER_LEN + prefix as u64 * 8) as usize;
        u64::from_le_bytes(self.mmap[entry_off..entry_off + 8].try_into().unwrap())
    }

    fn shard_bytes(&self, prefix: u32) -> HibpResult<Option<&[u8]>> {
        if prefix >= self.num_shards {
            return Err(HibpError::MissingShard { prefix });
        }
        let start = self.offset_of(prefix);
        if start == EMPTY {
            return Ok(None);
        }
        let mut end = self.mmap.len() as u64;
        for next in (prefix + 1)..self.num_shards {
            let candidate = self.offset_of(next);
            if candidate != EMPTY {
                end = candidate;
                break;
            }
        }
        Ok(Some(&self.mmap[start as usize..end as usize]))
    }

    /// Tests membership of `key` against shard `prefix`'s filter. Each call
    /// deserializes that shard's bytes out of the mapping into an owned
    /// filter (a bounded copy, not true zero-copy; see DESIGN.md).
    pub fn contains(&self, prefix: u32, key: u64) -> HibpResult<bool> {
        use super::binary_fuse::ShardFilter;
        match self.shard_bytes(prefix)? {
            None => Err(HibpError::MissingShard { prefix }),
            Some(bytes) => Ok(ShardFilter::from_bytes(bytes)?.contains(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::binary_fuse::ShardFilter;

    #[test]
    fn write_then_query_across_shards() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.bin");

        let shard0_keys: Vec<u64> = (0..1000u64).map(|i| i * 3).collect();
        let shard1_keys: Vec<u64> = (0..1000u64).map(|i| i * 3 + 1).collect();

        let mut w = ShardedFilterWriter::create(&path, 2).unwrap();
        let f0 = ShardFilter::build(0, &shard0_keys).unwrap().unwrap();
        w.add_shard(0, &f0.to_bytes().unwrap()).unwrap();
        let f1 = ShardFilter::build(1, &shard1_keys).unwrap().unwrap();
        w.add_shard(1, &f1.to_bytes().unwrap()).unwrap();
        w.skip_shard(2).unwrap();
        w.skip_shard(3).unwrap();
        w.finish().unwrap();

        let reader = ShardedFilterFile::open(&path).unwrap();
        assert_eq!(reader.shard_bits(), 2);
        assert!(reader.contains(0, shard0_keys[5]).unwrap());
        assert!(reader.contains(1, shard1_keys[5]).unwrap());
        assert!(matches!(
            reader.contains(2, 42),
            Err(HibpError::MissingShard { prefix: 2 })
        ));
    }

    #[test]
    fn out_of_order_shard_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.bin");
        let mut w = ShardedFilterWriter::create(&path, 2).unwrap();
        let f = ShardFilter::build(0, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap().unwrap();
        assert!(matches!(
            w.add_shard(1, &f.to_bytes().unwrap()),
            Err(HibpError::ShardOrder { expected: 0, got: 1 })
        ));
    }

    #[test]
    fn trailing_empty_shard_body_runs_to_eof() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.bin");
        let keys: Vec<u64> = (0..1000u64).map(|i| i * 3).collect();
        let mut w = ShardedFilterWriter::create(&path, 1).unwrap();
        let f0 = ShardFilter::build(0, &keys).unwrap().unwrap();
        w.add_shard(0, &f0.to_bytes().unwrap()).unwrap();
        w.skip_shard(1).unwrap();
        w.finish().unwrap();

        let reader = ShardedFilterFile::open(&path).unwrap();
        assert!(reader.contains(0, keys[0]).unwrap());
        assert!(matches!(
            reader.contains(1, 1),
            Err(HibpError::MissingShard { prefix: 1 })
        ));
    }
}
