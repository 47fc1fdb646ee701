//! Flat-file record store (C2): a buffered, windowed random-access reader and
//! a buffered append-only writer, plus a small cursor type over the reader.
//!
//! Grounded on `include/flat_file.hpp`: `flat_file<ValueType>` keeps a
//! `[buf_start, buf_end)` window of records in memory and refills it on a
//! miss; `flat_file_writer<ValueType>` batches `append()`s before a single
//! `write_all`.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::FLUSH_RECORDS;
use crate::error::{HibpError, HibpResult};
use crate::record::Record;

/// Read-only, randomly-accessible view of a corpus file, with a sliding
/// window of buffered records for O(1) amortised sequential access.
pub struct FlatFileReader<const H: usize> {
    file: File,
    path: PathBuf,
    n: u64,
    buf: Vec<u8>,
    buf_start: u64,
    buf_records: usize,
    window_records: usize,
}

impl<const H: usize> FlatFileReader<H> {
    /// Opens `path` for read-only random access. Fails with `FormatError` if
    /// the file size is not a multiple of the record size.
    pub fn open(path: impl AsRef<Path>) -> HibpResult<Self> {
        Self::open_with_window(path, FLUSH_RECORDS)
    }

    pub fn open_with_window(path: impl AsRef<Path>, window_records: usize) -> HibpResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| HibpError::io(&path, e))?;
        let size = file
            .metadata()
            .map_err(|e| HibpError::io(&path, e))?
            .len();
        let record_size = Record::<H>::SIZE as u64;
        if size % record_size != 0 {
            return Err(HibpError::FormatError {
                path,
                size,
                record_size: record_size as usize,
            });
        }
        Ok(Self {
            file,
            path,
            n: size / record_size,
            buf: Vec::new(),
            buf_start: 0,
            buf_records: 0,
            window_records: window_records.max(1),
        })
    }

    pub fn len(&self) -> u64 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetches record `i`, refilling the window from disk on a miss.
    pub fn get(&mut self, i: u64) -> HibpResult<Record<H>> {
        if i >= self.n {
            return Err(HibpError::io(
                &self.path,
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("record index {i} out of range (len={})", self.n),
                ),
            ));
        }
        if !(self.buf_start <= i && i < self.buf_start + self.buf_records as u64) {
            self.fill_window(i)?;
        }
        let record_size = Record::<H>::SIZE;
        let offset = (i - self.buf_start) as usize * record_size;
        Ok(Record::<H>::from_bytes(&self.buf[offset..offset + record_size]))
    }

    pub fn last(&mut self) -> HibpResult<Record<H>> {
        let n = self.n;
        self.get(n - 1)
    }

    fn fill_window(&mut self, i: u64) -> HibpResult<()> {
        let record_size = Record::<H>::SIZE as u64;
        self.file
            .seek(SeekFrom::Start(i * record_size))
            .map_err(|e| HibpError::io(&self.path, e))?;
        let records_to_read = (self.window_records as u64).min(self.n - i) as usize;
        let bytes_to_read = records_to_read * record_size as usize;
        self.buf.resize(bytes_to_read, 0);
        self.file
            .read_exact(&mut self.buf)
            .map_err(|e| HibpError::io(&self.path, e))?;
        self.buf_start = i;
        self.buf_records = records_to_read;
        Ok(())
    }

    /// Iterates all records in order, reusing the same buffered window.
    pub fn iter(&mut self) -> impl Iterator<Item = HibpResult<Record<H>>> + '_ {
        (0..self.n).map(move |i| self.get(i))
    }
}

/// A forward/random-access position into a `FlatFileReader`, supporting
/// `+=`/`-=` and subtraction between cursors. Dereferencing (reading the
/// record at the current position) takes the reader explicitly rather than
/// via `Deref`, since producing a `Record` requires I/O against a specific
/// reader instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    pub idx: u64,
}

impl Cursor {
    pub fn new(idx: u64) -> Self {
        Self { idx }
    }

    pub fn get<const H: usize>(&self, reader: &mut FlatFileReader<H>) -> HibpResult<Record<H>> {
        reader.get(self.idx)
    }
}

impl std::ops::AddAssign<u64> for Cursor {
    fn add_assign(&mut self, rhs: u64) {
        self.idx += rhs;
    }
}

impl std::ops::SubAssign<u64> for Cursor {
    fn sub_assign(&mut self, rhs: u64) {
        self.idx -= rhs;
    }
}

impl std::ops::Sub for Cursor {
    type Output = i64;
    fn sub(self, rhs: Self) -> i64 {
        self.idx as i64 - rhs.idx as i64
    }
}

/// Append-only writer with an internal buffer flushed every `FLUSH_RECORDS`
/// records, on explicit `flush()`, or on drop.
pub struct FlatFileWriter<const H: usize> {
    file: File,
    path: PathBuf,
    buf: Vec<u8>,
    buffered: usize,
    flush_threshold: usize,
    written: u64,
}

impl<const H: usize> FlatFileWriter<H> {
    pub fn create(path: impl AsRef<Path>) -> HibpResult<Self> {
        Self::create_with_threshold(path, FLUSH_RECORDS)
    }

    pub fn create_with_threshold(
        path: impl AsRef<Path>,
        flush_threshold: usize,
    ) -> HibpResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| HibpError::io(&path, e))?;
        Ok(Self {
            file,
            path,
            buf: Vec::with_capacity(flush_threshold.max(1) * Record::<H>::SIZE),
            buffered: 0,
            flush_threshold: flush_threshold.max(1),
            written: 0,
        })
    }

    /// Opens for appending to an existing file (used by resume, §4.4).
    pub fn append_to(path: impl AsRef<Path>) -> HibpResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| HibpError::io(&path, e))?;
        let existing = file
            .metadata()
            .map_err(|e| HibpError::io(&path, e))?
            .len();
        Ok(Self {
            file,
            path,
            buf: Vec::with_capacity(FLUSH_RECORDS * Record::<H>::SIZE),
            buffered: 0,
            flush_threshold: FLUSH_RECORDS,
            written: existing / Record::<H>::SIZE as u64,
        })
    }

    pub fn append(&mut self, rec: &Record<H>) -> HibpResult<()> {
        rec.write_to(&mut self.buf);
        self.buffered += 1;
        self.written += 1;
        if self.buffered >= self.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> HibpResult<()> {
        if !self.buf.is_empty() {
            self.file
                .write_all(&self.buf)
                .map_err(|e| HibpError::io(&self.path, e))?;
            self.buf.clear();
            self.buffered = 0;
        }
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.written
    }
}

impl<const H: usize> Drop for FlatFileWriter<H> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_line;

    fn sample_records(n: u64) -> Vec<Record<20>> {
        (0..n)
            .map(|i| {
                let mut digest = [0u8; 20];
                digest[16..20].copy_from_slice(&(i as u32).to_be_bytes());
                Record::new(digest, i as i32)
            })
            .collect()
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.bin");
        let records = sample_records(500);
        {
            let mut w = FlatFileWriter::<20>::create(&path).unwrap();
            for r in &records {
                w.append(r).unwrap();
            }
        }
        let mut r = FlatFileReader::<20>::open_with_window(&path, 16).unwrap();
        assert_eq!(r.len(), 500);
        for (i, expected) in records.iter().enumerate() {
            assert_eq!(&r.get(i as u64).unwrap(), expected);
        }
    }

    #[test]
    fn random_access_across_window_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.bin");
        let records = sample_records(100);
        {
            let mut w = FlatFileWriter::<20>::create(&path).unwrap();
            for r in &records {
                w.append(r).unwrap();
            }
        }
        let mut r = FlatFileReader::<20>::open_with_window(&path, 8).unwrap();
        for &i in &[99u64, 0, 50, 7, 8, 91] {
            assert_eq!(r.get(i).unwrap(), records[i as usize]);
        }
    }

    #[test]
    fn open_rejects_non_multiple_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        std::fs::write(&path, vec![0u8; 17]).unwrap();
        assert!(matches!(
            FlatFileReader::<20>::open(&path),
            Err(HibpError::FormatError { .. })
        ));
    }

    #[test]
    fn cursor_arithmetic() {
        let mut a = Cursor::new(10);
        a += 5;
        assert_eq!(a.idx, 15);
        a -= 3;
        assert_eq!(a.idx, 12);
        let b = Cursor::new(2);
        assert_eq!(a - b, 10);
    }

    #[test]
    fn parsed_records_round_trip_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.bin");
        let lines = [
            "0000000000000000000000000000000000000010:10",
            "0000000000000000000000000000000000000020:20",
        ];
        {
            let mut w = FlatFileWriter::<20>::create(&path).unwrap();
            for line in lines {
                w.append(&parse_line::<20>(line).unwrap()).unwrap();
            }
        }
        let mut r = FlatFileReader::<20>::open(&path).unwrap();
        assert_eq!(r.get(0).unwrap().format(), lines[0]);
        assert_eq!(r.get(1).unwrap().format(), lines[1]);
    }
}
