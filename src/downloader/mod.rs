//! Concurrent downloader (C3): fetches all shards in `[start, limit)` and
//! writes them to the corpus in strict ascending order.
//!
//! Grounded on `src/dnl/queuemgt.cpp` / `src/dnl/requests.cpp`: the source
//! project runs a single-threaded libcurl multi handle driving up to
//! `P_max` in-flight requests and a writer that only drains the
//! lowest-indexed completed shard. Here a bounded pool of OS threads issues
//! blocking requests instead of a hand-rolled event loop (see SPEC_FULL.md
//! §4.3.1 / DESIGN.md); HTTP/2 multiplexing still happens transparently
//! since every thread shares one `reqwest::blocking::Client` connection
//! pool. The reordering writer below plays the same role as the source
//! project's priority queue regardless of which concurrency model feeds it.

pub(crate) mod fetch;
mod writer;

use std::collections::BinaryHeap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;

use crate::config::{self, LOW_SPEED_LIMIT_BYTES, LOW_SPEED_TIME, MAX_RETRIES, P_MAX_DEFAULT};
use crate::error::{HibpError, HibpResult};
use crate::logger;
use crate::record::{HashKind, Record};
use crate::store::FlatFileWriter;

use writer::Download;

pub use fetch::sync_get;

pub struct DownloaderConfig {
    pub kind: HashKind,
    pub p_max: usize,
    pub max_retries: u32,
    pub low_speed_limit: u64,
    pub low_speed_time: Duration,
    pub base_url: String,
    /// When set, shard bodies are read from `<dir>/<PREFIX_HEX>` instead of
    /// making HTTP requests, for deterministic tests.
    pub test_fixture_dir: Option<PathBuf>,
}

impl DownloaderConfig {
    pub fn new(kind: HashKind) -> Self {
        Self {
            kind,
            p_max: P_MAX_DEFAULT,
            max_retries: MAX_RETRIES,
            low_speed_limit: LOW_SPEED_LIMIT_BYTES,
            low_speed_time: LOW_SPEED_TIME,
            base_url: kind.upstream_base().to_string(),
            test_fixture_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadStats {
    pub shards_written: u32,
    pub records_written: u64,
}

pub struct Downloader {
    config: DownloaderConfig,
    client: reqwest::blocking::Client,
}

impl Downloader {
    pub fn new(config: DownloaderConfig) -> HibpResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HibpError::Transport {
                prefix: 0,
                reason: e.to_string(),
            })?;
        Ok(Self { config, client })
    }

    /// Downloads shards `[start, limit)`, appending records to `writer` in
    /// strictly ascending shard order regardless of completion order.
    pub fn run<const H: usize>(
        &self,
        start: u32,
        limit: u32,
        writer: &mut FlatFileWriter<H>,
        show_progress: bool,
    ) -> HibpResult<DownloadStats>
    where
        Record<H>: Send,
    {
        let (tx, rx) = unbounded::<HibpResult<Download<H>>>();
        let stop = AtomicBool::new(false);
        let next_index = AtomicU32::new(start);
        let p_max = self.config.p_max.max(1);

        let result: HibpResult<DownloadStats> = std::thread::scope(|scope| {
            for _ in 0..p_max {
                let tx = tx.clone();
                let stop = &stop;
                let next_index = &next_index;
                let client = &self.client;
                let cfg = &self.config;
                scope.spawn(move || loop {
                    if stop.load(AtomicOrdering::Relaxed) {
                        break;
                    }
                    let idx = next_index.fetch_add(1, AtomicOrdering::SeqCst);
                    if idx >= limit {
                        break;
                    }
                    let outcome = fetch::fetch_shard(
                        client,
                        &cfg.base_url,
                        idx,
                        cfg.max_retries,
                        cfg.low_speed_limit,
                        cfg.low_speed_time,
                        cfg.test_fixture_dir.as_deref(),
                    )
                    .and_then(|body| fetch::parse_shard_body::<H>(idx, &body))
                    .map(|records| Download {
                        prefix: idx,
                        records,
                    });
                    let failed = outcome.is_err();
                    if tx.send(outcome).is_err() {
                        break;
                    }
                    if failed {
                        stop.store(true, AtomicOrdering::Relaxed);
                        break;
                    }
                });
            }
            drop(tx);

            let mut heap: BinaryHeap<std::cmp::Reverse<Download<H>>> = BinaryHeap::new();
            let mut next_expected = start;
            let mut stats = DownloadStats::default();
            let started_at = Instant::now();
            let mut fatal: Option<HibpError> = None;

            while let Ok(msg) = rx.recv() {
                match msg {
                    Err(e) => {
                        fatal = Some(e);
                        stop.store(true, AtomicOrdering::Relaxed);
                        break;
                    }
                    Ok(dl) => {
                        heap.push(std::cmp::Reverse(dl));
                        while let Some(std::cmp::Reverse(top)) = heap.peek() {
                            if top.prefix != next_expected {
                                break;
                            }
                            let std::cmp::Reverse(dl) = heap.pop().unwrap();
                            for rec in &dl.records {
                                writer.append(rec)?;
                            }
                            stats.shards_written += 1;
                            stats.records_written += dl.records.len() as u64;
                            next_expected += 1;
                            if show_progress {
                                let elapsed = started_at.elapsed().as_secs_f64().max(1e-9);
                                let bytes_written =
                                    stats.records_written * Record::<H>::SIZE as u64;
                                let mib_per_sec =
                                    bytes_written as f64 / (1024.0 * 1024.0) / elapsed;
                                let total = (limit - start).max(1);
                                let done = next_expected - start;
                                let pct = done as f64 * 100.0 / total as f64;
                                logger::progress(&format!(
                                    "{next_expected:05X}/{limit:05X} shards, {} records, \
                                     {mib_per_sec:.2} MiB/s, {pct:.1}%, queue={}, {elapsed:.1}s",
                                    stats.records_written,
                                    heap.len()
                                ));
                            }
                        }
                    }
                }
            }

            writer.flush()?;
            if show_progress {
                logger::progress_done();
            }
            match fatal {
                Some(e) => Err(e),
                None => Ok(stats),
            }
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_line;

    fn write_fixture(dir: &std::path::Path, prefix_hex: &str, lines: &[&str]) {
        std::fs::write(dir.join(prefix_hex), lines.join("\n") + "\n").unwrap();
    }

    #[test]
    fn downloads_and_writes_in_ascending_shard_order() {
        let fixtures = tempfile::tempdir().unwrap();
        write_fixture(fixtures.path(), "00000", &["AAAA0000001:1"]);
        write_fixture(fixtures.path(), "00001", &["BBBB0000002:2"]);
        write_fixture(fixtures.path(), "00002", &["CCCC0000003:3"]);

        let mut config = DownloaderConfig::new(HashKind::Sha1T64);
        config.p_max = 4;
        config.test_fixture_dir = Some(fixtures.path().to_path_buf());
        let downloader = Downloader::new(config).unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("corpus.bin");
        let mut writer = FlatFileWriter::<8>::create(&out_path).unwrap();
        let stats = downloader.run::<8>(0, 3, &mut writer, false).unwrap();
        drop(writer);

        assert_eq!(stats.shards_written, 3);
        assert_eq!(stats.records_written, 3);

        let mut reader = crate::store::FlatFileReader::<8>::open(&out_path).unwrap();
        assert_eq!(reader.len(), 3);
        // strict ascending order across shard boundaries
        let r0 = reader.get(0).unwrap();
        let r1 = reader.get(1).unwrap();
        let r2 = reader.get(2).unwrap();
        assert!(r0.prefix(20) < r1.prefix(20));
        assert!(r1.prefix(20) < r2.prefix(20));
        let _ = parse_line::<8>("AAAA000000000000:1");
    }

    #[test]
    fn missing_fixture_surfaces_as_error() {
        let fixtures = tempfile::tempdir().unwrap();
        write_fixture(fixtures.path(), "00000", &["AAAA:1"]);
        // 00001 intentionally missing

        let mut config = DownloaderConfig::new(HashKind::Sha1T64);
        config.p_max = 2;
        config.max_retries = 1;
        config.test_fixture_dir = Some(fixtures.path().to_path_buf());
        let downloader = Downloader::new(config).unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("corpus.bin");
        let mut writer = FlatFileWriter::<8>::create(&out_path).unwrap();
        let result = downloader.run::<8>(0, 2, &mut writer, false);
        assert!(result.is_err());
    }
}
