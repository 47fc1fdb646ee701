//! HTTP fetch, low-speed-abort, and shard-body parsing for one prefix.
//! Grounded on `src/dnl/requests.cpp` (retry policy, low-speed timeout) and
//! `src/dnl/queuemgt.cpp::write_lines` (line splitting).

use std::io::Read as _;
use std::time::{Duration, Instant};

use crate::config::REQUEST_TIMEOUT;
use crate::error::{HibpError, HibpResult};
use crate::record::{parse_line, Record};

/// Width, in hex characters, of the upstream shard prefix (top 20 bits, for
/// all three digest kinds).
pub const PREFIX_HEX_WIDTH: usize = 5;

/// Width, in bits, of the upstream shard prefix.
pub const PREFIX_BITS: u8 = 20;

/// A single synchronous GET, used both by the downloader's worker threads
/// and by the resume logic's one-off shard fetch (`curl_sync_get`).
pub fn sync_get(client: &reqwest::blocking::Client, url: &str) -> HibpResult<String> {
    let resp = client
        .get(url)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .map_err(|e| HibpError::Transport {
            prefix: 0,
            reason: e.to_string(),
        })?;
    if !resp.status().is_success() {
        return Err(HibpError::Transport {
            prefix: 0,
            reason: format!("HTTP status {}", resp.status()),
        });
    }
    resp.text().map_err(|e| HibpError::Transport {
        prefix: 0,
        reason: e.to_string(),
    })
}

/// Reads a response body while enforcing the minimum-throughput timeout: if
/// fewer than `low_speed_limit` bytes arrive within any `low_speed_time`
/// window, the download is considered stalled and treated as a retryable
/// failure.
fn read_with_low_speed_guard(
    mut resp: reqwest::blocking::Response,
    prefix: u32,
    low_speed_limit: u64,
    low_speed_time: Duration,
) -> HibpResult<String> {
    let mut body = Vec::new();
    let mut buf = [0u8; 8192];
    let mut window_start = Instant::now();
    let mut bytes_in_window = 0u64;
    loop {
        let n = resp.read(&mut buf).map_err(|e| HibpError::Transport {
            prefix,
            reason: e.to_string(),
        })?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
        bytes_in_window += n as u64;
        if window_start.elapsed() >= low_speed_time {
            if bytes_in_window < low_speed_limit {
                return Err(HibpError::Transport {
                    prefix,
                    reason: format!(
                        "throughput below {low_speed_limit} B / {low_speed_time:?}"
                    ),
                });
            }
            window_start = Instant::now();
            bytes_in_window = 0;
        }
    }
    String::from_utf8(body).map_err(|e| HibpError::Transport {
        prefix,
        reason: e.to_string(),
    })
}

/// Fetches the shard for `prefix`, retrying up to `max_retries` times on
/// transport error, non-2xx, or a stalled transfer. In test mode, reads a
/// fixture file instead of issuing HTTP.
#[allow(clippy::too_many_arguments)]
pub fn fetch_shard(
    client: &reqwest::blocking::Client,
    base_url: &str,
    prefix: u32,
    max_retries: u32,
    low_speed_limit: u64,
    low_speed_time: Duration,
    test_fixture_dir: Option<&std::path::Path>,
) -> HibpResult<String> {
    let prefix_hex = format!("{prefix:0width$X}", width = PREFIX_HEX_WIDTH);

    if let Some(dir) = test_fixture_dir {
        let path = dir.join(&prefix_hex);
        return std::fs::read_to_string(&path).map_err(|e| HibpError::io(&path, e));
    }

    let url = format!("{base_url}/{prefix_hex}");
    for _attempt in 0..max_retries {
        let outcome = client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .map_err(|e| HibpError::Transport {
                prefix,
                reason: e.to_string(),
            })
            .and_then(|resp| {
                if resp.status().is_success() {
                    Ok(resp)
                } else {
                    Err(HibpError::Transport {
                        prefix,
                        reason: format!("HTTP status {}", resp.status()),
                    })
                }
            })
            .and_then(|resp| {
                read_with_low_speed_guard(resp, prefix, low_speed_limit, low_speed_time)
            });
        if let Ok(body) = outcome {
            return Ok(body);
        }
    }
    Err(HibpError::RetryExhausted {
        prefix,
        attempts: max_retries,
    })
}

/// Splits a shard body into records: LF-separated lines, trailing CR
/// stripped, empty lines ignored, each prefixed with the shard's hex prefix
/// before being parsed.
pub fn parse_shard_body<const H: usize>(prefix: u32, body: &str) -> HibpResult<Vec<Record<H>>> {
    let prefix_hex = format!("{prefix:0width$X}", width = PREFIX_HEX_WIDTH);
    body.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.is_empty())
        .map(|l| parse_line::<H>(&format!("{prefix_hex}{l}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_crlf_and_lf_bodies() {
        let body = "0010:10\r\n0020:20\n\n0030:30\r\n";
        let records = parse_shard_body::<20>(0x00000, body).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].count, 10);
        assert_eq!(records[2].count, 30);
    }

    #[test]
    fn fixture_mode_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("00000"), "ABCD:1\n").unwrap();
        let client = reqwest::blocking::Client::new();
        let body = fetch_shard(
            &client,
            "unused",
            0,
            5,
            1000,
            Duration::from_secs(5),
            Some(dir.path()),
        )
        .unwrap();
        assert_eq!(body, "ABCD:1\n");
    }
}
