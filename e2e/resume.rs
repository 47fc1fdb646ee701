//! End-to-end: resume logic against a minimal one-shot HTTP server (no mock
//! framework in the dependency stack, so this spins up a real
//! `std::net::TcpListener` for the single shard a resume needs to re-fetch).

use std::io::{Read, Write};
use std::net::TcpListener;

use hibp::record::parse_line;
use hibp::resume::resume_prefix;
use hibp::store::FlatFileWriter;

fn serve_once(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}")
}

#[test]
fn empty_corpus_resumes_from_prefix_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.bin");
    std::fs::write(&path, []).unwrap();
    let client = reqwest::blocking::Client::new();
    let prefix = resume_prefix::<20>(&path, &client, "http://unused.invalid").unwrap();
    assert_eq!(prefix, 0);
}

#[test]
fn completed_last_shard_resumes_one_past_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.bin");
    {
        let mut w = FlatFileWriter::<20>::create(&path).unwrap();
        w.append(&parse_line::<20>("0000000000000000000000000000000000000010:10").unwrap())
            .unwrap();
    }

    let base_url = serve_once("0000000000000000000000000000000000000010:10\n");
    let client = reqwest::blocking::Client::new();
    let prefix = resume_prefix::<20>(&path, &client, &base_url).unwrap();
    assert_eq!(prefix, 1);
}

#[test]
fn mismatched_last_shard_truncates_and_redownloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.bin");
    {
        let mut w = FlatFileWriter::<20>::create(&path).unwrap();
        // a record in a different, already-complete shard (nonzero prefix)
        w.append(&parse_line::<20>("1000000000000000000000000000000000000010:10").unwrap())
            .unwrap();
        // partial shard: only the first line of a two-line shard made it to disk
        w.append(&parse_line::<20>("0000000000000000000000000000000000000011:11").unwrap())
            .unwrap();
    }

    // upstream's shard 0 actually has a second, different line
    let base_url = serve_once(
        "0000000000000000000000000000000000000011:11\n0000000000000000000000000000000000000012:12\n",
    );
    let client = reqwest::blocking::Client::new();
    let prefix = resume_prefix::<20>(&path, &client, &base_url).unwrap();
    assert_eq!(prefix, 0);

    let mut reader = hibp::store::FlatFileReader::<20>::open(&path).unwrap();
    assert_eq!(reader.len(), 1);
}
