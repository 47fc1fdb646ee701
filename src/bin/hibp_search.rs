//! Looks up plaintext passwords in a corpus, reporting each one's breach
//! count (or "not found"). Grounded on `app/hibp_search.cpp`.

use std::io::{stdin, BufRead};
use std::path::PathBuf;

use clap::Parser;

use hibp::record::hashing::{ntlm_of, sha1_of, sha1t64_of};
use hibp::record::{HashKind, Record};
use hibp::store::FlatFileReader;
use hibp::toc::Toc;

#[derive(Parser)]
#[command(about = "Look up plaintext passwords in a HIBP corpus")]
struct Args {
    #[arg(long, value_enum, default_value_t = HashKind::Sha1)]
    kind: HashKind,

    #[arg(long)]
    corpus: PathBuf,

    #[arg(long, default_value_t = hibp::config::TOC_BITS_DEFAULT)]
    toc_bits: u8,

    /// Plaintexts to search for; if omitted, reads one per line from stdin.
    plaintexts: Vec<String>,
}

fn digest_for<const H: usize>(kind: HashKind, plaintext: &str) -> Record<H> {
    let digest: Vec<u8> = match kind {
        HashKind::Sha1 => sha1_of(plaintext).to_vec(),
        HashKind::Ntlm => ntlm_of(plaintext).to_vec(),
        HashKind::Sha1T64 => sha1t64_of(plaintext).to_vec(),
    };
    let mut arr = [0u8; 32];
    arr[..digest.len()].copy_from_slice(&digest);
    Record::new(arr[..H].try_into().unwrap(), hibp::record::NOT_PRESENT)
}

fn run<const H: usize>(args: &Args) -> anyhow::Result<()> {
    let mut reader = FlatFileReader::<H>::open(&args.corpus)?;
    let toc = Toc::load_or_build(&args.corpus, args.toc_bits, &mut reader)?;

    let lines: Vec<String> = if args.plaintexts.is_empty() {
        stdin().lock().lines().collect::<Result<_, _>>()?
    } else {
        args.plaintexts.clone()
    };

    for plaintext in lines {
        let needle = digest_for::<H>(args.kind, &plaintext);
        match toc.search(&mut reader, &needle)? {
            Some(idx) => {
                let rec = reader.get(idx)?;
                println!("{plaintext}: pwned, count={}", rec.count);
            }
            None => println!("{plaintext}: not found"),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let result = match args.kind {
        HashKind::Sha1 => run::<20>(&args),
        HashKind::Ntlm => run::<16>(&args),
        HashKind::Sha1T64 => run::<8>(&args),
    };
    if let Err(e) = &result {
        eprintln!("Error: {e}");
    }
    result
}
