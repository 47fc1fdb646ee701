//! Queries a sharded binary fuse filter for plaintext passwords without
//! needing the full corpus in memory. Grounded on `app/hibp_query_filter.cpp`.

use std::io::{stdin, BufRead};
use std::path::PathBuf;

use clap::Parser;

use hibp::filter::ShardedFilterFile;
use hibp::record::hashing::{digest_to_u64, ntlm_of, sha1_of, sha1t64_of};
use hibp::record::{digest_prefix, HashKind};

#[derive(Parser)]
#[command(about = "Query a sharded HIBP filter for plaintext passwords")]
struct Args {
    #[arg(long, value_enum, default_value_t = HashKind::Sha1)]
    kind: HashKind,

    #[arg(long)]
    filter: PathBuf,

    /// Plaintexts to query; if omitted, reads one per line from stdin.
    plaintexts: Vec<String>,
}

fn digest_for(kind: HashKind, plaintext: &str) -> Vec<u8> {
    match kind {
        HashKind::Sha1 => sha1_of(plaintext).to_vec(),
        HashKind::Ntlm => ntlm_of(plaintext).to_vec(),
        HashKind::Sha1T64 => sha1t64_of(plaintext).to_vec(),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let filter = ShardedFilterFile::open(&args.filter)?;

    let lines: Vec<String> = if args.plaintexts.is_empty() {
        stdin().lock().lines().collect::<Result<_, _>>()?
    } else {
        args.plaintexts.clone()
    };

    let mut had_error = false;
    for plaintext in lines {
        let digest = digest_for(args.kind, &plaintext);
        let shard = digest_prefix(&digest, filter.shard_bits());
        let key = digest_to_u64(&digest);
        match filter.contains(shard, key) {
            Ok(true) => println!("{plaintext}: possibly pwned"),
            Ok(false) => println!("{plaintext}: not found"),
            Err(e) => {
                eprintln!("Error: {e}");
                had_error = true;
            }
        }
    }
    if had_error {
        anyhow::bail!("one or more queries failed");
    }
    Ok(())
}
