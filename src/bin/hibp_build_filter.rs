//! Builds a sharded binary fuse filter file over a corpus, one filter per
//! `2^shard_bits`-th slice of the hash space. Grounded on
//! `app/hibp_build_filter.cpp`; since the corpus is sorted, each shard's
//! keys are a single contiguous run, found in one linear scan.

use std::path::PathBuf;

use clap::Parser;

use hibp::filter::{estimate_fpr, ShardFilter, ShardedFilterWriter};
use hibp::record::hashing::digest_to_u64;
use hibp::record::HashKind;
use hibp::store::FlatFileReader;

#[derive(Parser)]
#[command(about = "Build a sharded binary fuse filter over a HIBP corpus")]
struct Args {
    #[arg(long, value_enum, default_value_t = HashKind::Sha1)]
    kind: HashKind,

    #[arg(long)]
    corpus: PathBuf,

    #[arg(long)]
    output: PathBuf,

    #[arg(long, default_value_t = hibp::config::SHARD_BITS_DEFAULT)]
    shard_bits: u8,

    /// If set, estimates and prints each shard's false-positive rate.
    #[arg(long, default_value_t = false)]
    estimate_fpr: bool,
}

fn run<const H: usize>(args: &Args) -> anyhow::Result<()> {
    let mut reader = FlatFileReader::<H>::open(&args.corpus)?;
    let mut writer = ShardedFilterWriter::create(&args.output, args.shard_bits)?;
    let num_shards = 1u32 << args.shard_bits;

    let n = reader.len();
    let mut pos: u64 = 0;
    for shard in 0..num_shards {
        let mut keys = Vec::new();
        while pos < n {
            let rec = reader.get(pos)?;
            if rec.prefix(args.shard_bits) != shard {
                break;
            }
            keys.push(digest_to_u64(&rec.digest));
            pos += 1;
        }
        if keys.is_empty() {
            writer.skip_shard(shard)?;
            continue;
        }
        let filter = ShardFilter::build(shard, &keys)?
            .expect("non-empty key set always builds a filter");
        if args.estimate_fpr {
            let fpr = estimate_fpr(&filter, &keys, hibp::config::FPR_SAMPLE_SIZE.min(100_000));
            eprintln!("shard {shard:#x}: {} keys, fpr~{fpr:.5}", keys.len());
        }
        writer.add_shard(shard, &filter.to_bytes()?)?;
    }
    writer.finish()?;
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
