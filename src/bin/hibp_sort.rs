//! Sorts a corpus by hash ascending. Intended for maintenance on a corpus
//! that arrived out of order (e.g. a raw concatenation of shard files).
//! Grounded on `app/hibp_sort.cpp`; the in-memory sort pass is parallelised
//! with `rayon`, matching the same "in-memory passes may parallelise, disk
//! passes stay sequential" rule the top-N tool follows.

use std::path::PathBuf;

use clap::Parser;
use rayon::prelude::*;

use hibp::record::HashKind;
use hibp::store::{FlatFileReader, FlatFileWriter};

#[derive(Parser)]
#[command(about = "Sort a HIBP corpus by hash")]
struct Args {
    #[arg(long, value_enum, default_value_t = HashKind::Sha1)]
    kind: HashKind,

    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    output: PathBuf,
}

fn run<const H: usize>(args: &Args) -> anyhow::Result<()>
where
    hibp::Record<H>: Send,
{
    let mut reader = FlatFileReader::<H>::open(&args.input)?;
    let mut records = Vec::with_capacity(reader.len() as usize);
    for i in 0..reader.len() {
        records.push(reader.get(i)?);
    }
    records.par_sort_unstable_by(|a, b| a.cmp(b));

    let mut writer = FlatFileWriter::<H>::create(&args.output)?;
    for rec in &records {
        writer.append(rec)?;
    }
    writer.flush()?;
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
