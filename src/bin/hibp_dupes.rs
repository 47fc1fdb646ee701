//! Scans a sorted corpus for duplicate adjacent hashes (a sign of an
//! unmerged concatenation) and optionally writes a deduplicated copy with
//! counts summed. Grounded on `app/hibp_dupes.cpp`.

use std::path::PathBuf;

use clap::Parser;

use hibp::record::HashKind;
use hibp::store::{FlatFileReader, FlatFileWriter};

#[derive(Parser)]
#[command(about = "Find (and optionally merge) duplicate hashes in a sorted corpus")]
struct Args {
    #[arg(long, value_enum, default_value_t = HashKind::Sha1)]
    kind: HashKind,

    #[arg(long)]
    input: PathBuf,

    /// If set, writes a deduplicated corpus here (counts of duplicates summed).
    #[arg(long)]
    output: Option<PathBuf>,
}

fn run<const H: usize>(args: &Args) -> anyhow::Result<()> {
    let mut reader = FlatFileReader::<H>::open(&args.input)?;
    let mut writer = match &args.output {
        Some(path) => Some(FlatFileWriter::<H>::create(path)?),
        None => None,
    };

    let mut dupes = 0u64;
    if reader.len() == 0 {
        return Ok(());
    }
    let mut current = reader.get(0)?;
    for i in 1..reader.len() {
        let next = reader.get(i)?;
        if next.hash_eq(&current) {
            dupes += 1;
            println!("duplicate: {}", next.format());
            current.count += next.count;
        } else {
            if let Some(w) = writer.as_mut() {
                w.append(&current)?;
            }
            current = next;
        }
    }
    if let Some(w) = writer.as_mut() {
        w.append(&current)?;
        w.flush()?;
    }
    eprintln!("{dupes} duplicate hash(es) found");
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
