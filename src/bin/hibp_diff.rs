//! CLI wrapper around [`hibp::diff::diff`]. Grounded on `app/hibp_diff.cpp`.

use std::fs::File;
use std::io::{stdout, BufWriter};
use std::path::PathBuf;

use clap::Parser;

use hibp::diff::diff;
use hibp::record::HashKind;
use hibp::store::FlatFileReader;

#[derive(Parser)]
#[command(about = "Produce an insert/update edit script between two sorted corpora")]
struct Args {
    #[arg(long, value_enum, default_value_t = HashKind::Sha1)]
    kind: HashKind,

    #[arg(long)]
    old: PathBuf,

    #[arg(long)]
    new: PathBuf,

    /// Write the edit script here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn run<const H: usize>(args: &Args) -> anyhow::Result<()> {
    let mut old = FlatFileReader::<H>::open(&args.old)?;
    let mut new = FlatFileReader::<H>::open(&args.new)?;
    match &args.output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            diff(&mut old, &mut new, &mut out)?;
        }
        None => {
            let mut out = stdout().lock();
            diff(&mut old, &mut new, &mut out)?;
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
