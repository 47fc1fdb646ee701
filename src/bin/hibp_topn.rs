//! CLI wrapper around [`hibp::topn::top_n`]. Grounded on `app/hibp_topn.cpp`.

use std::path::PathBuf;

use clap::Parser;

use hibp::record::HashKind;
use hibp::store::{FlatFileReader, FlatFileWriter};
use hibp::topn::top_n;

#[derive(Parser)]
#[command(about = "Extract the N most-seen hashes from a corpus")]
struct Args {
    #[arg(long, value_enum, default_value_t = HashKind::Sha1)]
    kind: HashKind,

    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    output: PathBuf,

    #[arg(long, default_value_t = hibp::config::TOPN_DEFAULT)]
    n: usize,
}

fn run<const H: usize>(args: &Args) -> anyhow::Result<()>
where
    hibp::Record<H>: Send,
{
    let mut reader = FlatFileReader::<H>::open(&args.input)?;
    let top = top_n(&mut reader, args.n)?;
    let mut writer = FlatFileWriter::<H>::create(&args.output)?;
    for rec in &top {
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
