//! Downloads a range of shards into a flat-file corpus, optionally resuming
//! a previous interrupted run. Grounded on `app/hibp_download.cpp`.

use std::path::PathBuf;

use clap::Parser;

use hibp::downloader::{Downloader, DownloaderConfig};
use hibp::record::{HashKind, Record};
use hibp::resume::resume_prefix;
use hibp::store::FlatFileWriter;

#[derive(Parser)]
#[command(about = "Download a HIBP password-hash corpus")]
struct Args {
    #[arg(long, value_enum, default_value_t = HashKind::Sha1)]
    kind: HashKind,

    /// First shard prefix to fetch (hex, e.g. 0 for the start).
    #[arg(long, default_value_t = 0)]
    start: u32,

    /// One past the last shard prefix to fetch; defaults to the full 2^20 range.
    #[arg(long, default_value_t = 1 << 20)]
    limit: u32,

    #[arg(long)]
    out: PathBuf,

    /// Resume an interrupted download already present at `out`.
    #[arg(long, default_value_t = false)]
    resume: bool,

    #[arg(long, default_value_t = hibp::config::P_MAX_DEFAULT)]
    p_max: usize,

    #[arg(long, default_value_t = false)]
    no_progress: bool,

    #[arg(long, default_value_t = hibp::config::DISPLAY_LEVEL_DEFAULT)]
    verbosity: u32,
}

fn run<const H: usize>(args: &Args) -> anyhow::Result<()>
where
    Record<H>: Send,
{
    let mut config = DownloaderConfig::new(args.kind);
    config.p_max = args.p_max;

    let downloader = Downloader::new(config)?;

    let (mut writer, start) = if args.resume && args.out.exists() {
        let client = reqwest::blocking::Client::new();
        let resume_start =
            resume_prefix::<H>(&args.out, &client, args.kind.upstream_base())?;
        (FlatFileWriter::<H>::append_to(&args.out)?, resume_start)
    } else {
        (FlatFileWriter::<H>::create(&args.out)?, args.start)
    };

    let stats = downloader.run::<H>(start, args.limit, &mut writer, !args.no_progress)?;
    eprintln!(
        "downloaded {} shards, {} records",
        stats.shards_written, stats.records_written
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    hibp::logger::set_level(args.verbosity);

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
