//! Converts between the corpus's binary flat-file format and a plain text
//! `HASH:COUNT`-per-line format. Grounded on `app/hibp_convert.cpp`.

use std::io::{BufRead, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;

use hibp::record::{parse_line, HashKind};
use hibp::store::{FlatFileReader, FlatFileWriter};

#[derive(Parser)]
#[command(about = "Convert a HIBP corpus between binary and text formats")]
struct Args {
    #[arg(long, value_enum, default_value_t = HashKind::Sha1)]
    kind: HashKind,

    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    output: PathBuf,

    /// Convert binary -> text instead of text -> binary.
    #[arg(long, default_value_t = false)]
    to_text: bool,
}

fn text_to_binary<const H: usize>(args: &Args) -> anyhow::Result<()> {
    let input = std::fs::File::open(&args.input)?;
    let reader = std::io::BufReader::new(input);
    let mut writer = FlatFileWriter::<H>::create(&args.output)?;
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        writer.append(&parse_line::<H>(&line)?)?;
    }
    writer.flush()?;
    Ok(())
}

fn binary_to_text<const H: usize>(args: &Args) -> anyhow::Result<()> {
    let mut reader = FlatFileReader::<H>::open(&args.input)?;
    let output = std::fs::File::create(&args.output)?;
    let mut writer = BufWriter::new(output);
    for i in 0..reader.len() {
        let rec = reader.get(i)?;
        writeln!(writer, "{}", rec.format())?;
    }
    writer.flush()?;
    Ok(())
}

fn run<const H: usize>(args: &Args) -> anyhow::Result<()> {
    if args.to_text {
        binary_to_text::<H>(args)
    } else {
        text_to_binary::<H>(args)
    }
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
