//! Merges two or more sorted corpora of the same hash kind into one sorted
//! corpus, summing counts where a hash appears in more than one input.
//! Grounded on the adjacent-equal merge pattern in `src/diffutils.cpp`,
//! generalised from a two-way lockstep walk to a k-way heap merge.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::PathBuf;

use clap::Parser;

use hibp::record::{HashKind, Record};
use hibp::store::{FlatFileReader, FlatFileWriter};

#[derive(Parser)]
#[command(about = "Merge multiple sorted HIBP corpora, summing shared counts")]
struct Args {
    #[arg(long, value_enum, default_value_t = HashKind::Sha1)]
    kind: HashKind,

    #[arg(long, required = true, num_args = 2..)]
    inputs: Vec<PathBuf>,

    #[arg(long)]
    output: PathBuf,
}

struct Candidate<const H: usize> {
    rec: Record<H>,
    source: usize,
}

impl<const H: usize> PartialEq for Candidate<H> {
    fn eq(&self, other: &Self) -> bool {
        self.rec.digest == other.rec.digest
    }
}
impl<const H: usize> Eq for Candidate<H> {}
impl<const H: usize> PartialOrd for Candidate<H> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<const H: usize> Ord for Candidate<H> {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed: BinaryHeap is a max-heap, we want the smallest hash first
        other.rec.cmp(&self.rec)
    }
}

fn run<const H: usize>(args: &Args) -> anyhow::Result<()> {
    let mut readers: Vec<FlatFileReader<H>> = args
        .inputs
        .iter()
        .map(FlatFileReader::<H>::open)
        .collect::<Result<_, _>>()?;
    let mut cursors = vec![0u64; readers.len()];

    let mut heap: BinaryHeap<Candidate<H>> = BinaryHeap::new();
    for (source, reader) in readers.iter_mut().enumerate() {
        if reader.len() > 0 {
            heap.push(Candidate {
                rec: reader.get(0)?,
                source,
            });
            cursors[source] = 1;
        }
    }

    let mut writer = FlatFileWriter::<H>::create(&args.output)?;
    while let Some(Candidate { rec, source }) = heap.pop() {
        let mut merged = rec;
        while let Some(top) = heap.peek() {
            if top.rec.hash_eq(&merged) {
                let Candidate { rec: dup, source: dup_source } = heap.pop().unwrap();
                merged.count += dup.count;
                let cursor = cursors[dup_source];
                if cursor < readers[dup_source].len() {
                    heap.push(Candidate {
                        rec: readers[dup_source].get(cursor)?,
                        source: dup_source,
                    });
                    cursors[dup_source] += 1;
                }
            } else {
                break;
            }
        }
        writer.append(&merged)?;

        let cursor = cursors[source];
        if cursor < readers[source].len() {
            heap.push(Candidate {
                rec: readers[source].get(cursor)?,
                source,
            });
            cursors[source] += 1;
        }
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
