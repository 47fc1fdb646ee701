//! Library error type. Each variant is one of the error *kinds* named in the
//! spec's error handling section, carrying whatever context lets a caller
//! produce the `Error: <message>` line the CLI surface prints.

use std::path::PathBuf;

use thiserror::Error;

pub type HibpResult<T> = Result<T, HibpError>;

#[derive(Debug, Error)]
pub enum HibpError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: size {size} is not a multiple of the record size {record_size}")]
    FormatError {
        path: PathBuf,
        size: u64,
        record_size: usize,
    },

    #[error("malformed record line {line:?}: {reason}")]
    MalformedRecord { line: String, reason: String },

    #[error(
        "resume impossible for {path} at shard {prefix:05X}: not found in corpus. \
         try rerunning without --resume"
    )]
    ResumeImpossible { path: PathBuf, prefix: u32 },

    #[error("transport error fetching shard {prefix:05X}: {reason}")]
    Transport { prefix: u32, reason: String },

    #[error("retries exhausted for shard {prefix:05X} after {attempts} attempts")]
    RetryExhausted { prefix: u32, attempts: u32 },

    #[error("shard order violation: expected prefix {expected}, got {got}")]
    ShardOrder { expected: u32, got: u32 },

    #[error("shard {prefix} already populated")]
    ShardDuplicate { prefix: u32 },

    #[error("no filter shard for prefix {prefix}")]
    MissingShard { prefix: u32 },

    #[error("table of contents has no record for prefix {prefix:#x} ({bits}-bit)")]
    ToCMissingPrefix { prefix: u32, bits: u8 },

    #[error("input has only {len} records, which is not more than N={n}")]
    InputTooSmall { len: usize, n: usize },

    #[error("{context}: deletions are not permitted (OLD entry has no counterpart in NEW)")]
    IllegalDeletion { context: String },

    #[error("corrupt sharded filter file {path}: {reason}")]
    CorruptFilterFile { path: PathBuf, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("failed to build filter for shard {prefix}: {reason}")]
    FilterBuild { prefix: u32, reason: String },
}

impl HibpError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HibpError::Io {
            path: path.into(),
            source,
        }
    }
}
