//! A local mirror of the HIBP compromised-password-hash corpus: download,
//! store, index, diff, and query large sorted flat files of password hash
//! digests and their breach counts.

pub mod config;
pub mod diff;
pub mod downloader;
pub mod error;
pub mod filter;
#[macro_use]
pub mod logger;
pub mod record;
pub mod resume;
pub mod store;
pub mod toc;
pub mod topn;

pub use error::{HibpError, HibpResult};
pub use record::{HashKind, Record};
