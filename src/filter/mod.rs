//! Membership filters (C8/C9): build and query a compact probabilistic
//! index over a corpus so a caller can check "is this hash pwned?" without
//! holding the whole corpus in memory.

pub mod binary_fuse;
pub mod sharded;

pub use binary_fuse::{estimate_fpr, ShardFilter};
pub use sharded::{ShardedFilterFile, ShardedFilterWriter};
