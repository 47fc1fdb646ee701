//! Verbosity-gated stderr diagnostics.
//!
//! The source project has no logging framework: it writes directly to
//! `std::cerr` behind a global verbosity level and a mutex so the repainting
//! progress line (`\r`-terminated) never interleaves with diagnostic text
//! from another thread. This is that same shape: one process-wide level, one
//! mutex, no dependency on a logging crate — introducing one here would
//! change the observable console output the spec's progress format depends on.

use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::config::DISPLAY_LEVEL_DEFAULT;

static DISPLAY_LEVEL: AtomicU32 = AtomicU32::new(DISPLAY_LEVEL_DEFAULT as u32);
static STDERR_LOCK: Mutex<()> = Mutex::new(());

/// Sets the process-wide verbosity level (0 = silent ... 4 = debug).
pub fn set_level(level: u32) {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
}

pub fn level() -> u32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

/// Writes `msg` to stderr if the current level is `>= at_level`, serialized
/// against any other diagnostic or progress write.
pub fn log(at_level: u32, msg: &std::fmt::Arguments) {
    if level() < at_level {
        return;
    }
    let _guard = STDERR_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "{msg}");
}

/// Repaints a single status line (no trailing newline, `\r` prefixed) used by
/// the downloader's `--progress` output. Always shown regardless of level,
/// matching the source project's unconditional progress line.
pub fn progress(line: &str) {
    let _guard = STDERR_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "\r{line}");
    let _ = stderr.flush();
}

/// Finishes a progress display with a trailing newline so later log lines
/// don't overwrite it.
pub fn progress_done() {
    let _guard = STDERR_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr);
}

#[macro_export]
macro_rules! displaylevel {
    ($level:expr, $($arg:tt)*) => {
        $crate::logger::log($level, &format_args!($($arg)*))
    };
}
