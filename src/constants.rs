//! Crate-wide constants for defaults and I/O caps.

/// Upper bound accepted for `line_max_length`.
pub const MAX_LINE_LEN: usize = 64 * 1024; // 64 KiB

pub const DEFAULT_LINE_LEN: usize = 500;

pub const DEFAULT_TAIL_LINES: usize = 20;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Chunk size used when scanning backward for the last newline.
pub const BACKSCAN_CHUNK: usize = 8 * 1024;

/// Env var holding the tracing filter directives.
pub const LOG_ENV: &str = "LOGVIEW_LOG";

/// Status for every way the process ends: errors, interrupt, help output.
pub const EXIT_FAILURE: i32 = 1;
