//! Constants for the download module (attempt bounds, probe timeout, ledger name).

use std::time::Duration;

/// Maximum invocations of the tool for a single URL.
pub const MAX_ATTEMPTS: u32 = 3;

/// Ledger file the tool maintains in the staging directory via `--download-archive`.
pub const ARCHIVE_FILE_NAME: &str = "downloaded_videos.txt";

/// Timeout for the link liveness probe.
pub const LINK_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Hosts accepted by URL validation.
pub const RECOGNIZED_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];
