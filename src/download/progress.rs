//! Progress-line parsing for the condensed status line.
//!
//! The tool prints one `[download]` line per progress update. When output is
//! suppressed these lines are folded into a single human-readable status
//! string. Parsing is best effort: an unrecognized line yields `None` and
//! never affects the session.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(frag (\d+)/(\d+)\)").expect("fragment regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static ETA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ETA (\d{2}:\d{2}(?::\d{2})?)").expect("eta regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static SPEED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"at\s+([~\d.]+[A-Za-z]+/s)").expect("speed regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"of\s+~?\s*([\d.]+[A-Za-z]+)").expect("size regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Downloading item (\d+) of (\d+)").expect("item regex is valid") // Static pattern, safe to panic
});

const UNKNOWN_COUNT: &str = "?";
const UNKNOWN_VALUE: &str = "N/A";

/// True for lines that carry download progress or a playlist item marker.
#[must_use]
pub fn is_progress_line(line: &str) -> bool {
    (line.contains("[download]") && line.contains('%') && line.contains("ETA"))
        || line.contains("Downloading item")
}

/// True for the audio/video merge step.
#[must_use]
pub fn is_merge_line(line: &str) -> bool {
    line.contains("[Merger]") && line.contains("Merging")
}

/// Fields pulled from one progress line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressDetails {
    pub fragment: Option<(String, String)>,
    pub eta: Option<String>,
    pub speed: Option<String>,
    pub size: Option<String>,
    pub item: Option<(u32, u32)>,
}

impl ProgressDetails {
    #[must_use]
    pub fn parse(line: &str) -> Self {
        Self {
            fragment: FRAGMENT
                .captures(line)
                .map(|caps| (caps[1].to_string(), caps[2].to_string())),
            eta: ETA.captures(line).map(|caps| caps[1].to_string()),
            speed: SPEED.captures(line).map(|caps| caps[1].to_string()),
            size: SIZE.captures(line).map(|caps| caps[1].to_string()),
            item: ITEM.captures(line).and_then(|caps| {
                let current = caps[1].parse().ok()?;
                let total = caps[2].parse().ok()?;
                Some((current, total))
            }),
        }
    }
}

/// Turns raw tool lines into status text, remembering the playlist position.
///
/// The item counter is sticky: once a `Downloading item n of m` line is seen,
/// later progress lines for the same URL report it. Call [`reset`](Self::reset)
/// between URLs.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    item: Option<(u32, u32)>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the playlist position.
    pub fn reset(&mut self) {
        self.item = None;
    }

    /// Current playlist position, if known.
    #[must_use]
    pub fn item(&self) -> Option<(u32, u32)> {
        self.item
    }

    /// Returns the status text for `line`, or `None` when it is not a
    /// progress or merge line.
    pub fn observe(&mut self, line: &str) -> Option<String> {
        let download = is_progress_line(line);
        let merge = is_merge_line(line);
        if !download && !merge {
            return None;
        }

        let details = ProgressDetails::parse(line);
        if details.item.is_some() {
            self.item = details.item;
        }

        if merge {
            return Some(match self.item {
                Some((current, total)) => {
                    format!("Merging Video and Audio files for video {current} of {total}.")
                }
                None => "Merging Video and Audio files".to_string(),
            });
        }
        Some(self.download_status(&details))
    }

    fn download_status(&self, details: &ProgressDetails) -> String {
        let (current, total) = details
            .fragment
            .as_ref()
            .map_or((UNKNOWN_COUNT, UNKNOWN_COUNT), |(c, t)| (c.as_str(), t.as_str()));
        let eta = details.eta.as_deref().unwrap_or(UNKNOWN_VALUE);
        let speed = details.speed.as_deref().unwrap_or(UNKNOWN_VALUE);
        let size = details.size.as_deref().unwrap_or(UNKNOWN_VALUE);

        match self.item {
            Some((item, items)) => format!(
                "Downloading fragment {current}/{total} | ETA: {eta} at ~ {speed} | Video {item} of {items} size ~ {size}"
            ),
            None => format!(
                "Downloading fragment {current}/{total} | ETA: {eta} at ~ {speed} | Video size ~ {size}"
            ),
        }
    }
}
