//! CLI output formatting and display helpers.

mod session;

pub(crate) use session::{ConsoleObserver, summary_lines};

use std::time::Duration;

use ytqueue_core::{AppPaths, Queue, Settings};

/// Message when `start` finds nothing queued.
pub(crate) const EMPTY_QUEUE_MESSAGE: &str = "Queue is empty, nothing to download.";

/// Example for adding the first URL.
pub(crate) const ADD_EXAMPLE: &str = "Example: ytqueue add https://www.youtube.com/watch?v=...";

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub(crate) fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
pub(crate) fn truncate_to_width(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        return "…".to_string();
    }

    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

pub(crate) fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "enabled" } else { "disabled" }
}

/// Human-readable delay, in minutes when it divides evenly.
pub(crate) fn format_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    match secs {
        0 => "no delay".to_string(),
        60 => "1 minute".to_string(),
        s if s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{s} seconds"),
    }
}

pub(crate) fn settings_lines(settings: &Settings, paths: &AppPaths) -> Vec<String> {
    vec![
        format!("Settings file:        {}", paths.settings_file().display()),
        format!("Download directory:   {}", settings.download_dir.display()),
        format!("Temporary directory:  {}", settings.staging_dir.display()),
        format!("Temporary folder:     {}", on_off(settings.use_staging)),
        format!("yt-dlp options:       {}", settings.tool_args),
        format!(
            "Retry delay:          {}",
            format_delay(settings.retry_delay())
        ),
        format!("Suppress output:      {}", on_off(settings.suppress_output)),
        format!("Debug logging:        {}", on_off(settings.debug)),
    ]
}

pub(crate) fn queue_lines(queue: &Queue) -> Vec<String> {
    if queue.is_empty() {
        return vec!["Queue is empty.".to_string(), ADD_EXAMPLE.to_string()];
    }
    let width = terminal_width();
    let mut lines = vec![format!("Queue ({}):", queue.len())];
    for (index, url) in queue.iter().enumerate() {
        lines.push(truncate_to_width(&format!("  [{index}] {url}"), width));
    }
    lines
}
