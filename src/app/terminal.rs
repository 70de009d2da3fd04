//! Terminal capability checks and tracing setup.

pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_disable_color(no_color_env: bool, dumb_terminal: bool) -> bool {
    no_color_env || dumb_terminal
}

/// The status line needs an interactive stdout and is hidden by `-q`.
pub(crate) fn should_use_status_line(
    stdout_is_terminal: bool,
    quiet: bool,
    dumb_terminal: bool,
) -> bool {
    stdout_is_terminal && !quiet && !dumb_terminal
}

/// Picks the log level used when `RUST_LOG` is not set.
///
/// Priority: quiet flag > verbose flag > `debug` setting > default (warn).
pub(crate) fn resolve_default_log_level(
    quiet: bool,
    verbose: u8,
    debug_setting: bool,
) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 if debug_setting => "debug",
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

pub(crate) fn init_tracing(default_level: &str, no_color: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}
