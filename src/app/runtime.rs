use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use ytqueue_core::AppPaths;

use crate::ProcessExit;
use crate::app::{command_dispatcher, context, terminal};
use crate::cli::Cli;

pub(crate) async fn run_ytqueue() -> Result<ProcessExit> {
    let cli = Cli::parse();

    let paths = AppPaths::resolve().context("cannot locate the configuration directory")?;
    let default_level = terminal::resolve_default_log_level(
        cli.quiet,
        cli.verbose,
        context::debug_setting_hint(&paths),
    );
    let no_color =
        terminal::should_disable_color(terminal::no_color_env_requested(), terminal::is_dumb_terminal());
    terminal::init_tracing(default_level, no_color);
    debug!(?cli, config_dir = %paths.config_dir().display(), "CLI arguments parsed");

    let mut ctx = context::RunContext::load(paths, cli.quiet)?;
    command_dispatcher::dispatch(&cli.command_or_default(), &mut ctx).await
}
