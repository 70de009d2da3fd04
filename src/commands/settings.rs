//! Settings command handlers: directories, toggles, tool options and delay.

use anyhow::Result;
use tracing::info;
use ytqueue_core::SettingsError;
use ytqueue_core::settings::{
    parse_toggle, set_download_dir, set_retry_delay, set_staging_dir, set_tool_args,
};

use crate::app::context::RunContext;
use crate::output;

/// Boolean settings exposed as `y`/`n` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Toggle {
    Staging,
    SuppressOutput,
    Debug,
}

impl Toggle {
    fn key(self) -> &'static str {
        match self {
            Self::Staging => "use_temp_folder",
            Self::SuppressOutput => "suppress_output",
            Self::Debug => "debug",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Staging => "Temporary folder",
            Self::SuppressOutput => "Output suppression",
            Self::Debug => "Debug logging",
        }
    }
}

pub(crate) fn run_set_dir_command(ctx: &mut RunContext, raw: &str) -> Result<()> {
    let path = set_download_dir(&mut ctx.settings, raw, ctx.paths.home())?;
    ctx.save_settings()?;
    info!(path = %path.display(), "download directory updated");
    println!("Download directory set to {}", path.display());
    Ok(())
}

pub(crate) fn run_set_temp_command(ctx: &mut RunContext, raw: &str) -> Result<()> {
    let path = set_staging_dir(&mut ctx.settings, raw, ctx.paths.home())?;
    ctx.save_settings()?;
    info!(path = %path.display(), "temporary directory updated");
    println!("Temporary download directory set to {}", path.display());
    Ok(())
}

pub(crate) fn run_toggle_command(ctx: &mut RunContext, toggle: Toggle, raw: &str) -> Result<()> {
    let enabled = parse_toggle(raw).ok_or_else(|| SettingsError::InvalidToggle {
        key: toggle.key(),
        value: raw.to_string(),
    })?;
    let slot = match toggle {
        Toggle::Staging => &mut ctx.settings.use_staging,
        Toggle::SuppressOutput => &mut ctx.settings.suppress_output,
        Toggle::Debug => &mut ctx.settings.debug,
    };
    *slot = enabled;
    ctx.save_settings()?;
    info!(key = toggle.key(), enabled, "toggle updated");
    println!(
        "{} {}.",
        toggle.label(),
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

pub(crate) fn run_options_command(ctx: &mut RunContext, args: &[String]) -> Result<()> {
    set_tool_args(&mut ctx.settings, &args.join(" "));
    ctx.save_settings()?;
    info!(options = %ctx.settings.tool_args, "tool options updated");
    println!("yt-dlp options set to: {}", ctx.settings.tool_args);
    Ok(())
}

pub(crate) fn run_set_delay_command(ctx: &mut RunContext, raw: &str) -> Result<()> {
    set_retry_delay(&mut ctx.settings, raw)?;
    ctx.save_settings()?;
    info!(minutes = ctx.settings.retry_delay_minutes, "retry delay updated");
    println!(
        "Retry delay set to {}.",
        output::format_delay(ctx.settings.retry_delay())
    );
    Ok(())
}
