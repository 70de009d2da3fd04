//! Queue command handlers: add and remove URLs.

use anyhow::Result;
use tracing::{info, warn};
use ytqueue_core::download::check_url_shape;
use ytqueue_core::UrlCheck;

use crate::app::context::RunContext;
use crate::output;

pub(crate) fn run_add_command(ctx: &mut RunContext, urls: &[String]) -> Result<()> {
    let mut added = 0;
    // One queue entry per line; an argument holding line breaks adds several.
    let entries = urls
        .iter()
        .flat_map(|url| url.split(['\n', '\r']))
        .map(str::trim)
        .filter(|url| !url.is_empty());
    for url in entries {
        if ctx.settings.validate_urls
            && let UrlCheck::Invalid { reason } = check_url_shape(url)
        {
            warn!(%url, %reason, "queued URL will be skipped by start");
        }
        ctx.queue.push_back(url);
        added += 1;
    }
    ctx.save_queue()?;
    info!(added, pending = ctx.queue.len(), "URLs added");

    println!("Added {added} URL(s).");
    output::print_lines(&output::queue_lines(&ctx.queue));
    Ok(())
}

pub(crate) fn run_remove_command(ctx: &mut RunContext, index: usize) -> Result<()> {
    let removed = ctx.queue.remove(index)?;
    ctx.save_queue()?;
    info!(index, url = %removed, "URL removed");

    println!("Removed {removed}");
    output::print_lines(&output::queue_lines(&ctx.queue));
    Ok(())
}
