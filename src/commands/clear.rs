//! Clear command handler: empty queue, staging contents and ledger.

use anyhow::Result;
use ytqueue_core::clear_session;

use crate::app::context::RunContext;

pub(crate) fn run_clear_command(ctx: &mut RunContext) -> Result<()> {
    let report = clear_session(&mut ctx.queue, &ctx.queue_store, &ctx.settings)?;
    println!(
        "Cleared {} queued URL(s) and {} item(s) from {}.",
        report.urls_removed,
        report.staged_entries_removed,
        ctx.settings.staging_dir.display()
    );
    Ok(())
}
