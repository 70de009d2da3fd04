//! Show command handler: current settings followed by the queue.

use crate::app::context::RunContext;
use crate::output;

pub(crate) fn run_show_command(ctx: &RunContext) {
    output::print_lines(&output::settings_lines(&ctx.settings, &ctx.paths));
    println!();
    output::print_lines(&output::queue_lines(&ctx.queue));
}
