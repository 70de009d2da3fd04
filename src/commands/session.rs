//! Start command handler: run the queue processor with console output.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use tracing::warn;
use ytqueue_core::{
    HttpLinkProbe, InterruptibleWait, LinkProbe, OutputMode, ProcessRunner, QueueProcessor,
    SessionOutcome,
};

use crate::ProcessExit;
use crate::app::context::RunContext;
use crate::app::terminal;
use crate::output::{self, ConsoleObserver};

pub(crate) async fn run_start_command(ctx: &mut RunContext) -> Result<ProcessExit> {
    if ctx.queue.is_empty() {
        println!("{}", output::EMPTY_QUEUE_MESSAGE);
        return Ok(ProcessExit::Success);
    }

    let probe = if ctx.settings.check_links {
        match HttpLinkProbe::new() {
            Ok(probe) => Some(probe),
            Err(error) => {
                warn!(%error, "cannot build HTTP client, link checks disabled");
                None
            }
        }
    } else {
        None
    };

    let runner = ProcessRunner;
    let waiter = InterruptibleWait::listen();
    let mut processor = QueueProcessor::new(&ctx.settings, ctx.paths.home(), &runner, &waiter);
    if let Some(probe) = &probe {
        processor = processor.with_probe(probe as &dyn LinkProbe);
    }

    let interactive = terminal::should_use_status_line(
        io::stdout().is_terminal(),
        ctx.quiet,
        terminal::is_dumb_terminal(),
    );
    let mut observer = ConsoleObserver::new(
        OutputMode::from_settings(&ctx.settings),
        interactive,
        ctx.quiet,
        processor.policy().max_attempts(),
    );

    let outcome = processor
        .run(&mut ctx.queue, &ctx.queue_store, &mut observer)
        .await
        .context("download session stopped")?;
    drop(observer);

    match outcome {
        SessionOutcome::NothingToDo => {
            println!("{}", output::EMPTY_QUEUE_MESSAGE);
            Ok(ProcessExit::Success)
        }
        SessionOutcome::Completed(summary) => {
            if !ctx.quiet {
                output::print_lines(&output::summary_lines(&summary));
            }
            Ok(ProcessExit::Success)
        }
        SessionOutcome::Interrupted(summary) => {
            if !ctx.quiet {
                output::print_lines(&output::summary_lines(&summary));
            }
            println!("{} URL(s) left in the queue.", ctx.queue.len());
            Ok(ProcessExit::Interrupted)
        }
    }
}
