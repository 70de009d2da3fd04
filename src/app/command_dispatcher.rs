//! CLI command routing: runs the handler for the parsed subcommand.

use anyhow::Result;

use crate::app::context::RunContext;
use crate::cli::Command;
use crate::commands::{self, Toggle};
use crate::ProcessExit;

/// Runs `command` against the loaded context and returns the exit outcome.
pub(crate) async fn dispatch(command: &Command, ctx: &mut RunContext) -> Result<ProcessExit> {
    match command {
        Command::Add { urls } => commands::run_add_command(ctx, urls)?,
        Command::Remove { index } => commands::run_remove_command(ctx, *index)?,
        Command::Show => commands::run_show_command(ctx),
        Command::SetDir { path } => commands::run_set_dir_command(ctx, path)?,
        Command::SetTemp { path } => commands::run_set_temp_command(ctx, path)?,
        Command::Temp { value } => commands::run_toggle_command(ctx, Toggle::Staging, value)?,
        Command::Suppress { value } => {
            commands::run_toggle_command(ctx, Toggle::SuppressOutput, value)?;
        }
        Command::Debug { value } => commands::run_toggle_command(ctx, Toggle::Debug, value)?,
        Command::Options { args } => commands::run_options_command(ctx, args)?,
        Command::SetDelay { minutes } => commands::run_set_delay_command(ctx, minutes)?,
        Command::Start => return commands::run_start_command(ctx).await,
        Command::Clear => commands::run_clear_command(ctx)?,
    }
    Ok(ProcessExit::Success)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::dispatch;
    use crate::ProcessExit;
    use crate::app::context::RunContext;
    use crate::cli::Command;
    use tempfile::TempDir;
    use ytqueue_core::{AppPaths, QueueStore};

    fn context(temp: &TempDir) -> RunContext {
        let paths = AppPaths::new(temp.path(), temp.path().join("config"));
        RunContext::load(paths, true).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_add_then_remove_persists() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(&temp);

        let add = Command::Add {
            urls: vec!["https://youtu.be/a".into(), "https://youtu.be/b".into()],
        };
        assert_eq!(dispatch(&add, &mut ctx).await.unwrap(), ProcessExit::Success);
        dispatch(&Command::Remove { index: 0 }, &mut ctx).await.unwrap();

        let stored = ctx.queue_store.load().unwrap();
        assert_eq!(stored.iter().collect::<Vec<_>>(), vec!["https://youtu.be/b"]);
    }

    #[tokio::test]
    async fn test_dispatch_add_splits_multiline_argument() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(&temp);

        let add = Command::Add {
            urls: vec!["https://youtu.be/a\nhttps://youtu.be/b\r\n\n".into()],
        };
        dispatch(&add, &mut ctx).await.unwrap();

        let expected = vec!["https://youtu.be/a", "https://youtu.be/b"];
        assert_eq!(ctx.queue.iter().collect::<Vec<_>>(), expected);
        let stored = ctx.queue_store.load().unwrap();
        assert_eq!(stored.iter().collect::<Vec<_>>(), expected);
    }

    #[tokio::test]
    async fn test_dispatch_remove_out_of_range_keeps_queue() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(&temp);
        let add = Command::Add {
            urls: vec!["https://youtu.be/a".into()],
        };
        dispatch(&add, &mut ctx).await.unwrap();

        let err = dispatch(&Command::Remove { index: 5 }, &mut ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert_eq!(ctx.queue_store.load().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_start_on_empty_queue_succeeds() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(&temp);
        assert_eq!(
            dispatch(&Command::Start, &mut ctx).await.unwrap(),
            ProcessExit::Success
        );
    }

    #[tokio::test]
    async fn test_dispatch_setdelay_rejects_negative() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(&temp);
        let err = dispatch(
            &Command::SetDelay {
                minutes: "-1".into(),
            },
            &mut ctx,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("negative"));
        assert_eq!(ctx.settings.retry_delay_minutes, 15);
    }
}
