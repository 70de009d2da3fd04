//! External tool invocation: command construction and process execution.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, instrument};

use super::error::RunnerError;
use crate::settings::Settings;

/// Lines of combined output retained for error reporting.
const OUTPUT_TAIL_LINES: usize = 200;

/// One fully-specified run of the external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable name or path.
    pub program: String,
    /// Arguments, URL last.
    pub args: Vec<String>,
    /// Directory the tool runs in and writes to.
    pub working_dir: PathBuf,
}

impl Invocation {
    /// Builds the invocation for `url` from the session settings.
    ///
    /// With staging enabled the tool runs in the staging directory and keeps
    /// its ledger there via `--download-archive`; otherwise it runs in the
    /// final directory.
    #[must_use]
    pub fn for_url(settings: &Settings, url: &str) -> Self {
        let mut args = Vec::new();
        if settings.use_staging {
            args.push("--download-archive".to_string());
            args.push(settings.archive_file().display().to_string());
        }
        args.extend(settings.tool_arg_tokens());
        args.push(url.to_string());
        Self {
            program: settings.tool_binary.clone(),
            args,
            working_dir: settings.target_dir().to_path_buf(),
        }
    }

    /// Space-joined command line for display.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Exit status was zero.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub exit_code: Option<i32>,
    /// Tail of combined stdout/stderr.
    pub output: String,
}

impl RunOutcome {
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            output: String::new(),
        }
    }

    #[must_use]
    pub fn failed(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            output: output.into(),
        }
    }

    /// Last non-empty output line, used as the short error text.
    #[must_use]
    pub fn last_line(&self) -> Option<&str> {
        self.output.lines().rev().map(str::trim).find(|line| !line.is_empty())
    }
}

/// Runs the external tool.
///
/// `on_line` receives every line of combined output as it arrives.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(
        &self,
        invocation: &Invocation,
        on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
    ) -> Result<RunOutcome, RunnerError>;
}

/// [`ToolRunner`] that spawns a child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl ToolRunner for ProcessRunner {
    #[instrument(skip(self, on_line), fields(program = %invocation.program, cwd = %invocation.working_dir.display()))]
    async fn run(
        &self,
        invocation: &Invocation,
        on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
    ) -> Result<RunOutcome, RunnerError> {
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| spawn_error(&invocation.program, source))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_lines(stdout, tx.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_lines(stderr, tx.clone())));
        }
        drop(tx);

        let mut tail = VecDeque::with_capacity(OUTPUT_TAIL_LINES);
        while let Some(line) = rx.recv().await {
            on_line(&line);
            if tail.len() == OUTPUT_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        for reader in readers {
            if let Err(error) = reader.await {
                debug!(%error, "output reader task failed");
            }
        }

        let status = child.wait().await.map_err(|source| RunnerError::Wait {
            program: invocation.program.clone(),
            source,
        })?;
        debug!(code = ?status.code(), "tool exited");

        let mut output = String::new();
        for line in tail {
            output.push_str(&line);
            output.push('\n');
        }
        Ok(RunOutcome {
            success: status.success(),
            exit_code: status.code(),
            output,
        })
    }
}

fn spawn_error(program: &str, source: std::io::Error) -> RunnerError {
    if source.kind() == ErrorKind::NotFound {
        RunnerError::NotFound {
            program: program.to_string(),
        }
    } else {
        RunnerError::Spawn {
            program: program.to_string(),
            source,
        }
    }
}

async fn forward_lines<R>(mut reader: R, tx: UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut splitter = LineSplitter::default();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                for line in splitter.push(&buf[..n]) {
                    if tx.send(line).is_err() {
                        return;
                    }
                }
            }
            Err(error) => {
                debug!(%error, "output stream closed");
                break;
            }
        }
    }
    if let Some(line) = splitter.finish() {
        let _ = tx.send(line);
    }
}

/// Splits a byte stream into lines on `\n` or `\r`.
///
/// Progress output rewrites a single terminal line with `\r`, so both
/// characters end a line. Empty lines are dropped.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    /// Feeds bytes and returns the lines completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' || byte == b'\r' {
                if !self.pending.is_empty() {
                    lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                    self.pending.clear();
                }
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Returns the unterminated remainder, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::Path;

    fn settings() -> Settings {
        let mut settings = Settings::defaults(Path::new("/home/ada"));
        settings.tool_args = "-f best  -N 4".to_string();
        settings
    }

    #[test]
    fn test_invocation_without_staging() {
        let inv = Invocation::for_url(&settings(), "https://youtu.be/abc");
        assert_eq!(inv.program, "yt-dlp");
        assert_eq!(inv.args, vec!["-f", "best", "-N", "4", "https://youtu.be/abc"]);
        assert_eq!(inv.working_dir, PathBuf::from("/home/ada/Downloads"));
    }

    #[test]
    fn test_invocation_with_staging_adds_archive() {
        let mut settings = settings();
        settings.use_staging = true;
        let inv = Invocation::for_url(&settings, "https://youtu.be/abc");
        assert_eq!(
            inv.args,
            vec![
                "--download-archive",
                "/home/ada/Downloads/ytqueue/downloaded_videos.txt",
                "-f",
                "best",
                "-N",
                "4",
                "https://youtu.be/abc",
            ]
        );
        assert_eq!(inv.working_dir, PathBuf::from("/home/ada/Downloads/ytqueue"));
    }

    #[test]
    fn test_command_line_joins_args() {
        let inv = Invocation::for_url(&settings(), "https://youtu.be/abc");
        assert_eq!(inv.command_line(), "yt-dlp -f best -N 4 https://youtu.be/abc");
    }

    #[test]
    fn test_line_splitter_handles_carriage_returns_and_chunks() {
        let mut splitter = LineSplitter::default();
        assert!(splitter.push(b"[download]  1.0%").is_empty());
        assert_eq!(
            splitter.push(b"\r[download]  2.0%\r\n[Merger] Merg"),
            vec!["[download]  1.0%", "[download]  2.0%"]
        );
        assert!(splitter.push(b"ing").is_empty());
        assert_eq!(splitter.finish().as_deref(), Some("[Merger] Merging"));
        assert!(splitter.finish().is_none());
    }

    #[test]
    fn test_line_splitter_keeps_multibyte_split_across_chunks() {
        let mut splitter = LineSplitter::default();
        let bytes = "caf\u{e9}\n".as_bytes();
        assert!(splitter.push(&bytes[..4]).is_empty());
        assert_eq!(splitter.push(&bytes[4..]), vec!["caf\u{e9}"]);
    }

    #[test]
    fn test_run_outcome_last_line() {
        let outcome = RunOutcome::failed(1, "first\nERROR: boom\n\n");
        assert_eq!(outcome.last_line(), Some("ERROR: boom"));
        assert_eq!(RunOutcome::succeeded().last_line(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_merges_stdout_and_stderr() {
        let temp = tempfile::TempDir::new().unwrap();
        let inv = Invocation {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "echo out; echo err 1>&2; printf 'a\\rb'; exit 3".to_string(),
            ],
            working_dir: temp.path().to_path_buf(),
        };
        let mut seen = Vec::new();
        let outcome = ProcessRunner
            .run(&inv, &mut |line: &str| seen.push(line.to_string()))
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(3));
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "err", "out"]);
        assert!(outcome.output.contains("err"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_runs_in_working_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let inv = Invocation {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "touch made-here".to_string()],
            working_dir: temp.path().to_path_buf(),
        };
        let outcome = ProcessRunner.run(&inv, &mut |_: &str| {}).await.unwrap();
        assert!(outcome.success);
        assert!(temp.path().join("made-here").exists());
    }

    #[tokio::test]
    async fn test_process_runner_missing_program_is_not_found() {
        let temp = tempfile::TempDir::new().unwrap();
        let inv = Invocation {
            program: "ytqueue-definitely-missing-tool".to_string(),
            args: Vec::new(),
            working_dir: temp.path().to_path_buf(),
        };
        let err = ProcessRunner.run(&inv, &mut |_: &str| {}).await.unwrap_err();
        assert!(matches!(err, RunnerError::NotFound { .. }));
    }

    /// Hands each argument back as an output line and keeps it afterwards.
    struct EchoRunner;

    #[async_trait]
    impl ToolRunner for EchoRunner {
        async fn run(
            &self,
            invocation: &Invocation,
            on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
        ) -> Result<RunOutcome, RunnerError> {
            let mut kept = Vec::new();
            for arg in &invocation.args {
                let line = format!("echo {arg}");
                on_line(&line);
                kept.push(line);
            }
            Ok(RunOutcome {
                success: true,
                exit_code: Some(0),
                output: kept.join("\n"),
            })
        }
    }

    #[tokio::test]
    async fn test_runner_lines_can_be_kept_after_callback() {
        let runner: &dyn ToolRunner = &EchoRunner;
        let inv = Invocation::for_url(&settings(), "https://youtu.be/abc");
        let mut seen = Vec::new();
        let outcome = runner
            .run(&inv, &mut |line: &str| seen.push(line.len()))
            .await
            .unwrap();

        assert_eq!(seen.len(), inv.args.len());
        assert_eq!(outcome.last_line(), Some("echo https://youtu.be/abc"));
    }
}
