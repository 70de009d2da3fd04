//! CLI argument definitions using clap derive macros.

use clap::{ArgAction, Parser, Subcommand};

/// Queue video links and download them one by one with yt-dlp.
///
/// URLs are kept in a persistent queue; `start` works through it, retrying
/// failed downloads and dropping links that do not respond.
#[derive(Parser, Debug)]
#[command(name = "ytqueue")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The command to run; `show` when none was given.
    pub fn command_or_default(&self) -> Command {
        self.command.clone().unwrap_or(Command::Show)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append one or more URLs to the queue
    #[command(short_flag = 'a', long_flag = "add")]
    Add {
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
    },

    /// Remove the URL at a zero-based queue position
    #[command(short_flag = 'r', long_flag = "remove")]
    Remove { index: usize },

    /// Show settings and the current queue
    Show,

    /// Set the final download directory
    #[command(name = "setdir", short_flag = 'd', long_flag = "dir")]
    SetDir { path: String },

    /// Set the temporary download directory
    #[command(name = "settemp", short_flag = 'T', long_flag = "tempdir")]
    SetTemp { path: String },

    /// Download into the temporary directory first (y/n)
    #[command(short_flag = 't')]
    Temp { value: String },

    /// Show a single status line instead of raw yt-dlp output (y/n)
    #[command(short_flag = 's')]
    Suppress { value: String },

    /// Log debug details by default (y/n)
    #[command(short_flag = 'D')]
    Debug { value: String },

    /// Replace the options passed to yt-dlp
    #[command(short_flag = 'o', long_flag = "options")]
    Options {
        #[arg(
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        args: Vec<String>,
    },

    /// Set the wait between failed attempts, in minutes
    #[command(name = "setdelay")]
    SetDelay {
        #[arg(allow_negative_numbers = true)]
        minutes: String,
    },

    /// Download every queued URL
    Start,

    /// Empty the queue and the temporary directory
    Clear,
}
