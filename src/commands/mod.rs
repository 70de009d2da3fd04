//! CLI command handlers.

mod clear;
mod queue;
mod session;
mod settings;
mod show;

pub(crate) use clear::run_clear_command;
pub(crate) use queue::{run_add_command, run_remove_command};
pub(crate) use session::run_start_command;
pub(crate) use settings::{
    Toggle, run_options_command, run_set_delay_command, run_set_dir_command,
    run_set_temp_command, run_toggle_command,
};
pub(crate) use show::run_show_command;
