//! Application runtime composition modules.

pub(crate) mod command_dispatcher;
pub(crate) mod context;
pub(crate) mod runtime;
pub(crate) mod terminal;
