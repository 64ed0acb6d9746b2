//! CLI subcommand implementations.

pub mod layout;
pub mod util;
pub mod watch;
pub mod window;
