//! Calendar watch face CLI library.
//!
//! This crate provides the diagnostic CLI around the layout engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, EngineArg};
pub use config::Config;
