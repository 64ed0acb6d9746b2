//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Calendar watch face layout tool.
///
/// Feeds calendar events through the 12-hour window clipper and the band
/// layout engine, and prints what the watch face would draw.
#[derive(Debug, Parser)]
#[command(name = "calface", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Lay out the events in a file for one display window.
    Layout {
        /// JSON file with an array of events.
        #[arg(short, long)]
        input: PathBuf,

        /// Time to compute the window for (ISO 8601 or e.g. "2 hours ago").
        /// Defaults to now.
        #[arg(long)]
        at: Option<String>,

        /// Override the configured primary engine.
        #[arg(long, value_enum)]
        engine: Option<EngineArg>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the display window for a time.
    Window {
        /// Time to compute the window for. Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Keep a layout current for an events file, printing each new layout.
    Watch {
        /// JSON file with an array of events. Re-read whenever it changes.
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Engine selection on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    Constraint,
    Greedy,
}

impl From<EngineArg> for calface_core::Engine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Constraint => Self::Constraint,
            EngineArg::Greedy => Self::Greedy,
        }
    }
}
