//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use output::OutputFormat;

pub mod commands;
pub mod output;

/// capkit - install workload and trait capabilities and assemble applications
#[derive(Parser, Debug)]
#[command(name = "capkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit JSON on stdout (shorthand for --output-format=json)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Output format (human, json)
    #[arg(long, short = 'O', global = true, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/capkit/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_args(self.json, self.output_format)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage capability centers
    Center(commands::center::CenterArgs),

    /// Install, remove and inspect capabilities
    Cap(commands::capability::CapArgs),

    /// List installed traits
    Traits(commands::capability::TraitsArgs),

    /// Create or update a component with a workload
    Run(commands::component::RunArgs),

    /// Attach or detach traits on a component
    Trait(commands::component::TraitArgs),

    /// Manage components
    Component(commands::component::ComponentArgs),

    /// Inspect application files
    App(commands::application::AppArgs),
}
