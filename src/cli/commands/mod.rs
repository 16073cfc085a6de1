//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod application;
pub mod capability;
pub mod center;
pub mod component;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Center(args) => center::run(ctx, args),
        Commands::Cap(args) => capability::run(ctx, args),
        Commands::Traits(args) => capability::run_traits(ctx, args),
        Commands::Run(args) => component::run(ctx, args),
        Commands::Trait(args) => component::run_trait(ctx, args),
        Commands::Component(args) => component::run_component(ctx, args),
        Commands::App(args) => application::run(ctx, args),
    }
}
