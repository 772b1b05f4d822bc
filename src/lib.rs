//! `plugconf` - A schema-driven configuration engine for marketplace plugins
//!
//! A plugin version declares its configurable parameters in a schema. This
//! library turns that schema into typed fields split between an enterprise
//! scope and a personal scope, keeps the working values of each scope,
//! validates them, picks the editing control for each field, and saves one
//! scope at a time through a persistence backend.

pub mod cli;
pub mod config;
pub mod error;
pub mod operations;
pub mod persistence;
pub mod render;
pub mod schema;
pub mod session;
pub mod store;
pub mod system;
pub mod validation;

use anyhow::Result;
use cli::{Args, Command};
use config::Settings;
use system::{RealSystem, System};

/// Main entry point for the plugconf library
///
/// # Errors
///
/// Returns the error of the executed subcommand.
#[inline]
pub fn run(args: &Args) -> Result<()> {
    let system = RealSystem::new();
    run_with(args, &system)
}

/// Run a parsed command against the given system
///
/// # Errors
///
/// Returns the error of the executed subcommand.
#[inline]
pub fn run_with(args: &Args, system: &dyn System) -> Result<()> {
    let format = args.output_format;

    match args.command {
        Command::Inspect(ref inspect) => operations::run_inspect(system, inspect, format),
        Command::Validate(ref validate) => operations::run_validate(system, validate, format),
        Command::Resolve(ref resolve) => {
            let settings = Settings::load(system, args.config.as_deref())?;
            operations::run_resolve(system, &settings, resolve, format)
        }
        Command::Save(ref save) => {
            let settings = Settings::load(system, args.config.as_deref())?;
            operations::run_save(system, &settings, save, format)
        }
    }
}
