//! Command-line interface module
//!
//! Handles argument parsing for the `plugconf` binary

pub mod args;

pub use args::*;
