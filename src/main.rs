//! # `plugconf`
//!
//! `plugconf` edits the configuration of marketplace plugins against the
//! schema each plugin version ships. Fields belong to either the enterprise
//! scope or the personal scope, and each scope is validated and saved on its
//! own.
//!
//! ## Usage
//!
//! ```sh
//! plugconf inspect --schema config-schema.json
//! plugconf resolve --schema config-schema.json --plugin analytics --version-id 3
//! plugconf validate --schema config-schema.json --scope enterprise --set endpoint=https://a.example.com
//! plugconf save --schema config-schema.json --plugin analytics --version-id 3 --scope personal --set theme=dark
//! ```
//!
//! Backend settings are read from `./plugconf.yaml` (or `--config PATH`).

use clap::Parser as _;
use plugconf::cli::Args;
use plugconf::error::PlugconfError;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    match plugconf::run(&args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{err:#}");
            std::process::exit(
                err.downcast_ref::<PlugconfError>()
                    .map_or(1, PlugconfError::exit_code),
            );
        }
    }
}
