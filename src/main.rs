// Copyright © 2024 DocsPortal. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # DocsPortal CLI
//!
//! This is the main entry point for the DocsPortal command-line interface.
//! It initializes the logger and runs the selected subcommand.

use anyhow::Context;
use docsportal::cli;
use log::{debug, info};
use std::io::{self, Write};

/// Maps the `-v` count to a default log filter; `RUST_LOG` takes precedence.
fn init_logger(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .init();
}

/// Parses arguments and runs the requested command.
fn run() -> anyhow::Result<()> {
    let matches = cli::build().get_matches();
    init_logger(matches.get_count("verbose"));
    info!("Starting DocsPortal v{}", cli::VERSION);

    let command = matches.subcommand_name().unwrap_or("docsportal");
    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli::execute(&matches, &mut out)
        .with_context(|| format!("`{}` failed", command))?;
    out.flush().context("Failed to flush output")?;

    debug!("DocsPortal finished");
    Ok(())
}

/// The main entry point for the DocsPortal CLI.
fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
