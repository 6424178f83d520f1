// Copyright © 2024 DocsPortal. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command-line interface for DocsPortal
//!
//! Argument parsing and command execution for the `docsportal` binary.
//!
//! # Examples
//!
//! ```
//! use docsportal::cli;
//!
//! let matches = cli::build().get_matches_from(vec![
//!     "docsportal",
//!     "show",
//!     "usage",
//! ]);
//!
//! let show = matches.subcommand_matches("show").unwrap();
//! assert_eq!(show.get_one::<String>("slug").unwrap(), "usage");
//! ```

use crate::core::config::{Config, ConfigBuilder};
use crate::{resolver_from_config, DocsPortal, PortalError, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{debug, info};
use std::io::Write;
use std::path::PathBuf;

/// The current version of DocsPortal, as defined in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix of environment variables that override configuration.
pub const ENV_PREFIX: &str = "DOCSPORTAL_";

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help("Configuration file (TOML)")
        .value_parser(value_parser!(PathBuf))
}

/// Builds and configures the DocsPortal command-line interface.
pub fn build() -> Command {
    debug!("Building CLI command structure");

    Command::new("docsportal")
        .author("DocsPortal Contributors")
        .about("Publishes a fixed documentation catalog as a static site.")
        .version(VERSION)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v, -vv, -vvv)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("build")
                .about("Render the index and every topic page")
                .arg(config_arg())
                .arg(
                    Arg::new("content")
                        .long("content")
                        .help("Content directory of {slug}.html / {slug}.md files")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("templates")
                        .short('t')
                        .long("templates")
                        .help("Template directory of .hbs overrides")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Output directory")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("minify")
                        .short('m')
                        .long("minify")
                        .help("Minify output")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("placeholders")
                        .long("placeholders")
                        .help("Write a placeholder page for topics without content")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("routes")
                .about("Print the URL of every page, one per line")
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("show")
                .about("Print a resolved topic page as JSON")
                .arg(
                    Arg::new("slug")
                        .help("Topic slug")
                        .required(true)
                        .value_parser(value_parser!(String)),
                )
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("check")
                .about("Verify that every catalog topic resolves")
                .arg(config_arg()),
        )
        .after_help(
            "\x1b[1;4mConfiguration:\x1b[0m\n\n  Settings are read from --config \
             and from DOCSPORTAL_* environment variables.\n\n\
             \x1b[1;4mLicense:\x1b[0m\n  The project is licensed under the terms of \
             both the MIT license and the Apache License (Version 2.0).",
        )
}

/// Executes the command selected by `matches`, writing command output to
/// `out`.
pub fn execute(matches: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    match matches.subcommand() {
        Some(("build", sub_matches)) => build_site(sub_matches, out),
        Some(("routes", sub_matches)) => print_routes(sub_matches, out),
        Some(("show", sub_matches)) => {
            let slug = sub_matches
                .get_one::<String>("slug")
                .map(String::as_str)
                .unwrap_or_default();
            show_topic(sub_matches, slug, out)
        }
        Some(("check", sub_matches)) => check_catalog(sub_matches, out),
        _ => Err(PortalError::internal_error("Unknown command")),
    }
}

/// Loads configuration from `--config`, the environment and the
/// subcommand's own flags.
fn load_config(matches: &ArgMatches) -> Result<Config> {
    let mut builder = ConfigBuilder::new().with_env_prefix(ENV_PREFIX);
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        builder = builder.with_file(path);
    }

    let path_flags = [
        ("content", "content_dir"),
        ("templates", "template_dir"),
        ("output", "output_dir"),
    ];
    for (flag, key) in path_flags {
        let value = matches
            .try_get_one::<PathBuf>(flag)
            .ok()
            .flatten()
            .map(|p| p.display().to_string());
        if let Some(value) = value {
            builder = builder.with_override(key, value);
        }
    }
    if flag_set(matches, "minify") {
        builder = builder.with_override("output.minify", true);
    }
    if flag_set(matches, "placeholders") {
        builder = builder.with_override("on_missing", "placeholder");
    }

    builder.build()
}

fn flag_set(matches: &ArgMatches, id: &str) -> bool {
    matches.try_get_one::<bool>(id).ok().flatten().copied() == Some(true)
}

fn build_site(matches: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let config = load_config(matches)?;
    info!("Building site into {}", config.output_dir.display());

    let portal = DocsPortal::from_config(config)?;
    let report = portal.build()?;

    writeln!(
        out,
        "Wrote {} pages to {}",
        report.written.len(),
        portal.config().output_dir.display()
    )?;
    for slug in &report.placeholders {
        writeln!(out, "placeholder: {}", slug)?;
    }
    Ok(())
}

fn print_routes(matches: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let resolver = resolver_from_config(&load_config(matches)?)?;
    for route in resolver.routes() {
        writeln!(out, "{}", route.url)?;
    }
    Ok(())
}

fn show_topic(
    matches: &ArgMatches,
    slug: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let resolver = resolver_from_config(&load_config(matches)?)?;
    let page = resolver.resolve(slug)?;
    let context = resolver.page_context(&page)?;
    let json = serde_json::to_string_pretty(&context).map_err(|e| {
        PortalError::internal_error(format!(
            "Failed to serialise page `{}`: {}",
            slug, e
        ))
    })?;
    writeln!(out, "{}", json)?;
    Ok(())
}

fn check_catalog(matches: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let resolver = resolver_from_config(&load_config(matches)?)?;
    resolver.verify()?;
    writeln!(out, "{} topics resolve", resolver.catalog().len())?;
    Ok(())
}
