// anvil: The target-graph build runner.
// Copyright (C) 2024 International Digital Economy Academy
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//
// For inquiries, you can contact us via e-mail at jichuruanjian@idea.edu.cn.

#![warn(clippy::clone_on_ref_ptr)]

use std::{any::Any, io::IsTerminal};

use clap::Parser;
use cli::AnvilSubcommands;

mod cli;

use colored::*;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging and tracing-related functionality.
///
/// This includes configuration based on multiple flags and configs:
/// - `RUST_LOG` environment variable to filter regular log output, printed to stderr.
///   Without it, `-q` only shows errors and `-v` also shows informational messages.
/// - `ANVIL_TRACE` environment variable to enable Chrome tracing output.
/// - `--trace` CLI flag does the same thing as `ANVIL_TRACE=trace`, but outputs
///   to `trace.json` instead of the default `trace-<timestamp>.json`. When
///   `--trace` is used together with `ANVIL_TRACE`, the latter takes precedence.
///
/// Returns a boxed guard that keeps the tracing system alive.
fn init_tracing(trace_flag: bool, quiet: bool, verbose: bool) -> Box<dyn Any> {
    // usage example: only show debug logs for the sequencer
    // env RUST_LOG=anvilbuild::sequence=debug cargo run -- run -C ./crates/anvil/tests/test_cases/hello

    let log_env_set = std::env::var("RUST_LOG").is_ok();
    let anvil_tracing_env = std::env::var("ANVIL_TRACE").ok();
    let default_level = if quiet {
        tracing::Level::ERROR
    } else if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let fmt = tracing_subscriber::fmt::layer()
        .with_ansi(std::io::stderr().is_terminal())
        .with_line_number(log_env_set)
        .with_level(true)
        .with_writer(std::io::stderr);
    let fmt = if !log_env_set {
        fmt.with_target(false).without_time().boxed()
    } else {
        fmt.compact().boxed()
    };

    // Trace spans in Chrome format
    let chrome_trace = if let Some(env) = anvil_tracing_env.as_deref() {
        // `ANVIL_TRACE` environment variable
        let chrome_filter = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(tracing::Level::TRACE.into())
            .parse_lossy(env);
        let (layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
            .include_args(true)
            .build();

        Some((chrome_filter.and_then(layer), guard))
    } else if trace_flag {
        // `--trace` flag
        let chrome_filter = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(tracing::Level::TRACE.into())
            .parse_lossy("");
        let (layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
            .include_args(true)
            .file("trace.json")
            .build();

        Some((chrome_filter.and_then(layer), guard))
    } else {
        None
    };

    let (chrome_layer, chrome_guard) = chrome_trace.unzip();

    let fmt_layer = fmt.with_filter(filter);
    // `init` also forwards records of the `log` facade, which the libraries use
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(chrome_layer)
        .init();

    Box::new(chrome_guard)
}

pub fn main() {
    let cli = cli::AnvilCli::parse();
    let flags = cli.flags;

    let _trace_guard = init_tracing(flags.trace, flags.quiet, flags.verbose);

    use AnvilSubcommands::*;
    let res = match cli.subcommand {
        Run(r) => cli::run_run(&flags, r),
        Targets(t) => cli::run_targets(&flags, t),
        Check(c) => cli::run_check(&flags, c),
        Graph(g) => cli::run_graph(&flags, g),
    };

    drop(_trace_guard);

    match res {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:?}", "error".red().bold(), e);
            std::process::exit(-1);
        }
    }
}
