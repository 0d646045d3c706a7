//! Entrypoint for the `prefix-lookup` binary.
//!
//! Loads CIDR prefixes from the command line, prefix files, and/or a JSON config file
//! into a `PrefixIndex`, then reports which prefix contains each queried address.

use std::{
    io::{BufRead, Write},
    net::IpAddr,
};

use args::prefix_lookup::Args;
use clap::Parser;
use common::{logging::enable_logger, profiler::start_puffin_server};
use owo_colors::{OwoColorize, Stream::Stdout};
use prefix_index::PrefixIndex;

mod args;
mod common;
mod config;

pub fn main() {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    if let Err(error) = enable_logger(args.verbose) {
        eprintln!("Failed to set up logging: {error}");
        std::process::exit(1);
    }

    // Enable the profiler if enabled by build flags
    #[allow(clippy::let_unit_value)]
    let _puffin_server = start_puffin_server(&args.profiler_args);

    // Build the index from every configured source
    let index: PrefixIndex = match args.config().and_then(|config| config.prefixes()) {
        Ok(prefixes) => prefixes.into_iter().collect(),
        Err(error) => {
            log::error!("{}", error);
            std::process::exit(1);
        }
    };
    let stats = index.stats();
    log::info!("Indexed {} prefixes", index.len());
    log::debug!(
        "IPv4 table: {} prefixes in {} buckets, IPv6 table: {} prefixes in {} buckets, largest bucket: {}",
        stats.ipv4_prefixes,
        stats.ipv4_buckets,
        stats.ipv6_prefixes,
        stats.ipv6_buckets,
        stats.largest_bucket
    );

    // Answer queries from the command line, or from stdin if there were none
    let stdout = std::io::stdout();
    let mut output = stdout.lock();
    let result = match args.addresses.is_empty() {
        true => {
            log::debug!("Reading addresses from stdin");
            run_lookups(&index, read_addresses(std::io::stdin().lock()), &mut output)
        }
        false => run_lookups(&index, args.addresses.iter().copied(), &mut output),
    };
    if let Err(error) = result {
        log::error!("Failed to write lookup results: {}", error);
        std::process::exit(1);
    }

    // Dump the metrics collected during the run
    if args.metrics {
        match prefix_metrics::render() {
            Ok(metrics) => {
                if let Err(error) = output.write_all(metrics.as_bytes()) {
                    log::error!("Failed to write metrics: {}", error);
                    std::process::exit(1);
                }
            }
            Err(error) => log::error!("Failed to render metrics: {}", error),
        }
    }
}

/// Parse one address per line, skipping blank lines and logging unparsable ones
fn read_addresses<R: BufRead>(reader: R) -> impl Iterator<Item = IpAddr> {
    reader
        .lines()
        .map_while(|line| match line {
            Ok(line) => Some(line),
            Err(error) => {
                log::error!("Failed to read from stdin: {}", error);
                None
            }
        })
        .filter_map(|line| {
            let text = line.trim();
            if text.is_empty() {
                return None;
            }
            match text.parse::<IpAddr>() {
                Ok(address) => Some(address),
                Err(error) => {
                    log::warn!("Skipping {:?}: {}", text, error);
                    None
                }
            }
        })
}

/// Look up every address and write one result line per address
#[profiling::function]
fn run_lookups<I, W>(index: &PrefixIndex, addresses: I, output: &mut W) -> std::io::Result<()>
where
    I: IntoIterator<Item = IpAddr>,
    W: Write,
{
    for address in addresses {
        match index.find(address) {
            Some(prefix) => writeln!(
                output,
                "{} -> {}",
                address,
                prefix.if_supports_color(Stdout, |text| text.green())
            )?,
            None => writeln!(
                output,
                "{} -> {}",
                address,
                "no match".if_supports_color(Stdout, |text| text.red())
            )?,
        }
    }
    Ok(())
}
