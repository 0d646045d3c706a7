use std::{net::IpAddr, path::PathBuf};

use crate::{common::prefix_list::LoadError, config::Config};

use super::ProfilerArgs;

#[derive(clap::Parser)]
#[clap(author, version, about="Find which configured prefix contains an address", long_about = None)]
pub struct Args {
    #[command(flatten)]
    config_data: Config,

    /// Path to a JSON config file to read
    #[clap(short = 'c', long = "config")]
    config_file: Option<PathBuf>,

    /// Addresses to look up. Read from stdin, one per line, when omitted
    pub addresses: Vec<IpAddr>,

    /// Print Prometheus metrics after all lookups are done
    #[clap(long)]
    pub metrics: bool,

    #[command(flatten)]
    pub profiler_args: ProfilerArgs,

    /// Enable verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build the effective config.
    ///
    /// Sources from the config file (if any) come before sources given directly on the command line.
    pub fn config(&self) -> Result<Config, LoadError> {
        let mut config = match self.config_file {
            Some(ref path) => Config::load(path)?,
            None => Config::default(),
        };
        config.merge(self.config_data.clone());
        Ok(config)
    }
}
