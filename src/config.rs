use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use ipnet::IpNet;

use crate::common::prefix_list::{read_prefix_file, LoadError};

/// Where to find the prefixes to index. Specifiable via either CLI args or a JSON config file
#[derive(Debug, Default, Clone, PartialEq, Eq, clap::Args, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// A CIDR prefix to index. May be repeated
    #[clap(long = "prefix")]
    #[serde(default)]
    pub prefixes: Vec<IpNet>,

    /// A file of newline-delimited CIDR prefixes to index. May be repeated
    #[clap(long = "prefix-file")]
    #[serde(default)]
    pub prefix_files: Vec<PathBuf>,
}

impl Config {
    /// Load the config from a JSON file.
    ///
    /// Relative `prefix_files` are resolved against the directory containing the config file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        log::debug!("Loading config from {}", path.display());
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_reader(BufReader::new(file), path)?;

        if let Some(base) = path.parent() {
            for prefix_file in &mut config.prefix_files {
                if prefix_file.is_relative() {
                    *prefix_file = base.join(&*prefix_file);
                }
            }
        }
        Ok(config)
    }

    /// Parse a JSON config. `origin` is only used in error messages
    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self, LoadError> {
        let mut deserializer = serde_json::Deserializer::from_reader(reader);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| LoadError::Config {
            path: origin.to_path_buf(),
            field: error.path().to_string(),
            source: error.into_inner(),
        })
    }

    /// Add everything from `other` after the sources already in this config
    pub fn merge(&mut self, other: Config) {
        self.prefixes.extend(other.prefixes);
        self.prefix_files.extend(other.prefix_files);
    }

    /// Gather every configured prefix.
    ///
    /// Inline prefixes come first, followed by the contents of each prefix file in order.
    /// Order matters since earlier prefixes win over overlapping later ones.
    pub fn prefixes(&self) -> Result<Vec<IpNet>, LoadError> {
        let mut prefixes = self.prefixes.clone();
        for path in &self.prefix_files {
            prefixes.extend(read_prefix_file(path)?);
        }

        if prefixes.is_empty() {
            return Err(LoadError::NoPrefixes);
        }
        Ok(prefixes)
    }
}
