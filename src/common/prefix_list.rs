//! Reading newline-delimited CIDR prefix lists

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use ipnet::IpNet;

/// Errors that can happen while gathering the prefixes to index
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}:{line}: {text:?} is not a valid CIDR prefix: {source}", .path.display())]
    InvalidPrefix {
        path: PathBuf,
        line: usize,
        text: String,
        source: ipnet::AddrParseError,
    },
    #[error("Failed to parse config file {} at `{field}`: {source}", .path.display())]
    Config {
        path: PathBuf,
        field: String,
        source: serde_json::Error,
    },
    #[error("No prefixes configured. Use --prefix, --prefix-file, or --config to add some")]
    NoPrefixes,
}

/// Parse a newline-delimited list of CIDR prefixes.
///
/// Blank lines and lines starting with `#` are skipped. `origin` is only used in error messages.
pub fn parse_prefix_list<R: BufRead>(reader: R, origin: &Path) -> Result<Vec<IpNet>, LoadError> {
    let mut prefixes = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::Io {
            path: origin.to_path_buf(),
            source,
        })?;

        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let prefix = text
            .parse::<IpNet>()
            .map_err(|source| LoadError::InvalidPrefix {
                path: origin.to_path_buf(),
                line: index + 1,
                text: text.to_string(),
                source,
            })?;
        prefixes.push(prefix);
    }
    Ok(prefixes)
}

/// Read a newline-delimited list of CIDR prefixes from a file
pub fn read_prefix_file(path: &Path) -> Result<Vec<IpNet>, LoadError> {
    log::debug!("Reading prefixes from {}", path.display());
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_prefix_list(BufReader::new(file), path)
}
