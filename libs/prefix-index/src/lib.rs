#![doc = include_str!("../README.md")]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod address;
mod bucket;
mod error;
mod index;
mod prefix;

pub use address::{Address, IPV4_MAPPED_PREFIX};
pub use bucket::BucketKey;
pub use error::{Error, Result};
pub use index::{IndexStats, PrefixIndex};
pub use prefix::NetworkPrefix;
