#![doc = include_str!("../README.md")]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

pub mod metrics;

#[macro_use]
pub mod macros;

use prometheus::{Encoder, TextEncoder};

/// Render every registered metric in the Prometheus text exposition format
pub fn render() -> Result<String, prometheus::Error> {
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|error| {
        log::error!("Metrics encoder produced invalid UTF-8");
        prometheus::Error::Msg(error.to_string())
    })
}
