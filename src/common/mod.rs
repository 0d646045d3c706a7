//! Common code used by the `prefix-lookup` binary

pub mod logging;
pub mod prefix_list;
pub mod profiler;
