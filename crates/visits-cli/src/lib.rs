//! Library side of the `visits-etl` binary: configuration, logging and
//! run orchestration.

pub mod config;
pub mod logging;
pub mod pipeline;
