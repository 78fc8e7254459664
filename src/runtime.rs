//! Runtime glue: configuration loading and telemetry.

pub mod config;
pub mod telemetry;
