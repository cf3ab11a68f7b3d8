//! Faultkit CLI library
//!
//! This library provides the command-line interface for running and
//! inspecting the faultkit fault-handling scenarios.

pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod scenarios;

pub use error::{CliError, CliResult};
