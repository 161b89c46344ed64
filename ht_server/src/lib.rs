//! Internal modules for the table host.
//!
//! This library provides configuration loading, logging setup, and command
//! parsing used by the ht_server binary.

pub mod commands;
pub mod config;
pub mod logging;
