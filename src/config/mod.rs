//! File-based configuration (YAML or TOML) for the command-line tool

mod loader;

pub use loader::{Config, OutputConfig, SystemOverrides};
