//! Configuration.
//!
//! Options come from command-line flags or the environment and are validated
//! once at startup into a [`Config`].

mod settings;

pub use settings::{Cli, Config, ConfigError};
