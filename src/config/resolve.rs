//! Layer precedence.
//!
//! ```text
//! defaults  <  config file  <  command line
//! ```
//!
//! A value wins because its source provided it explicitly, not because a
//! parser filled in a default.

use crate::config::flags::Cli;
use crate::config::layer::OptionsLayer;
use crate::config::loader::{load_layer, ConfigError};
use crate::config::schema::Options;

/// Merge the configuration layers into the effective options.
pub fn resolve(defaults: Options, file: Option<OptionsLayer>, flags: OptionsLayer) -> Options {
    let mut options = defaults;
    if let Some(file) = file {
        file.apply_to(&mut options);
    }
    flags.apply_to(&mut options);
    options
}

/// Resolve the effective options for a parsed command line.
///
/// Reads and validates the config file named by `--config`, if any.
pub fn load_options(cli: &Cli) -> Result<Options, ConfigError> {
    let file = cli
        .config
        .as_deref()
        .filter(|path| !path.as_os_str().is_empty())
        .map(load_layer)
        .transpose()?;

    Ok(resolve(Options::default(), file, cli.overrides.clone()))
}
