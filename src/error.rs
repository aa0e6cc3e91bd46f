//! Errors for the glance charm

use std::io::Error as IOError;

use ex::io::Error as ExIOError;
use failure::Fail;
use serde_yaml::Error as YamlError;

#[derive(Debug, Fail)]
pub enum CharmError {
    #[fail(display = "I/O error: {}", _0)]
    IOError(#[fail(cause)] IOError),

    #[fail(display = "I/O error: {}", _0)]
    ExIOError(#[fail(cause)] ExIOError),

    #[fail(display = "YAML Error: {}", _0)]
    YamlError(#[fail(cause)] YamlError),

    #[fail(display = "Unknown hook `{}`", _0)]
    UnknownHook(String),

    #[fail(display = "`{}` is not a managed config file", _0)]
    UnknownConfigFile(String),

    #[fail(display = "Required config option `{}` is not set", _0)]
    MissingConfigOption(&'static str),

    #[fail(display = "Invalid installation source `{}`", _0)]
    InvalidInstallSource(String),

    #[fail(display = "Error running subcommand `{}`: `{}`", _0, _1)]
    SubcommandError(String, String),
}

impl From<IOError> for CharmError {
    fn from(err: IOError) -> Self {
        CharmError::IOError(err)
    }
}

impl From<ExIOError> for CharmError {
    fn from(err: ExIOError) -> Self {
        CharmError::ExIOError(err)
    }
}

impl From<YamlError> for CharmError {
    fn from(err: YamlError) -> Self {
        CharmError::YamlError(err)
    }
}

impl From<CharmError> for String {
    fn from(err: CharmError) -> Self {
        format!("{}", err)
    }
}
