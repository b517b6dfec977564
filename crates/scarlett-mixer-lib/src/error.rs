//! Unified error type for the scarlett-mixer-lib crate.
//!
//! [`MixerError`] wraps endpoint errors and the domain-specific error kinds
//! (profile selection, snapshots, config, invalid writes). `From` impls
//! allow `?` to propagate across module boundaries.

use std::fmt;

use crate::endpoint::EndpointError;

/// Unified error type for scarlett-mixer-lib operations.
#[derive(Debug)]
pub enum MixerError {
    /// No static profile and no usable autodetected one.
    UnsupportedDevice(String),
    /// A resolved control index is past the end of the control list.
    MissingControl { index: usize, count: usize },
    /// Control endpoint error (open, read, write, poll).
    Endpoint(EndpointError),
    /// The engine has been closed.
    Closed,
    /// Standard I/O error.
    Io(std::io::Error),
    /// Snapshot load/save error.
    Snapshot(String),
    /// Configuration validation error.
    Config(String),
    /// A value that does not fit the addressed control.
    InvalidValue(String),
}

impl fmt::Display for MixerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MixerError::UnsupportedDevice(name) => {
                write!(f, "Unsupported device: {name}")
            }
            MixerError::MissingControl { index, count } => {
                write!(f, "Control {index} missing (card has {count} controls)")
            }
            MixerError::Endpoint(e) => write!(f, "{e}"),
            MixerError::Closed => write!(f, "Mixer is closed"),
            MixerError::Io(e) => write!(f, "I/O error: {e}"),
            MixerError::Snapshot(e) => write!(f, "Snapshot error: {e}"),
            MixerError::Config(e) => write!(f, "Config error: {e}"),
            MixerError::InvalidValue(e) => write!(f, "Invalid value: {e}"),
        }
    }
}

impl std::error::Error for MixerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MixerError::Endpoint(e) => Some(e),
            MixerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EndpointError> for MixerError {
    fn from(e: EndpointError) -> Self {
        MixerError::Endpoint(e)
    }
}

impl From<std::io::Error> for MixerError {
    fn from(e: std::io::Error) -> Self {
        MixerError::Io(e)
    }
}

/// Crate-level Result alias using [`MixerError`].
pub type Result<T> = std::result::Result<T, MixerError>;
