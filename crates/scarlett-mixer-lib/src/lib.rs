//! scarlett-mixer — matrix mixer control for Focusrite Scarlett USB interfaces.

pub mod addressing;
pub mod config;
pub mod context;
pub mod detect;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod gain;
pub mod models;
pub mod presenter;
pub mod profile;
pub mod reset;
pub mod snapshot;

pub use error::MixerError;
