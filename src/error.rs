//! Error types for the meter.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading attributes or driving the meter window.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading an attribute or font file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed attribute file.
    #[error("Invalid attribute file: {0}")]
    Attributes(#[from] toml::de::Error),

    /// Color string that is neither hex nor a known name.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Font data rusttype could not parse.
    #[error("Font error: {0}")]
    Font(String),

    /// Event loop creation or run failure.
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// Window creation failure.
    #[error("Window error: {0}")]
    Window(#[from] winit::error::OsError),

    /// Pixel surface creation failure.
    #[error("Surface error: {0}")]
    Surface(#[from] pixels::Error),
}
