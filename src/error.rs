//! # Error Types
//!
//! This module defines error types used throughout the etiqueta library.
//!
//! Printer submission failures are not surfaced through this type directly;
//! they travel inside [`PrintResult`](crate::printer::PrintResult) together
//! with the number of pages that made it out before the failure.

use thiserror::Error;

/// Main error type for etiqueta operations
#[derive(Debug, Error)]
pub enum EtiquetaError {
    /// The barcode value was empty
    #[error("Barcode value cannot be empty")]
    EmptyValue,

    /// A character cannot be encoded in Code128 (sets B and C)
    #[error("Invalid character {ch:?} at position {position}")]
    InvalidCharacter { ch: char, position: usize },

    /// Requested canvas is zero or below the legibility minimum
    #[error("Invalid render size {width}x{height} (minimum {min_width}x{min_height})")]
    RenderSize {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },

    /// Copy count below one
    #[error("Invalid copy count {0}: at least one copy is required")]
    InvalidCopyCount(u32),

    /// History lookup for an unknown id
    #[error("History record {0} not found")]
    NotFound(u64),

    /// No printer registered under this name
    #[error("Unknown printer: {0}")]
    UnknownPrinter(String),

    /// Page sink failure (spooler, device)
    #[error("Printer error: {0}")]
    Printer(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image processing error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Waiters on a shared in-flight render receive a copy of the leader's
/// error. `io::Error` is not `Clone`, so it is rebuilt from its kind and
/// message.
impl Clone for EtiquetaError {
    fn clone(&self) -> Self {
        match self {
            Self::EmptyValue => Self::EmptyValue,
            Self::InvalidCharacter { ch, position } => Self::InvalidCharacter {
                ch: *ch,
                position: *position,
            },
            Self::RenderSize {
                width,
                height,
                min_width,
                min_height,
            } => Self::RenderSize {
                width: *width,
                height: *height,
                min_width: *min_width,
                min_height: *min_height,
            },
            Self::InvalidCopyCount(n) => Self::InvalidCopyCount(*n),
            Self::NotFound(id) => Self::NotFound(*id),
            Self::UnknownPrinter(name) => Self::UnknownPrinter(name.clone()),
            Self::Printer(msg) => Self::Printer(msg.clone()),
            Self::Config(msg) => Self::Config(msg.clone()),
            Self::Image(msg) => Self::Image(msg.clone()),
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), e.to_string())),
        }
    }
}
