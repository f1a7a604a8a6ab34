//! Error types for ticketfs

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ticketfs
#[derive(Error, Debug)]
pub enum Error {
    // Lookup errors
    #[error("Ticket not found: {0}")]
    TicketNotFound(u64),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    // Zammad errors
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Zammad API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl Error {
    /// Convert to libc errno for FUSE
    pub fn to_errno(&self) -> libc::c_int {
        match self {
            Error::TicketNotFound(_) | Error::NotFound(_) => libc::ENOENT,
            Error::NotADirectory(_) => libc::ENOTDIR,
            Error::NotAFile(_) => libc::EISDIR,
            Error::NotImplemented(_) => libc::ENOSYS,
            Error::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
            _ => libc::EIO,
        }
    }

    /// Whether this error means the ticket or path does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::TicketNotFound(_) | Error::NotFound(_))
    }
}
