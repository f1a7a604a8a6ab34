//! ticketfs - Zammad tickets as a filesystem
//!
//! This library provides a FUSE-based filesystem where every open ticket is a
//! directory of small files, and writing to a ticket's `articles` file adds
//! an internal note.

pub mod config;
pub mod error;
pub mod fs;
pub mod identity;
pub mod states;
pub mod zammad;

pub use config::Config;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::fs::{FsContext, Node, TicketFs};
    pub use crate::zammad::{TicketBackend, ZammadClient};
}
