//! FUSE filesystem implementation
//!
//! Presents Zammad tickets as directories of fixed files and
//! translates writes to the `articles` file into new ticket notes.

pub mod content;
mod filesystem;
mod handle;
mod inode;
mod node;

pub use filesystem::TicketFs;
pub use handle::{FileHandle, HandleManager};
pub use inode::{InodeTable, ROOT_INO};
pub use node::{
    parse_ticket_id, DirEntry, DirNode, EntryKind, FileKind, FileNode, FsContext, Node, NodeAttr,
};
