//! A teaching-scale simulated filesystem living in a 128 KiB in-memory disk.
//!
//! The disk holds one superblock (free-block table + inode table) and 127 data blocks.
//! Directories own no content: each of their block references points at a link block
//! holding one [`DirEnt`] for an immediate child. The whole disk flattens into a fixed
//! size image, see [`disk`].

mod bitmap; // free-block table
mod common;
mod dir; // link blocks
pub mod disk;
mod error;
mod fs; // lifecycle operations
mod inode;
pub mod path;
pub mod script;

pub use bitmap::FreeBlockTable;
pub use common::*;
pub use dir::DirEnt;
pub use error::{FsError, Result};
pub use fs::{filler, FileSystem, Listing, SuperBlock};
pub use inode::{FileKind, Inode, InodeTable};
