use super::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FsError {
    #[error("name exceeds {} characters", DIRSIZ)]
    NameTooLong,
    #[error("an entry with that name already exists")]
    AlreadyExists,
    #[error("no such file or directory")]
    NotFound,
    #[error("a directory on the path does not exist")]
    ParentMissing,
    #[error("a component of the path is not a directory")]
    NotADirectory,
    #[error("operation does not handle directories")]
    IsDirectory,
    #[error("all {} inodes are in use", NINODES)]
    NoFreeInode,
    #[error("no free data block left on disk")]
    NoFreeDataBlock,
    #[error("all {} block references of the directory are in use", NDIRECT)]
    NoFreeChildSlot,
    #[error("directory is not empty")]
    DirectoryNotEmpty,
    #[error("file larger than {} bytes", MAXFILE)]
    FileTooLarge,
    #[error("invalid path")]
    InvalidPath,
    /// The inode table and the link blocks disagree.
    #[error("inconsistent tree: {0}")]
    InconsistentTree(String),
    #[error("disk image must be {} bytes, got {0}", IMAGE_SIZE)]
    BadImage(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("inode record codec: {0}")]
    Codec(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, FsError>;
