/// root i-number
pub const ROOTINO: usize = 0;

/// block size
pub const BSIZE: usize = 1024;

/// size of the disk in blocks, superblock included
pub const NBLOCKS: usize = 128;

/// number of data blocks, i.e. every block after the superblock
pub const NDATA: usize = NBLOCKS - 1;

/// number of inodes in the superblock
pub const NINODES: usize = 16;

/// block references per inode. bounds both directory fan-out and file fragments
pub const NDIRECT: usize = 8;

/// max length of an entry name
pub const DIRSIZ: usize = 8;

/// max # of components in a path
pub const MAX_PATH_DEPTH: usize = NDIRECT;

/// max file size in bytes
pub const MAXFILE: usize = NDIRECT * BSIZE;

/// bytes of one serialized inode record
pub const INODE_SIZE: usize = 52;

/// bytes of one serialized directory entry
pub const DIRENT_SIZE: usize = 2 + DIRSIZ;

/// size of the flattened disk image
pub const IMAGE_SIZE: usize = NBLOCKS * BSIZE;

/// free-block table flag of an occupied block
pub const BLOCK_USED: u8 = b'1';

/// free-block table flag of a free block
pub const BLOCK_FREE: u8 = b'0';

const _: () = assert!(NBLOCKS + NINODES * INODE_SIZE <= BSIZE);
const _: () = assert!(DIRENT_SIZE <= BSIZE);
