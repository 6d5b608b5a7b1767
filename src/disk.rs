//! Disk layout:
//! [ superblock | data blocks(127) ]
//! 128 blocks of 1024 bytes, 131072 bytes in total. No magic, no version.
//!
//! Superblock:
//! [ free-block table(128) | inode table(16 * 52) | zero padding ]
//!
//! Data block `i` is disk block `i + 1`.

use super::*;

use log::info;
use std::path::Path;

/// offset of the inode table inside the superblock
pub const INODE_TABLE_OFFSET: usize = NBLOCKS;

impl SuperBlock {
    fn to_block(&self) -> Result<[u8; BSIZE]> {
        let mut block = [0u8; BSIZE];
        block[..NBLOCKS].copy_from_slice(&self.free.to_bytes());
        let inodes = self.inodes.to_bytes()?;
        block[INODE_TABLE_OFFSET..INODE_TABLE_OFFSET + inodes.len()].copy_from_slice(&inodes);
        Ok(block)
    }

    fn from_block(block: &[u8]) -> Result<Self> {
        Ok(SuperBlock {
            free: FreeBlockTable::from_bytes(&block[..NBLOCKS])?,
            inodes: InodeTable::from_bytes(
                &block[INODE_TABLE_OFFSET..INODE_TABLE_OFFSET + NINODES * INODE_SIZE],
            )?,
        })
    }
}

impl FileSystem {
    /// Flattens the whole disk.
    pub fn to_image(&self) -> Result<Vec<u8>> {
        let mut image = Vec::with_capacity(IMAGE_SIZE);
        image.extend_from_slice(&self.sb.to_block()?);
        for block in self.blocks.iter() {
            image.extend_from_slice(block);
        }
        debug_assert_eq!(image.len(), IMAGE_SIZE);
        Ok(image)
    }

    /// Rebuilds a disk from an image produced by `to_image`. The disk must pass `check`.
    pub fn from_image(image: &[u8]) -> Result<Self> {
        if image.len() != IMAGE_SIZE {
            return Err(FsError::BadImage(image.len()));
        }
        let sb = SuperBlock::from_block(&image[..BSIZE])?;
        let mut blocks = vec![[0u8; BSIZE]; NDATA];
        for (block, chunk) in blocks.iter_mut().zip(image[BSIZE..].chunks_exact(BSIZE)) {
            block.copy_from_slice(chunk);
        }
        let fs = FileSystem { sb, blocks };
        fs.check()?;
        Ok(fs)
    }

    /// Writes the image to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let image = self.to_image()?;
        std::fs::write(path.as_ref(), &image)?;
        info!("wrote {} byte image to {}", image.len(), path.as_ref().display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let image = std::fs::read(path.as_ref())?;
        Self::from_image(&image)
    }
}
