//! Directory linkage. A directory owns no content: each occupied block reference of a
//! directory inode names a link block, and the link block starts with one `DirEnt`
//! describing an immediate child. The rest of the block stays zero.

use super::*;

use serde::{Deserialize, Serialize};

#[repr(C)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEnt {
    /// inode num
    pub inum: u16,
    /// name cache, zero padded
    name: [u8; DIRSIZ],
}

impl DirEnt {
    pub fn new(inum: usize, name: &str) -> Result<Self> {
        path::validate_name(name)?;
        let inum = u16::try_from(inum)
            .map_err(|_| FsError::InconsistentTree(format!("inode {} out of range", inum)))?;
        let mut buf = [0u8; DIRSIZ];
        buf[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self { inum, name: buf })
    }

    pub fn ino(&self) -> usize {
        self.inum as usize
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|b| *b == 0).unwrap_or(DIRSIZ);
        std::str::from_utf8(&self.name[..len]).unwrap_or("")
    }

    /// Overwrites the whole link block with this entry.
    pub fn write_to(&self, block: &mut [u8; BSIZE]) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        block.fill(0);
        block[..bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    pub fn read_from(block: &[u8; BSIZE]) -> Result<Self> {
        Ok(bincode::deserialize(&block[..DIRENT_SIZE])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_fills_block_prefix() {
        let mut block = [0xffu8; BSIZE];
        DirEnt::new(7, "docs").unwrap().write_to(&mut block).unwrap();
        assert_eq!(&block[..2], &7u16.to_le_bytes());
        assert_eq!(&block[2..DIRENT_SIZE], b"docs\0\0\0\0");
        assert!(block[DIRENT_SIZE..].iter().all(|b| *b == 0));

        let entry = DirEnt::read_from(&block).unwrap();
        assert_eq!(entry.ino(), 7);
        assert_eq!(entry.name(), "docs");
    }

    #[test]
    fn names_are_bounded() {
        assert!(DirEnt::new(1, "eightchr").is_ok());
        assert!(matches!(DirEnt::new(1, "ninechars"), Err(FsError::NameTooLong)));
        assert!(matches!(DirEnt::new(1, ""), Err(FsError::InvalidPath)));
    }
}
