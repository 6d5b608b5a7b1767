//! Free-block table kept in the superblock.
//! One flag per disk block; slot 0 is the superblock itself and is never released.
//! Callers address data blocks by data-block index, the table slot is `bno + 1`.

use super::*;

use log::trace;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FreeBlockTable {
    used: [bool; NBLOCKS],
}

impl Default for FreeBlockTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FreeBlockTable {
    pub fn new() -> Self {
        let mut used = [false; NBLOCKS];
        used[0] = true; // superblock
        Self { used }
    }

    /// First data block whose slot is free.
    pub fn find_free(&self) -> Option<usize> {
        (1..NBLOCKS).find(|&slot| !self.used[slot]).map(|slot| slot - 1)
    }

    /// Find and mark in one step.
    pub fn alloc(&mut self) -> Option<usize> {
        let bno = self.find_free()?;
        self.used[bno + 1] = true;
        trace!("bitmap: alloc data block {}", bno);
        Some(bno)
    }

    pub fn mark_occupied(&mut self, bno: usize) -> Result<()> {
        let slot = Self::slot(bno)?;
        if self.used[slot] {
            return Err(FsError::InconsistentTree(format!(
                "data block {} is already occupied",
                bno
            )));
        }
        self.used[slot] = true;
        Ok(())
    }

    pub fn mark_free(&mut self, bno: usize) -> Result<()> {
        let slot = Self::slot(bno)?;
        if !self.used[slot] {
            return Err(FsError::InconsistentTree(format!(
                "data block {} is already free",
                bno
            )));
        }
        self.used[slot] = false;
        trace!("bitmap: free data block {}", bno);
        Ok(())
    }

    pub fn is_occupied(&self, bno: usize) -> bool {
        bno < NDATA && self.used[bno + 1]
    }

    /// # of free data blocks
    pub fn free_count(&self) -> usize {
        self.used[1..].iter().filter(|used| !**used).count()
    }

    fn slot(bno: usize) -> Result<usize> {
        if bno >= NDATA {
            return Err(FsError::InconsistentTree(format!(
                "data block {} out of range",
                bno
            )));
        }
        Ok(bno + 1)
    }

    /// On-disk form: one ASCII flag per disk block.
    pub fn to_bytes(&self) -> [u8; NBLOCKS] {
        let mut bytes = [BLOCK_FREE; NBLOCKS];
        for (byte, used) in bytes.iter_mut().zip(self.used.iter()) {
            if *used {
                *byte = BLOCK_USED;
            }
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != NBLOCKS {
            return Err(FsError::BadImage(bytes.len()));
        }
        let mut used = [false; NBLOCKS];
        for (slot, byte) in bytes.iter().enumerate() {
            used[slot] = match *byte {
                BLOCK_USED => true,
                BLOCK_FREE => false,
                other => {
                    return Err(FsError::InconsistentTree(format!(
                        "free-block table slot {} holds {:#04x}",
                        slot, other
                    )))
                }
            };
        }
        if !used[0] {
            return Err(FsError::InconsistentTree(
                "superblock slot marked free".to_string(),
            ));
        }
        Ok(Self { used })
    }
}
