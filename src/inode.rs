use super::*;

use log::trace;
use serde::{Deserialize, Serialize};

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileKind {
    /// slot not in use
    #[default]
    None = 0,
    Directory = 1,
    File = 2,
}

/// inode in memory
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Inode {
    pub kind: FileKind,
    pub name: String,
    /// File: content length. Directory: sum of every file beneath it.
    pub size: u32,
    /// Data block indices; link blocks for directories, content blocks for files.
    pub addrs: [Option<usize>; NDIRECT],
    /// Inode of the directory holding the link block to this one.
    pub parent: Option<usize>,
}

impl Inode {
    pub fn is_used(&self) -> bool {
        self.kind != FileKind::None
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    /// First unset block reference.
    pub fn free_slot(&self) -> Option<usize> {
        self.addrs.iter().position(|addr| addr.is_none())
    }

    /// Occupied block references as `(slot, bno)`.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.addrs
            .iter()
            .enumerate()
            .filter_map(|(slot, addr)| addr.map(|bno| (slot, bno)))
    }

    pub fn nblocks(&self) -> usize {
        self.addrs.iter().filter(|addr| addr.is_some()).count()
    }

    pub fn clear(&mut self) {
        *self = Inode::default();
    }
}

/// inode on disk. Field order and widths are the image layout.
#[repr(C)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DInode {
    kind: FileKind,
    name: [u8; DIRSIZ],
    size: u32,
    /// -1 if unset
    addrs: [i32; NDIRECT],
    /// -1 if unset
    parent: i32,
}

impl From<&Inode> for DInode {
    fn from(inode: &Inode) -> Self {
        let mut name = [0u8; DIRSIZ];
        let len = inode.name.len().min(DIRSIZ);
        name[..len].copy_from_slice(&inode.name.as_bytes()[..len]);
        let mut addrs = [-1i32; NDIRECT];
        for (dst, src) in addrs.iter_mut().zip(inode.addrs.iter()) {
            if let Some(bno) = src {
                *dst = *bno as i32;
            }
        }
        DInode {
            kind: inode.kind,
            name,
            size: inode.size,
            addrs,
            parent: inode.parent.map_or(-1, |p| p as i32),
        }
    }
}

impl TryFrom<DInode> for Inode {
    type Error = FsError;

    fn try_from(d: DInode) -> Result<Self> {
        let len = d.name.iter().position(|b| *b == 0).unwrap_or(DIRSIZ);
        let name = std::str::from_utf8(&d.name[..len])
            .map_err(|_| FsError::InconsistentTree("inode name is not utf-8".to_string()))?
            .to_string();
        let mut addrs = [None; NDIRECT];
        for (dst, src) in addrs.iter_mut().zip(d.addrs.iter()) {
            *dst = match *src {
                -1 => None,
                bno if (0..NDATA as i32).contains(&bno) => Some(bno as usize),
                bno => {
                    return Err(FsError::InconsistentTree(format!(
                        "block reference {} out of range",
                        bno
                    )))
                }
            };
        }
        let parent = match d.parent {
            -1 => None,
            p if (0..NINODES as i32).contains(&p) => Some(p as usize),
            p => {
                return Err(FsError::InconsistentTree(format!(
                    "parent {} out of range",
                    p
                )))
            }
        };
        Ok(Inode {
            kind: d.kind,
            name,
            size: d.size,
            addrs,
            parent,
        })
    }
}

impl DInode {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self)?;
        debug_assert_eq!(bytes.len(), INODE_SIZE);
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Fixed table of inodes held by the superblock.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct InodeTable {
    inodes: [Inode; NINODES],
}

impl InodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ino: usize) -> Option<&Inode> {
        self.inodes.get(ino)
    }

    pub(crate) fn get_mut(&mut self, ino: usize) -> Option<&mut Inode> {
        self.inodes.get_mut(ino)
    }

    pub fn has_free(&self) -> bool {
        self.find_free().is_some()
    }

    /// First unused slot, the root slot excluded.
    pub fn find_free(&self) -> Option<usize> {
        self.inodes
            .iter()
            .enumerate()
            .skip(ROOTINO + 1)
            .find(|(_, inode)| !inode.is_used())
            .map(|(ino, _)| ino)
    }

    /// Names are unique across the whole table, so a bare name identifies one inode.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.inodes
            .iter()
            .position(|inode| inode.is_used() && inode.name == name)
    }

    /// Claims a free slot for a new entry.
    pub(crate) fn ialloc(
        &mut self,
        kind: FileKind,
        name: &str,
        size: u32,
        parent: usize,
    ) -> Option<usize> {
        let ino = self.find_free()?;
        self.inodes[ino] = Inode {
            kind,
            name: name.to_string(),
            size,
            addrs: [None; NDIRECT],
            parent: Some(parent),
        };
        trace!("inode: alloc {} for {:?} {}", ino, kind, name);
        Some(ino)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Inode)> {
        self.inodes.iter().enumerate()
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(NINODES * INODE_SIZE);
        for inode in self.inodes.iter() {
            bytes.extend(DInode::from(inode).encode()?);
        }
        Ok(bytes)
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut table = Self::new();
        for (ino, chunk) in bytes.chunks_exact(INODE_SIZE).take(NINODES).enumerate() {
            table.inodes[ino] = DInode::decode(chunk)?.try_into()?;
        }
        Ok(table)
    }
}
