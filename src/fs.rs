use super::*;

use log::{debug, info};
use std::fmt;

/// Block 0 of the disk.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SuperBlock {
    pub free: FreeBlockTable,
    pub inodes: InodeTable,
}

/// The whole simulated disk: superblock plus the data blocks.
///
/// Every lifecycle operation checks all of its preconditions before touching either table,
/// so a returned error leaves the disk exactly as it was.
pub struct FileSystem {
    pub(crate) sb: SuperBlock,
    pub(crate) blocks: Vec<[u8; BSIZE]>,
}

/// One line of `list_files`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
    pub ino: usize,
    pub kind: FileKind,
    pub name: String,
    pub size: u32,
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FileKind::Directory => {
                write!(f, "Directory: {} Directory size: {}", self.name, self.size)
            }
            _ => write!(f, "File name: {} File size: {}", self.name, self.size),
        }
    }
}

/// What a new entry is filled with.
enum Payload {
    Directory,
    /// `n` bytes of the `a..z` filler
    Filler(usize),
    Bytes(Vec<u8>),
}

impl Payload {
    fn kind(&self) -> FileKind {
        match self {
            Payload::Directory => FileKind::Directory,
            _ => FileKind::File,
        }
    }

    fn len(&self) -> usize {
        match self {
            Payload::Directory => 0,
            Payload::Filler(n) => *n,
            Payload::Bytes(bytes) => bytes.len(),
        }
    }

    /// # of content blocks. Files always own at least one.
    fn nblocks(&self) -> usize {
        match self {
            Payload::Directory => 0,
            _ => self.len().div_ceil(BSIZE).max(1),
        }
    }

    fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Payload::Directory => None,
            Payload::Filler(n) => Some(filler(n)),
            Payload::Bytes(bytes) => Some(bytes),
        }
    }
}

/// Placeholder file content: the lowercase alphabet, repeated.
pub fn filler(len: usize) -> Vec<u8> {
    (b'a'..=b'z').cycle().take(len).collect()
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem {
    /// Empty disk: every inode unused, every data block free and zeroed. The root does not
    /// exist until `create_directory("/")`.
    pub fn new() -> Self {
        Self {
            sb: SuperBlock::default(),
            blocks: vec![[0u8; BSIZE]; NDATA],
        }
    }

    pub fn superblock(&self) -> &SuperBlock {
        &self.sb
    }

    pub fn inode(&self, ino: usize) -> Option<&Inode> {
        self.sb.inodes.get(ino)
    }

    pub fn data_block(&self, bno: usize) -> Option<&[u8; BSIZE]> {
        self.blocks.get(bno)
    }

    pub fn has_free_inode(&self) -> bool {
        self.sb.inodes.has_free()
    }

    pub(crate) fn inode_ref(&self, ino: usize) -> Result<&Inode> {
        self.sb
            .inodes
            .get(ino)
            .ok_or_else(|| FsError::InconsistentTree(format!("inode {} out of range", ino)))
    }

    fn inode_mut(&mut self, ino: usize) -> Result<&mut Inode> {
        self.sb
            .inodes
            .get_mut(ino)
            .ok_or_else(|| FsError::InconsistentTree(format!("inode {} out of range", ino)))
    }

    fn block_mut(&mut self, bno: usize) -> Result<&mut [u8; BSIZE]> {
        self.blocks
            .get_mut(bno)
            .ok_or_else(|| FsError::InconsistentTree(format!("data block {} out of range", bno)))
    }

    /// Takes the first free data block and hangs it on the first free reference of `ino`.
    fn attach_block(&mut self, ino: usize) -> Result<usize> {
        let slot = self
            .inode_ref(ino)?
            .free_slot()
            .ok_or(FsError::NoFreeChildSlot)?;
        let bno = self.sb.free.alloc().ok_or(FsError::NoFreeDataBlock)?;
        self.block_mut(bno)?.fill(0);
        self.inode_mut(ino)?.addrs[slot] = Some(bno);
        Ok(bno)
    }

    /// Zeroes and releases the block behind reference `slot` of `ino`.
    fn detach_block(&mut self, ino: usize, slot: usize) -> Result<()> {
        let bno = self.inode_ref(ino)?.addrs[slot].ok_or_else(|| {
            FsError::InconsistentTree(format!("inode {} reference {} is unset", ino, slot))
        })?;
        self.sb.free.mark_free(bno)?;
        self.block_mut(bno)?.fill(0);
        self.inode_mut(ino)?.addrs[slot] = None;
        Ok(())
    }

    /// Child of `dir` called `name`, if any.
    pub(crate) fn dir_lookup(&self, dir: usize, name: &str) -> Result<Option<usize>> {
        for (_, bno) in self.inode_ref(dir)?.blocks() {
            let ent = DirEnt::read_from(&self.blocks[bno])?;
            if ent.name() == name {
                let child = self.inode_ref(ent.ino())?;
                if !child.is_used() || child.name != name {
                    return Err(FsError::InconsistentTree(format!(
                        "link block {} names a stale entry {}",
                        bno, name
                    )));
                }
                return Ok(Some(ent.ino()));
            }
        }
        Ok(None)
    }

    /// Reference slot of `dir` whose link block points at `child`.
    fn link_slot(&self, dir: usize, child: usize) -> Result<usize> {
        for (slot, bno) in self.inode_ref(dir)?.blocks() {
            if DirEnt::read_from(&self.blocks[bno])?.ino() == child {
                return Ok(slot);
            }
        }
        Err(FsError::InconsistentTree(format!(
            "inode {} is not linked from its parent {}",
            child, dir
        )))
    }

    fn parent_of(&self, ino: usize) -> Result<usize> {
        self.inode_ref(ino)?
            .parent
            .ok_or_else(|| FsError::InconsistentTree(format!("inode {} has no parent", ino)))
    }

    /// `dir` followed by each of its ancestors up to the root.
    /// Fails if any directory on the way is not linked from the parent it records.
    fn lineage(&self, dir: usize) -> Result<Vec<usize>> {
        let mut chain = Vec::new();
        let mut cur = dir;
        loop {
            chain.push(cur);
            if chain.len() > NINODES {
                return Err(FsError::InconsistentTree(format!(
                    "parent chain of {} loops",
                    dir
                )));
            }
            let inode = self.inode_ref(cur)?;
            if !inode.is_dir() {
                return Err(FsError::InconsistentTree(format!(
                    "ancestor {} is not a directory",
                    cur
                )));
            }
            match inode.parent {
                None if cur == ROOTINO => return Ok(chain),
                None => {
                    return Err(FsError::InconsistentTree(format!(
                        "directory {} has no parent",
                        cur
                    )))
                }
                Some(parent) => {
                    self.link_slot(parent, cur)?;
                    cur = parent;
                }
            }
        }
    }

    fn grow(&mut self, chain: &[usize], by: u32) -> Result<()> {
        for &dir in chain {
            let inode = self.inode_mut(dir)?;
            inode.size += by;
            debug!("size: {} grows to {}", inode.name, inode.size);
        }
        Ok(())
    }

    /// Checks that no directory in `chain` overflows when taking `by` more bytes.
    fn can_grow(&self, chain: &[usize], by: u32) -> Result<()> {
        for &dir in chain {
            if self.inode_ref(dir)?.size.checked_add(by).is_none() {
                return Err(FsError::InconsistentTree(format!(
                    "directory {} cannot hold {} more bytes",
                    dir, by
                )));
            }
        }
        Ok(())
    }

    /// Checks that every directory in `chain` can give up `by` bytes.
    fn can_shrink(&self, chain: &[usize], by: u32) -> Result<()> {
        for &dir in chain {
            if self.inode_ref(dir)?.size < by {
                return Err(FsError::InconsistentTree(format!(
                    "directory {} is smaller than its content",
                    dir
                )));
            }
        }
        Ok(())
    }

    fn shrink(&mut self, chain: &[usize], by: u32) -> Result<()> {
        for &dir in chain {
            let inode = self.inode_mut(dir)?;
            inode.size -= by;
            debug!("size: {} shrinks to {}", inode.name, inode.size);
        }
        Ok(())
    }

    fn link(&mut self, dir: usize, child: usize, name: &str) -> Result<()> {
        let ent = DirEnt::new(child, name)?;
        let bno = self.attach_block(dir)?;
        ent.write_to(self.block_mut(bno)?)?;
        debug!("link: {} -> {} via data block {}", dir, child, bno);
        Ok(())
    }

    fn create_entry(&mut self, path: &str, payload: Payload) -> Result<usize> {
        let (parent_path, name) = path::split_parent(path)?;
        path::validate_name(name)?;
        if self.sb.inodes.find_by_name(name).is_some() {
            return Err(FsError::AlreadyExists);
        }
        let parent = self.walk_parent(&parent_path)?;
        if payload.len() > MAXFILE {
            return Err(FsError::FileTooLarge);
        }
        if !self.sb.inodes.has_free() {
            return Err(FsError::NoFreeInode);
        }
        if self.sb.free.free_count() < 1 + payload.nblocks() {
            return Err(FsError::NoFreeDataBlock);
        }
        if self.inode_ref(parent)?.free_slot().is_none() {
            return Err(FsError::NoFreeChildSlot);
        }
        let chain = self.lineage(parent)?;
        let size = payload.len() as u32;
        self.can_grow(&chain, size)?;

        let kind = payload.kind();
        let ino = self
            .sb
            .inodes
            .ialloc(kind, name, size, parent)
            .ok_or(FsError::NoFreeInode)?;
        self.link(parent, ino, name)?;
        if let Some(content) = payload.into_bytes() {
            self.write_content(ino, &content)?;
            self.grow(&chain, size)?;
        }
        Ok(ino)
    }

    fn write_content(&mut self, ino: usize, content: &[u8]) -> Result<()> {
        if content.is_empty() {
            self.attach_block(ino)?;
            return Ok(());
        }
        for chunk in content.chunks(BSIZE) {
            let bno = self.attach_block(ino)?;
            self.block_mut(bno)?[..chunk.len()].copy_from_slice(chunk);
        }
        Ok(())
    }

    /// Creates a file of `size` filler bytes. Returns its inode.
    pub fn create_file(&mut self, path: &str, size: usize) -> Result<usize> {
        let ino = self.create_entry(path, Payload::Filler(size))?;
        info!("created file {} ({} bytes) at inode {}", path, size, ino);
        Ok(ino)
    }

    /// Creates a directory. `/` bootstraps the root and may happen only once.
    pub fn create_directory(&mut self, path: &str) -> Result<usize> {
        if path::split(path)?.is_empty() {
            let root = self.inode_mut(ROOTINO)?;
            if root.is_used() {
                return Err(FsError::AlreadyExists);
            }
            *root = Inode {
                kind: FileKind::Directory,
                name: "/".to_string(),
                ..Inode::default()
            };
            info!("root directory initialised");
            return Ok(ROOTINO);
        }
        let ino = self.create_entry(path, Payload::Directory)?;
        info!("created directory {} at inode {}", path, ino);
        Ok(ino)
    }

    /// Content of a file, `size` bytes long.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let ino = self.lookup(path)?;
        let inode = self.inode_ref(ino)?;
        if inode.is_dir() {
            return Err(FsError::IsDirectory);
        }
        let mut content = Vec::with_capacity(inode.nblocks() * BSIZE);
        for (_, bno) in inode.blocks() {
            content.extend_from_slice(&self.blocks[bno]);
        }
        content.truncate(inode.size as usize);
        Ok(content)
    }

    /// Copies `src` to the new path `dst`, bytes included.
    pub fn copy_file(&mut self, src: &str, dst: &str) -> Result<usize> {
        let content = self.read_file(src)?;
        let ino = self.create_entry(dst, Payload::Bytes(content))?;
        info!("copied {} to {} at inode {}", src, dst, ino);
        Ok(ino)
    }

    pub fn remove_file(&mut self, path: &str) -> Result<()> {
        let ino = self.lookup(path)?;
        let inode = self.inode_ref(ino)?.clone();
        if inode.is_dir() {
            return Err(FsError::IsDirectory);
        }
        let parent = self.parent_of(ino)?;
        let slot = self.link_slot(parent, ino)?;
        let chain = self.lineage(parent)?;
        self.can_shrink(&chain, inode.size)?;
        for (_, bno) in inode.blocks() {
            if !self.sb.free.is_occupied(bno) {
                return Err(FsError::InconsistentTree(format!(
                    "content block {} of {} is marked free",
                    bno, inode.name
                )));
            }
        }

        self.shrink(&chain, inode.size)?;
        self.detach_block(parent, slot)?;
        for (slot, _) in inode.blocks() {
            self.detach_block(ino, slot)?;
        }
        self.inode_mut(ino)?.clear();
        info!("removed file {} (inode {})", path, ino);
        Ok(())
    }

    /// Removes an empty directory. Directories that still have children are rejected.
    pub fn remove_directory(&mut self, path: &str) -> Result<()> {
        let ino = self.lookup(path)?;
        if ino == ROOTINO {
            return Err(FsError::InvalidPath);
        }
        let inode = self.inode_ref(ino)?;
        if !inode.is_dir() {
            return Err(FsError::NotADirectory);
        }
        if inode.nblocks() > 0 {
            return Err(FsError::DirectoryNotEmpty);
        }
        let parent = self.parent_of(ino)?;
        let slot = self.link_slot(parent, ino)?;

        self.detach_block(parent, slot)?;
        self.inode_mut(ino)?.clear();
        info!("removed directory {} (inode {})", path, ino);
        Ok(())
    }

    /// Moves a file to `dst`. If `dst` names an existing directory the file keeps its
    /// name and goes inside it, otherwise `dst` is the new full path of the file.
    pub fn move_file(&mut self, src: &str, dst: &str) -> Result<()> {
        let ino = self.lookup(src)?;
        let inode = self.inode_ref(ino)?.clone();
        if inode.is_dir() {
            return Err(FsError::IsDirectory);
        }

        let (new_parent, name) = match self.lookup(dst) {
            Ok(target) if self.inode(target).is_some_and(Inode::is_dir) => {
                (target, inode.name.clone())
            }
            Ok(target) if target == ino => return Ok(()),
            Ok(_) => return Err(FsError::AlreadyExists),
            Err(FsError::NotFound) => {
                let (parent_path, leaf) = path::split_parent(dst)?;
                path::validate_name(leaf)?;
                if self.sb.inodes.find_by_name(leaf).is_some_and(|other| other != ino) {
                    return Err(FsError::AlreadyExists);
                }
                (self.walk_parent(&parent_path)?, leaf.to_string())
            }
            Err(e) => return Err(e),
        };

        let old_parent = self.parent_of(ino)?;
        let old_slot = self.link_slot(old_parent, ino)?;
        let old_chain = self.lineage(old_parent)?;
        let new_chain = self.lineage(new_parent)?;
        let new_slot = if new_parent == old_parent {
            old_slot
        } else {
            self.inode_ref(new_parent)?
                .free_slot()
                .ok_or(FsError::NoFreeChildSlot)?
        };
        self.can_shrink(&old_chain, inode.size)?;
        self.can_grow(&new_chain, inode.size)?;
        let ent = DirEnt::new(ino, &name)?;

        // the link block itself changes hands, the table does not move
        let bno = self.inode_mut(old_parent)?.addrs[old_slot]
            .take()
            .ok_or_else(|| FsError::InconsistentTree(format!("stale link slot {}", old_slot)))?;
        self.inode_mut(new_parent)?.addrs[new_slot] = Some(bno);
        ent.write_to(self.block_mut(bno)?)?;
        let moved = self.inode_mut(ino)?;
        moved.name = name;
        moved.parent = Some(new_parent);
        self.shrink(&old_chain, inode.size)?;
        self.grow(&new_chain, inode.size)?;
        info!("moved {} to {} (inode {})", src, dst, ino);
        Ok(())
    }

    /// Every entry in use, in inode table order.
    pub fn list_files(&self) -> Vec<Listing> {
        self.sb
            .inodes
            .iter()
            .filter(|(_, inode)| inode.is_used())
            .map(|(ino, inode)| Listing {
                ino,
                kind: inode.kind,
                name: inode.name.clone(),
                size: inode.size,
            })
            .collect()
    }

    /// Full consistency check of the disk. Reports the first violation found.
    pub fn check(&self) -> Result<()> {
        let bad = |msg: String| Err(FsError::InconsistentTree(msg));

        // free-block table against block references
        let mut refs = [0usize; NDATA];
        for (ino, inode) in self.sb.inodes.iter() {
            if !inode.is_used() {
                if *inode != Inode::default() {
                    return bad(format!("unused inode {} is not clean", ino));
                }
                continue;
            }
            for (_, bno) in inode.blocks() {
                refs[bno] += 1;
            }
        }
        for (bno, count) in refs.iter().enumerate() {
            match (*count, self.sb.free.is_occupied(bno)) {
                (0, false) | (1, true) => {}
                (0, true) => return bad(format!("data block {} is leaked", bno)),
                (1, false) => return bad(format!("data block {} is in use but free", bno)),
                (n, _) => return bad(format!("data block {} is referenced {} times", bno, n)),
            }
        }

        let root = self.inode_ref(ROOTINO)?;
        if !root.is_used() {
            if self.sb.inodes.iter().any(|(_, inode)| inode.is_used()) {
                return bad("entries exist without a root".to_string());
            }
            return Ok(());
        }
        if !root.is_dir() || root.name != "/" || root.parent.is_some() {
            return bad("root inode is malformed".to_string());
        }

        for (ino, inode) in self.sb.inodes.iter().filter(|(_, i)| i.is_used()) {
            if ino != ROOTINO {
                if inode.name.is_empty() || inode.name.len() > DIRSIZ {
                    return bad(format!("inode {} has a bad name", ino));
                }
                let parent = self.parent_of(ino)?;
                if !self.inode_ref(parent)?.is_dir() {
                    return bad(format!("parent of {} is not a directory", inode.name));
                }
                let slot = self.link_slot(parent, ino)?;
                let bno = self.inode_ref(parent)?.addrs[slot].unwrap_or_default();
                if DirEnt::read_from(&self.blocks[bno])?.name() != inode.name {
                    return bad(format!("link block {} caches a stale name", bno));
                }
                // reaches the root
                self.lineage(parent)?;
            }
            if inode.is_dir() {
                for (_, bno) in inode.blocks() {
                    let child = DirEnt::read_from(&self.blocks[bno])?.ino();
                    if child == ROOTINO || self.inode(child).and_then(|c| c.parent) != Some(ino) {
                        return bad(format!("link block {} of {} is stale", bno, inode.name));
                    }
                }
                let expected = self.subtree_size(ino, 0)?;
                if inode.size as u64 != expected {
                    return bad(format!(
                        "directory {} has size {} but holds {} bytes",
                        inode.name, inode.size, expected
                    ));
                }
            } else {
                let expected = (inode.size as usize).div_ceil(BSIZE).max(1);
                if inode.nblocks() != expected {
                    return bad(format!(
                        "file {} has {} content blocks, expected {}",
                        inode.name,
                        inode.nblocks(),
                        expected
                    ));
                }
            }
            if self.sb.inodes.find_by_name(&inode.name) != Some(ino) {
                return bad(format!("name {} is used twice", inode.name));
            }
        }
        Ok(())
    }

    /// Sum of the file sizes beneath `dir`, walking the link blocks.
    fn subtree_size(&self, dir: usize, depth: usize) -> Result<u64> {
        if depth > NINODES {
            return Err(FsError::InconsistentTree("directory cycle".to_string()));
        }
        let mut total = 0;
        for (_, bno) in self.inode_ref(dir)?.blocks() {
            let child = DirEnt::read_from(&self.blocks[bno])?.ino();
            let inode = self.inode_ref(child)?;
            total += if inode.is_dir() {
                self.subtree_size(child, depth + 1)?
            } else {
                inode.size as u64
            };
        }
        Ok(total)
    }
}
