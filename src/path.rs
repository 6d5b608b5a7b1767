//! Path splitting and resolution.
//! Paths are absolute and slash delimited; resolution walks the link blocks from the root,
//! so every lookup is qualified by the full path.

use super::*;

/// Splits an absolute path into its components. `/` alone yields no components.
pub fn split(path: &str) -> Result<Vec<&str>> {
    if !path.starts_with('/') {
        return Err(FsError::InvalidPath);
    }
    let components: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if components.len() > MAX_PATH_DEPTH {
        return Err(FsError::InvalidPath);
    }
    Ok(components)
}

/// Splits a path into the components of its parent directory and its leaf name.
pub fn split_parent(path: &str) -> Result<(Vec<&str>, &str)> {
    let mut components = split(path)?;
    let leaf = components.pop().ok_or(FsError::InvalidPath)?;
    Ok((components, leaf))
}

/// Checks an entry name as it will be stored in a link block and an inode record.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['\0', '/']) {
        return Err(FsError::InvalidPath);
    }
    if name.len() > DIRSIZ {
        return Err(FsError::NameTooLong);
    }
    Ok(())
}

impl FileSystem {
    /// Resolves a path to its inode.
    pub fn lookup(&self, path: &str) -> Result<usize> {
        let components = split(path)?;
        self.walk(&components)
    }

    pub(crate) fn walk(&self, components: &[&str]) -> Result<usize> {
        let root = self.inode_ref(ROOTINO)?;
        if !root.is_used() {
            return Err(FsError::NotFound);
        }
        let mut cur = ROOTINO;
        for name in components {
            if !self.inode_ref(cur)?.is_dir() {
                return Err(FsError::NotADirectory);
            }
            cur = self.dir_lookup(cur, name)?.ok_or(FsError::NotFound)?;
        }
        Ok(cur)
    }

    /// Resolves the directory a new entry goes into. Every component must already exist.
    pub(crate) fn walk_parent(&self, components: &[&str]) -> Result<usize> {
        let ino = self.walk(components).map_err(|e| match e {
            FsError::NotFound => FsError::ParentMissing,
            e => e,
        })?;
        if !self.inode_ref(ino)?.is_dir() {
            return Err(FsError::NotADirectory);
        }
        Ok(ino)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_components() {
        assert_eq!(split("/").unwrap(), Vec::<&str>::new());
        assert_eq!(split("/a/b/c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(split("//a///b/").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn split_rejects_bad_paths() {
        assert!(matches!(split(""), Err(FsError::InvalidPath)));
        assert!(matches!(split("a/b"), Err(FsError::InvalidPath)));
        assert!(split("/1/2/3/4/5/6/7/8").is_ok());
        assert!(matches!(
            split("/1/2/3/4/5/6/7/8/9"),
            Err(FsError::InvalidPath)
        ));
    }

    #[test]
    fn split_parent_and_leaf() {
        let (parent, leaf) = split_parent("/d1/d2/f").unwrap();
        assert_eq!(parent, vec!["d1", "d2"]);
        assert_eq!(leaf, "f");
        assert!(matches!(split_parent("/"), Err(FsError::InvalidPath)));
    }

    #[test]
    fn names_fit_a_link_block() {
        assert!(validate_name("eightchr").is_ok());
        assert!(matches!(validate_name("ninechars"), Err(FsError::NameTooLong)));
        assert!(matches!(validate_name(""), Err(FsError::InvalidPath)));
        assert!(matches!(validate_name("a\0b"), Err(FsError::InvalidPath)));
        assert!(matches!(validate_name("a/b"), Err(FsError::InvalidPath)));
    }

    #[test]
    fn resolution_follows_the_tree() {
        let mut fs = FileSystem::new();
        fs.create_directory("/").unwrap();
        let d1 = fs.create_directory("/d1").unwrap();
        let f = fs.create_file("/d1/f", 3).unwrap();
        assert_eq!(fs.lookup("/").unwrap(), ROOTINO);
        assert_eq!(fs.lookup("/d1").unwrap(), d1);
        assert_eq!(fs.lookup("/d1/f").unwrap(), f);
        // names are unique, but lookup still needs the full path
        assert!(matches!(fs.lookup("/f"), Err(FsError::NotFound)));
        assert!(matches!(fs.lookup("/d1/f/x"), Err(FsError::NotADirectory)));
        assert!(matches!(fs.walk_parent(&["nope"]), Err(FsError::ParentMissing)));
        assert!(matches!(fs.walk_parent(&["d1", "f"]), Err(FsError::NotADirectory)));
    }

    #[test]
    fn nothing_resolves_before_root() {
        let fs = FileSystem::new();
        assert!(matches!(fs.lookup("/"), Err(FsError::NotFound)));
        assert!(matches!(fs.walk_parent(&[]), Err(FsError::ParentMissing)));
    }
}
