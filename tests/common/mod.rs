//! Common utilities for tests

#![allow(dead_code)]

use simdisk::FileSystem;

/// A disk with the root already bootstrapped.
pub fn fresh() -> FileSystem {
    let mut fs = FileSystem::new();
    fs.create_directory("/").unwrap();
    fs
}

/// Size of the entry called `name`, looked up through the listing.
pub fn size_of(fs: &FileSystem, name: &str) -> u32 {
    fs.list_files()
        .into_iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.size)
        .unwrap_or_else(|| panic!("no entry named {}", name))
}

/// Byte snapshot of the whole disk, for "nothing changed" assertions.
pub fn snapshot(fs: &FileSystem) -> Vec<u8> {
    fs.to_image().unwrap()
}
