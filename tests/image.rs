mod common;

use common::fresh;
use simdisk::{FileSystem, FsError, BLOCK_USED, BSIZE, IMAGE_SIZE, NBLOCKS};

fn populated() -> FileSystem {
    let mut fs = fresh();
    fs.create_directory("/d1").unwrap();
    fs.create_file("/f1", 10).unwrap();
    fs.create_file("/d1/f2", 2048).unwrap();
    fs.create_directory("/d1/d2").unwrap();
    fs.copy_file("/f1", "/d1/d2/f3").unwrap();
    fs.remove_file("/f1").unwrap();
    fs
}

#[test]
fn image_has_fixed_size() {
    assert_eq!(FileSystem::new().to_image().unwrap().len(), IMAGE_SIZE);
    assert_eq!(populated().to_image().unwrap().len(), IMAGE_SIZE);
}

#[test]
fn image_round_trips_tables_and_blocks() {
    let fs = populated();
    let image = fs.to_image().unwrap();
    let back = FileSystem::from_image(&image).unwrap();

    assert_eq!(back.superblock(), fs.superblock());
    assert_eq!(back.list_files(), fs.list_files());
    assert_eq!(back.read_file("/d1/f2").unwrap(), fs.read_file("/d1/f2").unwrap());
    assert_eq!(back.to_image().unwrap(), image);
    back.check().unwrap();
}

#[test]
fn reparsed_disk_stays_usable() {
    let image = populated().to_image().unwrap();
    let mut fs = FileSystem::from_image(&image).unwrap();
    fs.create_file("/d1/d2/f4", 5).unwrap();
    fs.move_file("/d1/f2", "/f2").unwrap();
    fs.remove_file("/d1/d2/f3").unwrap();
    fs.check().unwrap();
    assert_eq!(fs.list_files()[0].size, 2053);
}

#[test]
fn free_table_reflects_block_usage() {
    let fs = populated();
    let image = fs.to_image().unwrap();
    for bno in 0..NBLOCKS - 1 {
        let occupied = image[bno + 1] == BLOCK_USED;
        assert_eq!(occupied, fs.superblock().free.is_occupied(bno));
        if !occupied {
            let block = &image[(bno + 1) * BSIZE..(bno + 2) * BSIZE];
            assert!(block.iter().all(|b| *b == 0), "free block {} not zeroed", bno);
        }
    }
}

#[test]
fn truncated_or_corrupt_images_are_rejected() {
    let mut image = populated().to_image().unwrap();
    assert!(matches!(
        FileSystem::from_image(&image[..IMAGE_SIZE - 1]),
        Err(FsError::BadImage(_))
    ));
    image[3] = b'x';
    assert!(matches!(
        FileSystem::from_image(&image),
        Err(FsError::InconsistentTree(_))
    ));
}

#[test]
fn images_with_wrong_directory_sizes_are_rejected() {
    let mut image = fresh().to_image().unwrap();
    // size field of the root record
    let size = NBLOCKS + 12;
    image[size..size + 4].copy_from_slice(&(u32::MAX - 1).to_le_bytes());
    assert!(matches!(
        FileSystem::from_image(&image),
        Err(FsError::InconsistentTree(_))
    ));

    let path = std::env::temp_dir().join(format!("simdisk-bad-{}.img", std::process::id()));
    std::fs::write(&path, &image).unwrap();
    let loaded = FileSystem::load(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(loaded, Err(FsError::InconsistentTree(_))));
}

#[test]
fn save_and_load() {
    let fs = populated();
    let path = std::env::temp_dir().join(format!("simdisk-{}.img", std::process::id()));
    fs.save(&path).unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), IMAGE_SIZE as u64);
    let back = FileSystem::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(back.superblock(), fs.superblock());
}
