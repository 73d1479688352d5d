use std::io::Write;

use anyhow::{Result, ensure};

use extent_rs::layout::{BLOCK_SIZE, NDIRECT, ROOT_INUM};
use extent_rs::storage::disk::BlockDevice;
use extent_rs::{ExtentEngine, ExtentStore, InodeKind};

/// Grows a file from ten bytes into the indirect range and back, checking
/// contents, reported size and block accounting at every step.
///
/// # Errors
/// Fails at the first checkpoint whose observation differs from the expected one.
pub fn run_scenario<D: BlockDevice, W: Write>(
    engine: &mut ExtentEngine<D>,
    mut out: W,
) -> Result<()> {
    let root = engine.getattr(ROOT_INUM)?;
    ensure!(root.is_dir(), "inode {ROOT_INUM} is not the root directory");
    writeln!(out, "root inode {ROOT_INUM} is a directory")?;

    let free_empty = engine.allocator().free_count();
    let inum = engine.create(InodeKind::File)?;
    ensure!(inum == 2, "first file got inode {inum}, expected 2");
    writeln!(out, "allocated file inode {inum}")?;

    engine.put(inum, b"helloworld")?;
    ensure!(engine.get(inum)? == b"helloworld", "short read back differs");
    writeln!(out, "wrote and read back 10 bytes")?;

    let long_len = BLOCK_SIZE * NDIRECT + 100;
    let mut long = b"helloworld".to_vec();
    long.extend((10..long_len).map(|i| (i % 251) as u8));
    engine.put(inum, &long)?;
    ensure!(engine.get(inum)? == long, "long read back differs");
    let size = engine.getattr(inum)?.size as usize;
    ensure!(size == long_len, "getattr reports {size}, expected {long_len}");
    let held = free_empty - engine.allocator().free_count();
    writeln!(out, "extended to {long_len} bytes using {held} blocks (indirect included)")?;

    engine.put(inum, b"helloworld")?;
    ensure!(engine.get(inum)? == b"helloworld", "read back after shrink differs");
    let held = free_empty - engine.allocator().free_count();
    ensure!(held == 1, "shrunk file still holds {held} blocks");
    writeln!(out, "shrank to 10 bytes, indirect range released")?;
    Ok(())
}
