//! Sweeps sizes adjacent to every block boundary, including the direct to
//! indirect crossing, in both growing and shrinking directions.

use super::*;
use crate::layout::{DIRECT_CAPACITY, MAX_FILE_BLOCKS};

fn engine() -> ExtentEngine {
    ExtentEngine::new(EngineConfig {
        block_count: 1024,
        inode_count: 8,
        legacy_root_alias: false,
    })
    .expect("engine")
}

fn fill(len: usize, seed: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 7 + seed * 13) % 251) as u8).collect()
}

/// Sizes within `radius` bytes of each `k * BLOCK_SIZE` edge.
fn around_by(radius: usize, block_counts: impl IntoIterator<Item = usize>) -> Vec<usize> {
    let mut sizes: Vec<usize> = block_counts
        .into_iter()
        .flat_map(|k| {
            let edge = k * BLOCK_SIZE;
            edge.saturating_sub(radius)..=edge + radius
        })
        .filter(|&s| s <= MAX_FILE_SIZE)
        .collect();
    sizes.sort_unstable();
    sizes.dedup();
    sizes
}

fn around(block_counts: impl IntoIterator<Item = usize>) -> Vec<usize> {
    around_by(2, block_counts)
}

/// Blocks the file should hold for `len` bytes, indirect block included.
fn expected_blocks(len: usize) -> u32 {
    (blocks_for(len) + usize::from(len > DIRECT_CAPACITY)) as u32
}

fn check(engine: &ExtentEngine, inum: u32, data: &[u8], free_empty: u32) {
    let len = data.len();
    assert_eq!(engine.read_file(inum).expect("read"), data, "len {len}");
    assert_eq!(engine.getattr(inum).expect("attr").size as usize, len);
    assert_eq!(
        engine.allocator().free_count(),
        free_empty - expected_blocks(len),
        "block accounting at len {len}"
    );
}

#[test]
fn every_boundary_size_roundtrips_from_empty() {
    let mut engine = engine();
    let inum = engine.alloc_inode(InodeKind::File).expect("file");
    let free_empty = engine.allocator().free_count();

    for (seed, len) in around(0..=NDIRECT + 3).into_iter().enumerate() {
        let data = fill(len, seed);
        engine.write_file(inum, &data).expect("write");
        check(&engine, inum, &data, free_empty);
        engine.write_file(inum, b"").expect("reset");
        check(&engine, inum, b"", free_empty);
    }
}

#[test]
fn monotonic_growth_then_shrink_keeps_accounting() {
    let mut engine = engine();
    let inum = engine.alloc_inode(InodeKind::File).expect("file");
    let free_empty = engine.allocator().free_count();
    let sizes = around(0..=NDIRECT + 3);

    for (seed, &len) in sizes.iter().enumerate() {
        let data = fill(len, seed);
        engine.write_file(inum, &data).expect("grow");
        check(&engine, inum, &data, free_empty);
    }
    for (seed, &len) in sizes.iter().rev().enumerate() {
        let data = fill(len, seed + 1000);
        engine.write_file(inum, &data).expect("shrink");
        check(&engine, inum, &data, free_empty);
    }
}

#[test]
fn pairwise_transitions_across_the_indirect_boundary() {
    let mut engine = engine();
    let inum = engine.alloc_inode(InodeKind::File).expect("file");
    let free_empty = engine.allocator().free_count();
    let sizes = around_by(
        1,
        [0, 1, 2, NDIRECT - 1, NDIRECT, NDIRECT + 1, NDIRECT + 2, MAX_FILE_BLOCKS],
    );

    let mut seed = 0;
    for &from in &sizes {
        for &to in &sizes {
            seed += 1;
            let start = fill(from, seed);
            engine.write_file(inum, &start).expect("from");
            check(&engine, inum, &start, free_empty);

            let end = fill(to, seed + 1);
            engine.write_file(inum, &end).expect("to");
            check(&engine, inum, &end, free_empty);
        }
    }
}

#[test]
fn neighbouring_file_survives_every_transition() {
    let mut engine = engine();
    let inum = engine.alloc_inode(InodeKind::File).expect("file");
    let witness = engine.alloc_inode(InodeKind::File).expect("witness");
    let witness_data = fill(BLOCK_SIZE * (NDIRECT + 1) + 3, 77);
    engine.write_file(witness, &witness_data).expect("witness");

    for (seed, len) in around([0, NDIRECT, NDIRECT + 1, NDIRECT + 4]).into_iter().enumerate() {
        engine.write_file(inum, &fill(len, seed)).expect("write");
        assert_eq!(engine.read_file(witness).expect("witness"), witness_data);
    }
    engine.remove_file(inum).expect("remove");
    assert_eq!(engine.read_file(witness).expect("witness"), witness_data);
}
