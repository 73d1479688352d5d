use super::*;
use rand::RngCore;

const NBLOCKS: u32 = 64;

fn random_block() -> Block {
    let mut block = Block::zero();
    rand::rng().fill_bytes(block.as_bytes_mut());
    block
}

#[test]
fn new_disk_reports_block_count() {
    let d = MemDisk::new(NBLOCKS).expect("mem disk");
    assert_eq!(d.block_count(), NBLOCKS);
}

#[test]
fn zero_sized_disk_is_rejected() {
    let err = MemDisk::new(0).err().expect("must fail");
    assert!(err.to_string().contains("at least one block"));
}

#[test]
fn initial_reads_are_zero_filled() {
    let d = MemDisk::new(NBLOCKS).expect("mem disk");

    let mut buf = Block::from_prefix(&[0xAAu8; BLOCK_SIZE]);
    d.read_block(0, &mut buf).expect("read");
    assert!(
        buf.as_bytes().iter().all(|&b| b == 0),
        "fresh blocks should read as zeros"
    );

    d.read_block(NBLOCKS - 1, &mut buf).expect("read last");
    assert!(buf.as_bytes().iter().all(|&b| b == 0));
}

#[test]
fn write_then_read_roundtrip() {
    let mut d = MemDisk::new(NBLOCKS).expect("mem disk");
    let data = random_block();

    d.write_block(17, &data).expect("write");

    let mut back = Block::zero();
    d.read_block(17, &mut back).expect("read");
    assert_eq!(back, data, "roundtrip must match");
}

#[test]
fn write_touches_only_the_target_block() {
    let mut d = MemDisk::new(NBLOCKS).expect("mem disk");
    d.write_block(5, &Block::from_prefix(&[0x5Au8; BLOCK_SIZE]))
        .expect("write");

    let mut buf = Block::zero();
    for id in [4, 6] {
        d.read_block(id, &mut buf).expect("read neighbour");
        assert!(
            buf.as_bytes().iter().all(|&b| b == 0),
            "block {id} must stay zero"
        );
    }
}

#[test]
fn overwrite_replaces_whole_block() {
    let mut d = MemDisk::new(NBLOCKS).expect("mem disk");
    d.write_block(3, &Block::from_prefix(&[0xFFu8; BLOCK_SIZE]))
        .expect("write");
    d.write_block(3, &Block::from_prefix(b"short")).expect("rewrite");

    let mut buf = Block::zero();
    d.read_block(3, &mut buf).expect("read");
    assert_eq!(&buf.as_bytes()[..5], b"short");
    assert!(buf.as_bytes()[5..].iter().all(|&b| b == 0));
}

#[test]
fn out_of_range_ids_are_rejected() {
    let mut d = MemDisk::new(NBLOCKS).expect("mem disk");
    let mut buf = Block::from_prefix(b"keep");

    assert_eq!(
        d.read_block(NBLOCKS, &mut buf),
        Err(ExtentError::BlockOutOfRange(NBLOCKS))
    );
    assert_eq!(&buf.as_bytes()[..4], b"keep", "failed read leaves buffer alone");

    assert_eq!(
        d.write_block(u32::MAX, &buf),
        Err(ExtentError::BlockOutOfRange(u32::MAX))
    );
}

#[test]
fn large_random_roundtrips() {
    let mut d = MemDisk::new(NBLOCKS).expect("mem disk");
    let mut written = Vec::new();

    for _ in 0..16 {
        let id = rand::random::<u32>() % NBLOCKS;
        let data = random_block();
        d.write_block(id, &data).expect("write");
        written.retain(|(prev, _)| *prev != id);
        written.push((id, data));
    }

    for (id, data) in written {
        let mut back = Block::zero();
        d.read_block(id, &mut back).expect("read");
        assert_eq!(back, data, "block {id}");
    }
}
