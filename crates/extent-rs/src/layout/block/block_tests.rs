use super::*;
use std::mem::{align_of, size_of};

#[test]
fn zero_block_is_all_zero() {
    let b = Block::zero();
    assert!(b.as_bytes().iter().all(|&x| x == 0));
    assert_eq!(Block::default(), b);
}

#[test]
fn size_and_alignment_match_transparent_representation() {
    assert_eq!(size_of::<Block>(), BLOCK_SIZE);
    assert_eq!(align_of::<Block>(), align_of::<[u8; BLOCK_SIZE]>());
}

#[test]
fn from_prefix_pads_with_zeros() {
    let b = Block::from_prefix(b"hello");
    assert_eq!(&b.as_bytes()[..5], b"hello");
    assert!(b.as_bytes()[5..].iter().all(|&x| x == 0));
}

#[test]
fn from_prefix_truncates_oversized_input() {
    let data = vec![0x7Fu8; BLOCK_SIZE + 64];
    let b = Block::from_prefix(&data);
    assert!(b.as_bytes().iter().all(|&x| x == 0x7F));
}

#[test]
fn bit_set_roundtrip_and_bit_order() {
    let mut b = Block::zero();

    b.set_bit(0, true);
    assert!(b.bit(0));
    assert_eq!(b.as_bytes()[0], 0b0000_0001);

    b.set_bit(7, true);
    assert_eq!(b.as_bytes()[0], 0b1000_0001);

    b.set_bit(8, true);
    assert!(b.bit(8));
    assert_eq!(b.as_bytes()[1], 0b0000_0001);

    b.set_bit(7, false);
    assert!(!b.bit(7));
    assert_eq!(b.as_bytes()[0], 0b0000_0001);
}

#[test]
fn last_bit_is_addressable() {
    let mut b = Block::zero();
    let last = BLOCK_SIZE * 8 - 1;
    b.set_bit(last, true);
    assert!(b.bit(last));
    assert_eq!(b.as_bytes()[BLOCK_SIZE - 1], 0b1000_0000);
}

#[test]
fn words_are_little_endian() {
    let mut b = Block::zero();
    b.put_u32(4, 0x0403_0201);
    assert_eq!(&b.as_bytes()[4..8], &[1, 2, 3, 4]);
    assert_eq!(b.u32_at(4), 0x0403_0201);
}

#[test]
fn block_id_array_roundtrip_zero_fills_tail() {
    let ids = [900u32, 901, 77];
    let b = Block::from_block_ids(&ids);
    let back = b.block_ids();
    assert_eq!(&back[..3], &ids);
    assert!(back[3..].iter().all(|&id| id == 0));
}
