//! On-disk format: block buffers, superblock geometry and inode records.

pub mod block;
pub mod inode;
pub mod superblock;

/// Bytes per block.
pub const BLOCK_SIZE: usize = 512;
/// Default disk size in blocks (16 MiB).
pub const DEFAULT_BLOCK_COUNT: u32 = 32 * 1024;
/// Default number of inode slots. Slot 0 is never a valid inode.
pub const DEFAULT_INODE_COUNT: u32 = 1024;
/// Direct block pointers per inode.
pub const NDIRECT: usize = 32;
/// Width of a block id inside an indirect block.
pub const BLOCK_ID_WIDTH: usize = size_of::<u32>();
/// Block ids listed by one indirect block.
pub const NINDIRECT: usize = BLOCK_SIZE / BLOCK_ID_WIDTH;
/// Largest number of data blocks a single inode can reference.
pub const MAX_FILE_BLOCKS: usize = NDIRECT + NINDIRECT;
/// Hard capacity ceiling of one file in bytes.
pub const MAX_FILE_SIZE: usize = MAX_FILE_BLOCKS * BLOCK_SIZE;
/// Bytes of direct capacity; past this the indirect block is in use.
pub const DIRECT_CAPACITY: usize = NDIRECT * BLOCK_SIZE;
/// Bitmap bits stored per bitmap block.
pub const BITS_PER_BLOCK: u32 = (BLOCK_SIZE * 8) as u32;
/// Pointer value meaning "no block".
pub const NO_BLOCK: u32 = 0;
/// Inode reserved for the root directory; always the first one allocated.
pub const ROOT_INUM: u32 = 1;

/// Number of blocks needed to hold `bytes`.
#[inline]
#[must_use]
pub const fn blocks_for(bytes: usize) -> usize {
    bytes.div_ceil(BLOCK_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_constants_are_consistent() {
        assert_eq!(NINDIRECT, 128);
        assert_eq!(MAX_FILE_BLOCKS, 160);
        assert_eq!(MAX_FILE_SIZE, 81_920);
        assert_eq!(DIRECT_CAPACITY, 16_384);
        assert_eq!(BITS_PER_BLOCK, 4096);
    }

    #[test]
    fn blocks_for_rounds_up() {
        assert_eq!(blocks_for(0), 0);
        assert_eq!(blocks_for(1), 1);
        assert_eq!(blocks_for(BLOCK_SIZE), 1);
        assert_eq!(blocks_for(BLOCK_SIZE + 1), 2);
        assert_eq!(blocks_for(DIRECT_CAPACITY + 100), NDIRECT + 1);
    }
}
