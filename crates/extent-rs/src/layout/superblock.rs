use super::block::Block;
use super::inode::INODES_PER_BLOCK;
use super::{BITS_PER_BLOCK, BLOCK_SIZE};

/// On-disk format
///
/// Layout is block-based with BLOCK_SIZE (512) blocks.
///
/// Block 0: superblock
/// - size: u32 (total bytes)
/// - nblocks: u32
/// - ninodes: u32
///
/// Blocks 1..: bitmap, 1 bit per block of the whole disk (LSB-first)
///
/// Next: inode table (INODES_PER_BLOCK fixed-size records per block)
///
/// Remaining: data blocks (file contents and indirect pointer arrays)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub size: u32,
    pub nblocks: u32,
    pub ninodes: u32,
}

impl Superblock {
    #[must_use]
    pub fn from_block(block: &Block) -> Self {
        Self {
            size: block.u32_at(0),
            nblocks: block.u32_at(4),
            ninodes: block.u32_at(8),
        }
    }

    #[must_use]
    pub fn to_block(&self) -> Block {
        let mut block = Block::zero();
        block.put_u32(0, self.size);
        block.put_u32(4, self.nblocks);
        block.put_u32(8, self.ninodes);
        block
    }
}

/// Region boundaries derived from the superblock. Both the allocator and the
/// inode table size themselves from this one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub superblock: Superblock,
    pub bitmap_start: u32,
    pub bitmap_blocks: u32,
    pub inode_table_start: u32,
    pub inode_table_blocks: u32,
    pub data_start: u32,
}

impl Layout {
    /// Computes the layout for a disk of `nblocks` blocks and `ninodes` slots.
    ///
    /// # Errors
    /// Returns an error if the geometry leaves no data region or overflows.
    pub fn new(nblocks: u32, ninodes: u32) -> anyhow::Result<Self> {
        if ninodes < 3 {
            anyhow::bail!("inode table needs room for the root and one more inode, got {ninodes}");
        }
        let size = nblocks
            .checked_mul(BLOCK_SIZE as u32)
            .ok_or_else(|| anyhow::anyhow!("disk of {nblocks} blocks exceeds addressable size"))?;
        let bitmap_start = 1u32;
        let bitmap_blocks = nblocks.div_ceil(BITS_PER_BLOCK);
        let inode_table_start = bitmap_start + bitmap_blocks;
        let inode_table_blocks = ninodes.div_ceil(INODES_PER_BLOCK as u32);
        let data_start = inode_table_start
            .checked_add(inode_table_blocks)
            .ok_or_else(|| anyhow::anyhow!("inode table of {ninodes} slots overflows"))?;
        if data_start >= nblocks {
            anyhow::bail!(
                "no data region: metadata needs {data_start} blocks, disk has {nblocks}"
            );
        }
        Ok(Self {
            superblock: Superblock {
                size,
                nblocks,
                ninodes,
            },
            bitmap_start,
            bitmap_blocks,
            inode_table_start,
            inode_table_blocks,
            data_start,
        })
    }

    #[inline]
    #[must_use]
    pub const fn nblocks(&self) -> u32 {
        self.superblock.nblocks
    }

    #[inline]
    #[must_use]
    pub const fn ninodes(&self) -> u32 {
        self.superblock.ninodes
    }

    #[inline]
    #[must_use]
    pub const fn data_blocks(&self) -> u32 {
        self.superblock.nblocks - self.data_start
    }

    #[inline]
    #[must_use]
    pub const fn is_data_block(&self, id: u32) -> bool {
        id >= self.data_start && id < self.superblock.nblocks
    }

    /// Block holding inode `inum` and the byte offset of its record there.
    #[inline]
    #[must_use]
    pub const fn inode_position(&self, inum: u32) -> (u32, usize) {
        let per_block = INODES_PER_BLOCK as u32;
        (
            self.inode_table_start + inum / per_block,
            (inum % per_block) as usize * super::inode::INODE_SIZE,
        )
    }

    /// Bitmap block holding the used bit of `id` and the bit index inside it.
    #[inline]
    #[must_use]
    pub const fn bitmap_position(&self, id: u32) -> (u32, usize) {
        (
            self.bitmap_start + id / BITS_PER_BLOCK,
            (id % BITS_PER_BLOCK) as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DEFAULT_BLOCK_COUNT, DEFAULT_INODE_COUNT};

    #[test]
    fn default_geometry_matches_formula() {
        let layout = Layout::new(DEFAULT_BLOCK_COUNT, DEFAULT_INODE_COUNT).expect("layout");
        assert_eq!(layout.bitmap_start, 1);
        assert_eq!(layout.bitmap_blocks, 8);
        assert_eq!(layout.inode_table_start, 9);
        assert_eq!(layout.inode_table_blocks, 342);
        assert_eq!(layout.data_start, 351);
        assert_eq!(layout.superblock.size, 16 * 1024 * 1024);
        assert_eq!(layout.data_blocks(), DEFAULT_BLOCK_COUNT - 351);
    }

    #[test]
    fn inode_positions_pack_three_per_block() {
        let layout = Layout::new(256, 16).expect("layout");
        assert_eq!(layout.inode_position(0), (layout.inode_table_start, 0));
        assert_eq!(layout.inode_position(1), (layout.inode_table_start, 152));
        assert_eq!(layout.inode_position(2), (layout.inode_table_start, 304));
        assert_eq!(layout.inode_position(3), (layout.inode_table_start + 1, 0));
        let (last_block, _) = layout.inode_position(15);
        assert!(last_block < layout.data_start);
    }

    #[test]
    fn bitmap_positions_span_blocks() {
        let layout = Layout::new(10_000, 16).expect("layout");
        assert_eq!(layout.bitmap_blocks, 3);
        assert_eq!(layout.bitmap_position(0), (1, 0));
        assert_eq!(layout.bitmap_position(4095), (1, 4095));
        assert_eq!(layout.bitmap_position(4096), (2, 0));
    }

    #[test]
    fn data_region_bounds() {
        let layout = Layout::new(256, 16).expect("layout");
        assert!(!layout.is_data_block(0));
        assert!(!layout.is_data_block(layout.data_start - 1));
        assert!(layout.is_data_block(layout.data_start));
        assert!(layout.is_data_block(255));
        assert!(!layout.is_data_block(256));
    }

    #[test]
    fn rejects_geometry_without_data_region() {
        let err = Layout::new(8, 64).unwrap_err();
        assert!(err.to_string().contains("no data region"));
    }

    #[test]
    fn rejects_tiny_inode_table() {
        assert!(Layout::new(256, 2).is_err());
    }

    #[test]
    fn rejects_byte_size_overflow() {
        let err = Layout::new(u32::MAX, 16).unwrap_err();
        assert!(err.to_string().contains("exceeds addressable size"));
    }

    #[test]
    fn superblock_block_roundtrip() {
        let sb = Superblock {
            size: 131_072,
            nblocks: 256,
            ninodes: 16,
        };
        let block = sb.to_block();
        assert_eq!(block.u32_at(4), 256);
        assert_eq!(Superblock::from_block(&block), sb);
    }
}
