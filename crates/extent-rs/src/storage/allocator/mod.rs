
use std::collections::BTreeSet;

use bitvec::vec::BitVec;
use tracing::trace;

use crate::error::ExtentResult;
use crate::layout::block::Block;
use crate::layout::superblock::Layout;
use crate::layout::BITS_PER_BLOCK;
use crate::storage::disk::BlockDevice;

/// First-fit allocator over the data region.
///
/// The in-memory bitmap is authoritative. Bitmap blocks touched since the last
/// [`BlockAllocator::flush`] are remembered and written back in one pass.
pub struct BlockAllocator {
    layout: Layout,
    used: BitVec,
    free: u32,
    dirty: BTreeSet<u32>,
}

impl BlockAllocator {
    /// Fresh allocator: the reserved prefix is used, every data block is free.
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        let mut used = BitVec::repeat(false, layout.nblocks() as usize);
        used[..layout.data_start as usize].fill(true);
        let dirty = (layout.bitmap_start..layout.bitmap_start + layout.bitmap_blocks).collect();
        Self {
            layout,
            used,
            free: layout.data_blocks(),
            dirty,
        }
    }

    /// Rebuilds allocator state from the bitmap region of `dev`.
    ///
    /// # Errors
    /// Returns an error if a bitmap block cannot be read.
    pub fn load<D: BlockDevice>(layout: Layout, dev: &D) -> ExtentResult<Self> {
        let nblocks = layout.nblocks() as usize;
        let mut used = BitVec::repeat(false, nblocks);
        let mut block = Block::zero();
        for i in 0..layout.bitmap_blocks {
            dev.read_block(layout.bitmap_start + i, &mut block)?;
            let base = (i * BITS_PER_BLOCK) as usize;
            for bit in 0..BITS_PER_BLOCK as usize {
                if base + bit < nblocks && block.bit(bit) {
                    used.set(base + bit, true);
                }
            }
        }
        used[..layout.data_start as usize].fill(true);
        let free = used[layout.data_start as usize..].count_zeros() as u32;
        Ok(Self {
            layout,
            used,
            free,
            dirty: BTreeSet::new(),
        })
    }

    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the lowest free data block and marks it used, or `None` when
    /// the data region is full.
    pub fn alloc_block(&mut self) -> Option<u32> {
        let start = self.layout.data_start as usize;
        let id = start + self.used[start..].first_zero()?;
        self.used.set(id, true);
        self.free -= 1;
        let id = id as u32;
        self.mark_dirty(id);
        trace!(block = id, "alloc_block");
        Some(id)
    }

    /// Clears the used flag of `id`. Free, reserved and out-of-range ids are
    /// ignored.
    pub fn free_block(&mut self, id: u32) {
        if !self.is_used(id) || !self.layout.is_data_block(id) {
            trace!(block = id, "free_block ignored");
            return;
        }
        self.used.set(id as usize, false);
        self.free += 1;
        self.mark_dirty(id);
        trace!(block = id, "free_block");
    }

    #[must_use]
    pub fn is_used(&self, id: u32) -> bool {
        self.used.get(id as usize).is_some_and(|bit| *bit)
    }

    #[must_use]
    pub const fn free_count(&self) -> u32 {
        self.free
    }

    /// Writes every dirty bitmap block to `dev`.
    ///
    /// # Errors
    /// Returns an error if a bitmap block cannot be written.
    pub fn flush<D: BlockDevice>(&mut self, dev: &mut D) -> ExtentResult<()> {
        let nblocks = self.layout.nblocks() as usize;
        while let Some(bitmap_block) = self.dirty.pop_first() {
            let base = ((bitmap_block - self.layout.bitmap_start) * BITS_PER_BLOCK) as usize;
            let end = (base + BITS_PER_BLOCK as usize).min(nblocks);
            let mut block = Block::zero();
            for bit in self.used[base..end].iter_ones() {
                block.set_bit(bit, true);
            }
            if let Err(err) = dev.write_block(bitmap_block, &block) {
                self.dirty.insert(bitmap_block);
                return Err(err);
            }
        }
        Ok(())
    }

    fn mark_dirty(&mut self, id: u32) {
        let (bitmap_block, _) = self.layout.bitmap_position(id);
        self.dirty.insert(bitmap_block);
    }
}
