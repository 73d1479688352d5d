
use tracing::{debug, warn};

use crate::error::{ExtentError, ExtentResult};
use crate::layout::ROOT_INUM;
use crate::layout::block::Block;
use crate::layout::inode::{Inode, InodeKind, RawInode};
use crate::layout::superblock::Layout;
use crate::storage::allocator::BlockAllocator;
use crate::storage::disk::BlockDevice;

/// Packed array of inode records living in the inode-table region.
pub struct InodeTable {
    layout: Layout,
    legacy_root_alias: bool,
}

impl InodeTable {
    #[must_use]
    pub const fn new(layout: Layout, legacy_root_alias: bool) -> Self {
        Self {
            layout,
            legacy_root_alias,
        }
    }

    /// First slot scanned when allocating `kind`. Files never start at the
    /// root slot, so only a directory allocation can ever claim inode 1.
    #[must_use]
    pub const fn scan_start(kind: InodeKind) -> u32 {
        match kind {
            InodeKind::File => ROOT_INUM + 1,
            _ => ROOT_INUM,
        }
    }

    /// Claims the first free slot for `kind` and returns its id.
    ///
    /// # Errors
    /// Returns [`ExtentError::InodeTableFull`] when no slot is free (unless the
    /// legacy root alias is enabled), [`ExtentError::InvalidKind`] for the free
    /// tag, or a store error.
    pub fn alloc_inode<D: BlockDevice>(
        &self,
        dev: &mut D,
        kind: InodeKind,
        now: u32,
    ) -> ExtentResult<u32> {
        if kind == InodeKind::Free {
            return Err(ExtentError::InvalidKind);
        }
        for inum in Self::scan_start(kind)..self.layout.ninodes() {
            if self.read_raw(dev, inum)?.tag == InodeKind::Free.tag() {
                self.put_inode(dev, inum, &Inode::new(kind, now))?;
                debug!(inum, ?kind, "alloc_inode");
                return Ok(inum);
            }
        }
        if self.legacy_root_alias {
            warn!(
                ?kind,
                "inode table exhausted; aliasing new inode to root {ROOT_INUM}"
            );
            return Ok(ROOT_INUM);
        }
        Err(ExtentError::InodeTableFull)
    }

    /// Returns a detached copy of inode `inum`.
    ///
    /// # Errors
    /// Returns [`ExtentError::NotFound`] for out-of-range or free slots and
    /// [`ExtentError::Corrupt`] for an unknown type tag.
    pub fn get_inode<D: BlockDevice>(&self, dev: &D, inum: u32) -> ExtentResult<Inode> {
        let raw = self.read_raw(dev, inum)?;
        if InodeKind::from_tag(raw.tag).is_none() {
            return Err(ExtentError::Corrupt {
                inum,
                reason: "unknown type tag",
            });
        }
        if raw.inode.is_free() {
            return Err(ExtentError::NotFound(inum));
        }
        Ok(raw.inode)
    }

    /// Overwrites the whole record at `inum`.
    ///
    /// # Errors
    /// Returns [`ExtentError::NotFound`] for out-of-range ids or a store error.
    pub fn put_inode<D: BlockDevice>(
        &self,
        dev: &mut D,
        inum: u32,
        inode: &Inode,
    ) -> ExtentResult<()> {
        self.check_range(inum)?;
        let (block_id, off) = self.layout.inode_position(inum);
        let mut block = Block::zero();
        dev.read_block(block_id, &mut block)?;
        inode.encode(&mut block, off);
        dev.write_block(block_id, &block)
    }

    /// Clears the record at `inum`, releasing its indirect block if the file
    /// had grown past its direct pointers. Missing inodes are ignored.
    ///
    /// # Errors
    /// Returns a store error or [`ExtentError::Corrupt`].
    pub fn free_inode<D: BlockDevice>(
        &self,
        dev: &mut D,
        alloc: &mut BlockAllocator,
        inum: u32,
    ) -> ExtentResult<()> {
        let inode = match self.get_inode(dev, inum) {
            Ok(inode) => inode,
            Err(ExtentError::NotFound(_)) => return Ok(()),
            Err(err) => return Err(err),
        };
        if inode.uses_indirect() {
            alloc.free_block(inode.indirect);
        }
        self.put_inode(dev, inum, &Inode::default())?;
        debug!(inum, "free_inode");
        Ok(())
    }

    fn read_raw<D: BlockDevice>(&self, dev: &D, inum: u32) -> ExtentResult<RawInode> {
        self.check_range(inum)?;
        let (block_id, off) = self.layout.inode_position(inum);
        let mut block = Block::zero();
        dev.read_block(block_id, &mut block)?;
        Ok(Inode::decode(&block, off))
    }

    const fn check_range(&self, inum: u32) -> ExtentResult<()> {
        if inum < ROOT_INUM || inum >= self.layout.ninodes() {
            return Err(ExtentError::NotFound(inum));
        }
        Ok(())
    }
}
