//! Extent engine: maps whole-file reads and resizing writes onto direct and
//! indirect block pointers.

#[cfg(test)]
mod boundary_tests;

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{ExtentError, ExtentResult};
use crate::layout::block::Block;
use crate::layout::inode::{Inode, InodeKind};
use crate::layout::superblock::Layout;
use crate::layout::{
    BLOCK_SIZE, MAX_FILE_SIZE, NDIRECT, NINDIRECT, NO_BLOCK, ROOT_INUM, blocks_for,
};
use crate::metrics::{self, ExtentOp, ExtentOpType};
use crate::storage::allocator::BlockAllocator;
use crate::storage::disk::{BlockDevice, MemDisk};
use crate::storage::inode_table::InodeTable;

/// Attributes reported by `getattr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    pub kind: InodeKind,
    pub size: u32,
    pub atime: u32,
    pub mtime: u32,
    pub ctime: u32,
}

impl Attr {
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.kind, InodeKind::File)
    }

    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, InodeKind::Dir)
    }

    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        matches!(self.kind, InodeKind::Symlink)
    }
}

impl From<&Inode> for Attr {
    fn from(inode: &Inode) -> Self {
        Self {
            kind: inode.kind,
            size: inode.size,
            atime: inode.atime,
            mtime: inode.mtime,
            ctime: inode.ctime,
        }
    }
}

/// The id-addressed interface the naming layer talks to.
pub trait ExtentStore {
    /// # Errors
    /// Fails when the inode table is exhausted or `kind` is the free tag.
    fn create(&mut self, kind: InodeKind) -> ExtentResult<u32>;

    /// # Errors
    /// Returns [`ExtentError::NotFound`] for a missing inode.
    fn get(&self, inum: u32) -> ExtentResult<Vec<u8>>;

    /// # Errors
    /// Returns [`ExtentError::NotFound`] for a missing inode, or an allocation
    /// error; a failed put leaves the file unchanged.
    fn put(&mut self, inum: u32, data: &[u8]) -> ExtentResult<()>;

    /// # Errors
    /// Returns [`ExtentError::NotFound`] for a missing inode.
    fn getattr(&self, inum: u32) -> ExtentResult<Attr>;

    /// Removing a missing inode succeeds without doing anything.
    ///
    /// # Errors
    /// Returns a store error.
    fn remove(&mut self, inum: u32) -> ExtentResult<()>;
}

/// Single-threaded storage engine. Callers must serialize access.
pub struct ExtentEngine<D: BlockDevice = MemDisk> {
    dev: D,
    alloc: BlockAllocator,
    inodes: InodeTable,
}

impl ExtentEngine<MemDisk> {
    /// Formats a fresh in-memory disk and creates the root directory.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or formatting fails.
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let layout = config.validate()?;
        let dev = MemDisk::new(layout.nblocks())?;
        Self::format(dev, layout, config.legacy_root_alias)
    }
}

impl<D: BlockDevice> ExtentEngine<D> {
    /// Lays out superblock, bitmap and inode table on `dev` and allocates the
    /// root directory, which must come out as inode 1.
    ///
    /// # Errors
    /// Returns an error if `dev` is smaller than the layout or a write fails.
    pub fn format(mut dev: D, layout: Layout, legacy_root_alias: bool) -> anyhow::Result<Self> {
        if dev.block_count() < layout.nblocks() {
            anyhow::bail!(
                "device has {} blocks, layout needs {}",
                dev.block_count(),
                layout.nblocks()
            );
        }
        dev.write_block(0, &layout.superblock.to_block())
            .map_err(|err| anyhow::anyhow!("failed to write superblock: {err}"))?;
        let zero = Block::zero();
        for id in layout.inode_table_start..layout.data_start {
            dev.write_block(id, &zero)
                .map_err(|err| anyhow::anyhow!("failed to clear inode table: {err}"))?;
        }

        let mut engine = Self {
            dev,
            alloc: BlockAllocator::new(layout),
            inodes: InodeTable::new(layout, legacy_root_alias),
        };
        let root = engine
            .inodes
            .alloc_inode(&mut engine.dev, InodeKind::Dir, unix_now())
            .map_err(|err| anyhow::anyhow!("failed to allocate root inode: {err}"))?;
        if root != ROOT_INUM {
            anyhow::bail!("first inode allocated as {root}, root must be {ROOT_INUM}");
        }
        engine
            .alloc
            .flush(&mut engine.dev)
            .map_err(|err| anyhow::anyhow!("failed to write bitmap: {err}"))?;
        debug!(
            nblocks = layout.nblocks(),
            ninodes = layout.ninodes(),
            data_start = layout.data_start,
            "formatted"
        );
        Ok(engine)
    }

    #[must_use]
    pub const fn layout(&self) -> &Layout {
        self.alloc.layout()
    }

    #[must_use]
    pub const fn allocator(&self) -> &BlockAllocator {
        &self.alloc
    }

    #[must_use]
    pub const fn device(&self) -> &D {
        &self.dev
    }

    /// Allocates an inode of `kind`.
    ///
    /// # Errors
    /// See [`InodeTable::alloc_inode`].
    pub fn alloc_inode(&mut self, kind: InodeKind) -> ExtentResult<u32> {
        self.inodes.alloc_inode(&mut self.dev, kind, unix_now())
    }

    /// # Errors
    /// See [`InodeTable::get_inode`].
    pub fn get_inode(&self, inum: u32) -> ExtentResult<Inode> {
        self.inodes.get_inode(&self.dev, inum)
    }

    /// Returns the whole contents of `inum`. An empty file yields an empty
    /// vector, never `NotFound`.
    ///
    /// # Errors
    /// Returns [`ExtentError::NotFound`] for a missing inode and
    /// [`ExtentError::Corrupt`] if the record points outside the data region.
    pub fn read_file(&self, inum: u32) -> ExtentResult<Vec<u8>> {
        let inode = self.get_inode(inum)?;
        let size = inode.size as usize;
        let blocks = self.block_map(inum, &inode)?;

        let mut out = Vec::with_capacity(size);
        let mut block = Block::zero();
        for id in blocks {
            self.dev.read_block(id, &mut block)?;
            let take = (size - out.len()).min(BLOCK_SIZE);
            out.extend_from_slice(&block.as_bytes()[..take]);
        }
        Ok(out)
    }

    /// Replaces the contents of `inum` with `data`, growing or shrinking the
    /// block map to `ceil(len / BLOCK_SIZE)` blocks.
    ///
    /// All allocations are checked up front, so a write that cannot fit leaves
    /// the file and the allocator untouched.
    ///
    /// # Errors
    /// Returns [`ExtentError::NotFound`], [`ExtentError::FileTooLarge`],
    /// [`ExtentError::NoSpace`] or a store error.
    pub fn write_file(&mut self, inum: u32, data: &[u8]) -> ExtentResult<()> {
        let mut inode = self.get_inode(inum)?;
        if data.len() > MAX_FILE_SIZE {
            return Err(ExtentError::FileTooLarge(data.len()));
        }
        let mut blocks = self.block_map(inum, &inode)?;
        let had = blocks.len();
        let need = blocks_for(data.len());

        let needs_indirect = need > NDIRECT && had <= NDIRECT;
        let needed = need.saturating_sub(had) + usize::from(needs_indirect);
        if needed > self.alloc.free_count() as usize {
            return Err(ExtentError::NoSpace {
                needed: needed as u32,
                free: self.alloc.free_count(),
            });
        }

        for id in blocks.drain(need.min(had)..) {
            self.alloc.free_block(id);
        }
        if need <= NDIRECT && inode.indirect != NO_BLOCK {
            if had > NDIRECT {
                self.alloc.free_block(inode.indirect);
            }
            inode.indirect = NO_BLOCK;
        }
        while blocks.len() < need {
            if blocks.len() == NDIRECT && needs_indirect {
                inode.indirect = self.take_block()?;
            }
            blocks.push(self.take_block()?);
        }

        for (id, chunk) in blocks.iter().zip(data.chunks(BLOCK_SIZE)) {
            self.dev.write_block(*id, &Block::from_prefix(chunk))?;
        }

        inode.direct = [NO_BLOCK; NDIRECT];
        let direct = need.min(NDIRECT);
        inode.direct[..direct].copy_from_slice(&blocks[..direct]);
        if need > NDIRECT {
            self.dev
                .write_block(inode.indirect, &Block::from_block_ids(&blocks[NDIRECT..]))?;
        }

        let now = unix_now();
        inode.size = data.len() as u32;
        inode.mtime = now;
        inode.ctime = now;
        self.inodes.put_inode(&mut self.dev, inum, &inode)?;
        self.alloc.flush(&mut self.dev)?;
        debug!(inum, had, need, size = data.len(), "write_file");
        Ok(())
    }

    /// Frees every block reachable from `inum`, then the inode itself.
    /// Missing inodes are ignored.
    ///
    /// # Errors
    /// Returns a store error or [`ExtentError::Corrupt`].
    pub fn remove_file(&mut self, inum: u32) -> ExtentResult<()> {
        let inode = match self.get_inode(inum) {
            Ok(inode) => inode,
            Err(ExtentError::NotFound(_)) => return Ok(()),
            Err(err) => return Err(err),
        };
        let blocks = self.block_map(inum, &inode)?;
        for id in &blocks {
            self.alloc.free_block(*id);
        }
        self.inodes.free_inode(&mut self.dev, &mut self.alloc, inum)?;
        self.alloc.flush(&mut self.dev)?;
        debug!(inum, freed = blocks.len(), "remove_file");
        Ok(())
    }

    /// # Errors
    /// Returns [`ExtentError::NotFound`] for a missing inode.
    pub fn getattr(&self, inum: u32) -> ExtentResult<Attr> {
        self.get_inode(inum).map(|inode| Attr::from(&inode))
    }

    /// Physical block ids of the file in logical order: direct pointers, then
    /// the ids listed by the indirect block. The size field and every pointer
    /// are validated before anything is sized from them.
    fn block_map(&self, inum: u32, inode: &Inode) -> ExtentResult<Vec<u32>> {
        let size = inode.size as usize;
        if size > MAX_FILE_SIZE {
            return Err(ExtentError::Corrupt {
                inum,
                reason: "size exceeds file capacity",
            });
        }
        let count = blocks_for(size);
        let mut blocks = Vec::with_capacity(count);
        blocks.extend_from_slice(&inode.direct[..count.min(NDIRECT)]);
        if count > NDIRECT {
            self.check_pointer(inum, inode.indirect)?;
            let mut indirect = Block::zero();
            self.dev.read_block(inode.indirect, &mut indirect)?;
            let ids = indirect.block_ids();
            blocks.extend_from_slice(&ids[..(count - NDIRECT).min(NINDIRECT)]);
        }
        for id in &blocks {
            self.check_pointer(inum, *id)?;
        }
        Ok(blocks)
    }

    const fn check_pointer(&self, inum: u32, id: u32) -> ExtentResult<()> {
        if self.alloc.layout().is_data_block(id) {
            Ok(())
        } else {
            Err(ExtentError::Corrupt {
                inum,
                reason: "block pointer outside data region",
            })
        }
    }

    fn take_block(&mut self) -> ExtentResult<u32> {
        self.alloc.alloc_block().ok_or(ExtentError::NoSpace {
            needed: 1,
            free: 0,
        })
    }

    fn observe<T>(
        op: ExtentOpType,
        inum: u32,
        started: Option<Instant>,
        res: &ExtentResult<T>,
        bytes: impl FnOnce(&T) -> usize,
    ) {
        let Some(started) = started else {
            return;
        };
        metrics::record_extent_op(ExtentOp {
            op,
            inum,
            bytes: res.as_ref().map_or(0, |v| bytes(v) as u64),
            latency_seconds: started.elapsed().as_secs_f64(),
            error: res.is_err(),
        });
    }
}

impl<D: BlockDevice> ExtentStore for ExtentEngine<D> {
    fn create(&mut self, kind: InodeKind) -> ExtentResult<u32> {
        let started = metrics::is_enabled().then(Instant::now);
        let res = self.alloc_inode(kind);
        let inum = res.as_ref().copied().unwrap_or(0);
        Self::observe(ExtentOpType::Create, inum, started, &res, |_| 0);
        res
    }

    fn get(&self, inum: u32) -> ExtentResult<Vec<u8>> {
        let started = metrics::is_enabled().then(Instant::now);
        let res = self.read_file(inum);
        Self::observe(ExtentOpType::Get, inum, started, &res, Vec::len);
        res
    }

    fn put(&mut self, inum: u32, data: &[u8]) -> ExtentResult<()> {
        let started = metrics::is_enabled().then(Instant::now);
        let res = self.write_file(inum, data);
        Self::observe(ExtentOpType::Put, inum, started, &res, |_| data.len());
        res
    }

    fn getattr(&self, inum: u32) -> ExtentResult<Attr> {
        let started = metrics::is_enabled().then(Instant::now);
        let res = Self::getattr(self, inum);
        Self::observe(ExtentOpType::Getattr, inum, started, &res, |_| 0);
        res
    }

    fn remove(&mut self, inum: u32) -> ExtentResult<()> {
        let started = metrics::is_enabled().then(Instant::now);
        let res = self.remove_file(inum);
        Self::observe(ExtentOpType::Remove, inum, started, &res, |_| 0);
        res
    }
}

fn unix_now() -> u32 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    u32::try_from(secs).unwrap_or(u32::MAX)
}
