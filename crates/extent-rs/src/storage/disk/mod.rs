#[cfg(test)]
mod disk_tests;

use std::ops::Range;

use memmap2::MmapMut;

use crate::error::{ExtentError, ExtentResult};
use crate::layout::BLOCK_SIZE;
use crate::layout::block::Block;
use crate::metrics::{self, BlockOp, IoOpType};

/// Raw block storage addressed by block id. Out-of-range ids are rejected.
///
/// A backend with transient failures applies its own retry policy inside these
/// calls; the engine above never retries.
pub trait BlockDevice {
    fn block_count(&self) -> u32;

    /// # Errors
    /// Returns [`ExtentError::BlockOutOfRange`] if `id` is not on the device.
    fn read_block(&self, id: u32, buf: &mut Block) -> ExtentResult<()>;

    /// # Errors
    /// Returns [`ExtentError::BlockOutOfRange`] if `id` is not on the device.
    fn write_block(&mut self, id: u32, buf: &Block) -> ExtentResult<()>;
}

/// Volatile block store backed by an anonymous memory mapping. Contents start
/// zeroed and are gone when the value is dropped.
pub struct MemDisk {
    map: MmapMut,
    nblocks: u32,
}

impl MemDisk {
    /// # Errors
    /// Returns an error if the disk is empty or the mapping cannot be created.
    pub fn new(nblocks: u32) -> anyhow::Result<Self> {
        if nblocks == 0 {
            anyhow::bail!("disk must have at least one block");
        }
        let len = usize::try_from(nblocks)
            .ok()
            .and_then(|n| n.checked_mul(BLOCK_SIZE))
            .ok_or_else(|| anyhow::anyhow!("disk of {nblocks} blocks exceeds addressable size"))?;
        let map = MmapMut::map_anon(len)?;
        Ok(Self { map, nblocks })
    }

    fn span(&self, id: u32) -> ExtentResult<Range<usize>> {
        if id >= self.nblocks {
            return Err(ExtentError::BlockOutOfRange(id));
        }
        let start = id as usize * BLOCK_SIZE;
        Ok(start..start + BLOCK_SIZE)
    }
}

impl BlockDevice for MemDisk {
    fn block_count(&self) -> u32 {
        self.nblocks
    }

    fn read_block(&self, id: u32, buf: &mut Block) -> ExtentResult<()> {
        let span = self.span(id)?;
        buf.as_bytes_mut().copy_from_slice(&self.map[span]);
        metrics::record_block_op(BlockOp {
            block: id,
            op: IoOpType::Read,
        });
        Ok(())
    }

    fn write_block(&mut self, id: u32, buf: &Block) -> ExtentResult<()> {
        let span = self.span(id)?;
        self.map[span].copy_from_slice(buf.as_bytes());
        metrics::record_block_op(BlockOp {
            block: id,
            op: IoOpType::Write,
        });
        Ok(())
    }
}
