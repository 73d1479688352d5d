use crate::layout::superblock::Layout;
use crate::layout::{DEFAULT_BLOCK_COUNT, DEFAULT_INODE_COUNT};

/// Construction-time parameters of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub block_count: u32,
    pub inode_count: u32,
    /// When the inode table is exhausted, hand out inode 1 (the root) instead
    /// of failing. Every occurrence is logged at warn level.
    pub legacy_root_alias: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            block_count: DEFAULT_BLOCK_COUNT,
            inode_count: DEFAULT_INODE_COUNT,
            legacy_root_alias: false,
        }
    }
}

impl EngineConfig {
    /// # Errors
    /// Returns an error if the geometry cannot hold a usable disk.
    pub fn validate(&self) -> anyhow::Result<Layout> {
        Layout::new(self.block_count, self.inode_count)
    }
}
