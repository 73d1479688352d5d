//! Storage primitives beneath the extent engine: the block store, the block
//! allocator and the inode table.

pub mod allocator;
pub mod disk;
pub mod inode_table;
