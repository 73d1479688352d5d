use super::block::Block;
use super::{BLOCK_SIZE, DIRECT_CAPACITY, NDIRECT, NO_BLOCK};

/// Encoded size of one inode record.
pub const INODE_SIZE: usize = 20 + (NDIRECT + 1) * 4;
/// Inode records packed into one inode-table block.
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InodeKind {
    #[default]
    Free,
    Dir,
    File,
    Symlink,
}

impl InodeKind {
    /// Unknown tags decode as `None`; the caller treats that as corruption.
    #[must_use]
    pub const fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(Self::Free),
            1 => Some(Self::Dir),
            2 => Some(Self::File),
            3 => Some(Self::Symlink),
            _ => None,
        }
    }

    #[must_use]
    pub const fn tag(self) -> u16 {
        match self {
            Self::Free => 0,
            Self::Dir => 1,
            Self::File => 2,
            Self::Symlink => 3,
        }
    }
}

/// Detached copy of an inode record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub kind: InodeKind,
    pub size: u32,
    pub atime: u32,
    pub mtime: u32,
    pub ctime: u32,
    pub direct: [u32; NDIRECT],
    pub indirect: u32,
}

impl Default for Inode {
    fn default() -> Self {
        Self {
            kind: InodeKind::Free,
            size: 0,
            atime: 0,
            mtime: 0,
            ctime: 0,
            direct: [NO_BLOCK; NDIRECT],
            indirect: NO_BLOCK,
        }
    }
}

/// Raw record fields as they sit on disk, before the type tag is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInode {
    pub tag: u16,
    pub inode: Inode,
}

impl Inode {
    #[must_use]
    pub fn new(kind: InodeKind, now: u32) -> Self {
        Self {
            kind,
            atime: now,
            mtime: now,
            ctime: now,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_free(&self) -> bool {
        matches!(self.kind, InodeKind::Free)
    }

    /// True once the file has grown past its direct pointers.
    #[inline]
    #[must_use]
    pub const fn uses_indirect(&self) -> bool {
        self.size as usize > DIRECT_CAPACITY
    }

    /// Decodes the record stored at byte `off` of an inode-table block.
    #[must_use]
    pub fn decode(block: &Block, off: usize) -> RawInode {
        let bytes = block.as_bytes();
        let tag = u16::from_le_bytes([bytes[off], bytes[off + 1]]);
        let direct = std::array::from_fn(|i| block.u32_at(off + 20 + i * 4));
        RawInode {
            tag,
            inode: Self {
                kind: InodeKind::from_tag(tag).unwrap_or_default(),
                size: block.u32_at(off + 4),
                atime: block.u32_at(off + 8),
                mtime: block.u32_at(off + 12),
                ctime: block.u32_at(off + 16),
                direct,
                indirect: block.u32_at(off + 20 + NDIRECT * 4),
            },
        }
    }

    /// Encodes the record into byte `off` of an inode-table block, leaving
    /// neighbouring records untouched.
    pub fn encode(&self, block: &mut Block, off: usize) {
        let bytes = block.as_bytes_mut();
        bytes[off..off + INODE_SIZE].fill(0);
        bytes[off..off + 2].copy_from_slice(&self.kind.tag().to_le_bytes());
        block.put_u32(off + 4, self.size);
        block.put_u32(off + 8, self.atime);
        block.put_u32(off + 12, self.mtime);
        block.put_u32(off + 16, self.ctime);
        for (i, id) in self.direct.iter().enumerate() {
            block.put_u32(off + 20 + i * 4, *id);
        }
        block.put_u32(off + 20 + NDIRECT * 4, self.indirect);
    }
}
