//! Fixed-size block buffer with bit and block-id helpers.

#[cfg(test)]
mod block_tests;

use super::{BLOCK_ID_WIDTH, BLOCK_SIZE, NINDIRECT};

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
/// Block holds exactly one block's worth of bytes.
pub struct Block(pub [u8; BLOCK_SIZE]);

impl Default for Block {
    fn default() -> Self {
        Self::zero()
    }
}

impl Block {
    #[inline]
    #[must_use]
    /// `zero` returns a zero-filled block.
    pub const fn zero() -> Self {
        Self([0u8; BLOCK_SIZE])
    }

    /// `from_prefix` copies up to one block of `data` and zero-pads the rest.
    #[must_use]
    pub fn from_prefix(data: &[u8]) -> Self {
        let mut block = Self::zero();
        let n = data.len().min(BLOCK_SIZE);
        block.0[..n].copy_from_slice(&data[..n]);
        block
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }

    #[inline]
    pub const fn as_bytes_mut(&mut self) -> &mut [u8; BLOCK_SIZE] {
        &mut self.0
    }

    #[inline]
    #[must_use]
    /// `bit` returns the bit at index `i`, LSB-first within each byte.
    pub const fn bit(&self, i: usize) -> bool {
        let (byte, bit) = (i >> 3, i & 7);
        (self.0[byte] >> bit) & 1 == 1
    }

    #[inline]
    /// `set_bit` updates the bit at index `i`.
    pub const fn set_bit(&mut self, i: usize, val: bool) {
        let (byte, bit) = (i >> 3, i & 7);
        let m = 1u8 << bit;
        if val {
            self.0[byte] |= m;
        } else {
            self.0[byte] &= !m;
        }
    }

    /// `u32_at` reads the little-endian word starting at byte `off`.
    #[inline]
    #[must_use]
    pub fn u32_at(&self, off: usize) -> u32 {
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.0[off..off + 4]);
        u32::from_le_bytes(word)
    }

    #[inline]
    pub fn put_u32(&mut self, off: usize, val: u32) {
        self.0[off..off + 4].copy_from_slice(&val.to_le_bytes());
    }

    /// `block_ids` reinterprets the block as an indirect pointer array.
    #[must_use]
    pub fn block_ids(&self) -> [u32; NINDIRECT] {
        std::array::from_fn(|i| self.u32_at(i * BLOCK_ID_WIDTH))
    }

    /// `from_block_ids` packs `ids` into a block, zero-filling unused slots.
    #[must_use]
    pub fn from_block_ids(ids: &[u32]) -> Self {
        let mut block = Self::zero();
        for (i, id) in ids.iter().take(NINDIRECT).enumerate() {
            block.put_u32(i * BLOCK_ID_WIDTH, *id);
        }
        block
    }
}
