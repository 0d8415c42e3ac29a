//! Bit level access to a single 128 bit block.

/// Number of bits in a 16 byte block.
pub const BLOCK_BITS: usize = 128;

/// A 128 bit block together with a bit position.
///
/// Bit 0 is the least significant bit of byte 0. Fields are read and written
/// LSB first, so a field that straddles a byte boundary takes its low bits from
/// the current byte and its high bits from the next one.
///
/// Reads and writes past the end of the block are programmer errors and are
/// only checked with debug assertions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BitCursor {
    block: [u8; 16],
    position: usize,
}

impl BitCursor {
    /// Creates a cursor over a zeroed block, positioned at bit 0.
    pub const fn new() -> Self {
        Self {
            block: [0; 16],
            position: 0,
        }
    }

    /// Creates a cursor over an existing block, positioned at bit 0.
    pub const fn from_block(block: [u8; 16]) -> Self {
        Self { block, position: 0 }
    }

    /// The current bit position.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of bits between the current position and the end of the block.
    #[inline]
    pub const fn remaining(&self) -> usize {
        BLOCK_BITS - self.position
    }

    /// Moves the cursor to an absolute bit position.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        debug_assert!(position <= BLOCK_BITS);
        self.position = position;
    }

    /// The underlying block.
    #[inline]
    pub const fn block(&self) -> &[u8; 16] {
        &self.block
    }

    /// Consumes the cursor and returns the block.
    #[inline]
    pub const fn into_block(self) -> [u8; 16] {
        self.block
    }

    /// Reads a single bit and advances by one.
    #[inline]
    pub fn read_bit(&mut self) -> u8 {
        debug_assert!(self.position < BLOCK_BITS, "bit cursor overrun");
        let index = self.position >> 3;
        let shift = self.position & 7;
        self.position += 1;
        (self.block[index] >> shift) & 1
    }

    /// Reads `count` bits (at most 8) and advances by `count`.
    pub fn read_bits(&mut self, count: usize) -> u8 {
        if count == 0 {
            return 0;
        }
        debug_assert!(count <= 8, "field wider than 8 bits");
        debug_assert!(self.position + count <= BLOCK_BITS, "bit cursor overrun");

        let index = self.position >> 3;
        let base = self.position & 7;
        let value = if base + count > 8 {
            let first_bits = 8 - base;
            let next_bits = count - first_bits;
            let low = u32::from(self.block[index]) >> base;
            let high = u32::from(self.block[index + 1]) & ((1 << next_bits) - 1);
            (low | (high << first_bits)) as u8
        } else {
            ((u32::from(self.block[index]) >> base) & ((1 << count) - 1)) as u8
        };

        self.position += count;
        value
    }

    /// Writes a single bit and advances by one.
    #[inline]
    pub fn write_bit(&mut self, value: u8) {
        debug_assert!(self.position < BLOCK_BITS, "bit cursor overrun");
        let index = self.position >> 3;
        let shift = self.position & 7;
        self.block[index] &= !(1 << shift);
        self.block[index] |= (value & 1) << shift;
        self.position += 1;
    }

    /// Writes the low `count` bits (at most 8) of `value` and advances by `count`.
    ///
    /// The target bits are cleared first, so the cursor can overwrite a block
    /// that already holds data.
    pub fn write_bits(&mut self, count: usize, value: u8) {
        if count == 0 {
            return;
        }
        debug_assert!(count <= 8, "field wider than 8 bits");
        debug_assert!(self.position + count <= BLOCK_BITS, "bit cursor overrun");

        let value = u32::from(value) & ((1 << count) - 1);
        let index = self.position >> 3;
        let base = self.position & 7;

        if base + count > 8 {
            let first_bits = 8 - base;
            let next_bits = count - first_bits;

            let first_mask = ((1u32 << first_bits) - 1) << base;
            self.block[index] = ((u32::from(self.block[index]) & !first_mask)
                | ((value << base) & first_mask)) as u8;

            let next_mask = (1u32 << next_bits) - 1;
            self.block[index + 1] = ((u32::from(self.block[index + 1]) & !next_mask)
                | (value >> first_bits)) as u8;
        } else {
            let mask = ((1u32 << count) - 1) << base;
            self.block[index] =
                ((u32::from(self.block[index]) & !mask) | (value << base)) as u8;
        }

        self.position += count;
    }
}
