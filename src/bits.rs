//! MSB-first bit packing.

use crate::error::{Error, Result};

/// Packs bits into bytes, most significant bit first, counting every bit.
#[derive(Default, Debug)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: u64,
}

impl BitWriter {
    /// Empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one bit.
    pub fn push_bit(&mut self, bit: bool) {
        let offset = (self.bit_len % 8) as u32;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.bit_len += 1;
    }

    /// Append a run of bits in order.
    pub fn push_bits(&mut self, bits: &[bool]) {
        for &b in bits {
            self.push_bit(b);
        }
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// Finish, returning `(bytes, bit_len)`. The unused low bits of the last byte are zero.
    pub fn finish(self) -> (Vec<u8>, u64) {
        (self.bytes, self.bit_len)
    }
}

/// Reads the first `bit_len` bits of a byte slice, most significant bit first.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    pos: u64,
    bit_len: u64,
}

impl<'a> BitReader<'a> {
    /// Reader over the first `bit_len` bits of `bytes`.
    ///
    /// # Errors
    /// Returns `Error::CorruptStream` if `bytes` is not exactly
    /// `ceil(bit_len / 8)` bytes long.
    pub fn new(bytes: &'a [u8], bit_len: u64) -> Result<Self> {
        let expected = bit_len.div_ceil(8);
        if bytes.len() as u64 != expected {
            return Err(Error::CorruptStream(format!(
                "{bit_len} bits need {expected} bytes, payload has {}",
                bytes.len()
            )));
        }
        Ok(Self {
            bytes,
            pos: 0,
            bit_len,
        })
    }

    /// Bits not yet read.
    pub fn remaining(&self) -> u64 {
        self.bit_len - self.pos
    }
}

impl Iterator for BitReader<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.pos >= self.bit_len {
            return None;
        }
        let byte = self.bytes[(self.pos / 8) as usize];
        let bit = byte & (0x80 >> (self.pos % 8)) != 0;
        self.pos += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining() as usize;
        (n, Some(n))
    }
}

/// Padding bits in the final byte of a stream of `bit_len` bits.
pub fn padding_bits(bit_len: u64) -> u8 {
    ((8 - bit_len % 8) % 8) as u8
}
