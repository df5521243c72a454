//! Bounded bit stream cursors, built on top of [Utils]
use crate::{utils::Utils, Error};

/// Reads consecutive fields out of a verified frame.
/// Every read is checked against the declared message length,
/// so a truncated message returns [Error::NotEnoughBits]
/// instead of reading stale buffer content.
pub(crate) struct BitReader<'a> {
    buf: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a [BitReader] over `buf[pos..end]` (in bits)
    pub fn new(buf: &'a [u8], pos: usize, end: usize) -> Self {
        Self {
            buf,
            pos,
            end: end.min(buf.len() * 8),
        }
    }

    /// Creates a [BitReader] over the payload of an RTCM3 frame
    /// of `len` payload bytes: header is skipped, CRC is excluded.
    pub fn rtcm3(frame: &'a [u8], len: usize) -> Self {
        Self::new(frame, 24, 24 + len * 8)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }

    /// Verifies that `len` bits may be read
    pub fn ensure(&self, len: usize) -> Result<(), Error> {
        if self.pos + len > self.end {
            Err(Error::NotEnoughBits)
        } else {
            Ok(())
        }
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.ensure(len)?;
        self.pos += len;
        Ok(())
    }

    pub fn u(&mut self, len: usize) -> Result<u32, Error> {
        self.ensure(len)?;
        let value = Utils::get_bitu(self.buf, self.pos, len);
        self.pos += len;
        Ok(value)
    }

    pub fn s(&mut self, len: usize) -> Result<i32, Error> {
        self.ensure(len)?;
        let value = Utils::get_bits(self.buf, self.pos, len);
        self.pos += len;
        Ok(value)
    }

    /// Sign-magnitude field
    pub fn g(&mut self, len: usize) -> Result<i32, Error> {
        self.ensure(len)?;
        let value = Utils::get_bitg(self.buf, self.pos, len);
        self.pos += len;
        Ok(value)
    }

    pub fn s38(&mut self) -> Result<i64, Error> {
        self.ensure(38)?;
        let value = Utils::get_bits_38(self.buf, self.pos);
        self.pos += 38;
        Ok(value)
    }

    pub fn flag(&mut self) -> Result<bool, Error> {
        Ok(self.u(1)? == 1)
    }

    /// Reads `n` bytes as a character string.
    /// Invalid UTF-8 sequences are replaced.
    pub fn string(&mut self, n: usize) -> Result<String, Error> {
        self.ensure(n * 8)?;
        let mut bytes = Vec::with_capacity(n);
        for _ in 0..n {
            bytes.push(self.u(8)? as u8);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Packs consecutive fields into a growing payload
#[derive(Debug, Default)]
pub(crate) struct BitWriter {
    buf: Vec<u8>,
    pos: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn reserve(&mut self, len: usize) {
        let size = (self.pos + len + 7) / 8;
        if self.buf.len() < size {
            self.buf.resize(size, 0);
        }
    }

    pub fn u(&mut self, len: usize, value: u32) {
        self.reserve(len);
        Utils::set_bitu(&mut self.buf, self.pos, len, value);
        self.pos += len;
    }

    pub fn s(&mut self, len: usize, value: i32) {
        self.reserve(len);
        Utils::set_bits(&mut self.buf, self.pos, len, value);
        self.pos += len;
    }

    /// Sign-magnitude field
    pub fn g(&mut self, len: usize, value: i32) {
        self.reserve(len);
        Utils::set_bitg(&mut self.buf, self.pos, len, value);
        self.pos += len;
    }

    pub fn s38(&mut self, value: i64) {
        self.reserve(38);
        Utils::set_bits_38(&mut self.buf, self.pos, value);
        self.pos += 38;
    }

    pub fn flag(&mut self, value: bool) {
        self.u(1, value as u32);
    }

    /// Writes raw bytes (character strings)
    pub fn bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.u(8, *byte as u32);
        }
    }

    /// Returns the payload, zero padded to the next byte boundary
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.reserve(0);
        self.buf
    }
}

/// Rounds to nearest integer, the way RTCM encoders quantize fields.
pub(crate) fn round_i32(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Unsigned counterpart of [round_i32]
pub(crate) fn round_u32(value: f64) -> u32 {
    (value + 0.5).floor() as u32
}

/// Wide counterpart of [round_i32], for 38 bit fields
pub(crate) fn round_i64(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
