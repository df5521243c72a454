//! Bit field codec
//!
//! All RTCM fields are packed MSB first, at arbitrary bit offsets.
//! These methods are pure views over the provided buffer: they never
//! grow it and the caller is responsible for the requested span
//! to lie within the valid portion of the buffer.

pub struct Utils;

impl Utils {
    /// Extracts an unsigned integer of `len` bits (1..=32),
    /// starting at bit `pos`.
    /// ```
    /// use rtcm::prelude::Utils;
    /// let buf = [0xD3, 0x00, 0x13, 0x3E, 0xD7];
    /// assert_eq!(Utils::get_bitu(&buf, 0, 8), 0xD3);
    /// assert_eq!(Utils::get_bitu(&buf, 14, 10), 19);
    /// assert_eq!(Utils::get_bitu(&buf, 24, 12), 1005);
    /// ```
    pub fn get_bitu(buf: &[u8], pos: usize, len: usize) -> u32 {
        let mut bits = 0_u32;
        for i in pos..pos + len {
            bits = (bits << 1) | ((buf[i / 8] >> (7 - i % 8)) & 0x01) as u32;
        }
        bits
    }

    /// Extracts a two's complement signed integer of `len` bits (1..=32),
    /// starting at bit `pos`.
    pub fn get_bits(buf: &[u8], pos: usize, len: usize) -> i32 {
        let bits = Self::get_bitu(buf, pos, len);
        if len == 0 || len >= 32 || bits & (1 << (len - 1)) == 0 {
            bits as i32
        } else {
            (bits | (u32::MAX << len)) as i32
        }
    }

    /// Extracts a sign-magnitude integer of `len` bits (GLONASS fields).
    pub fn get_bitg(buf: &[u8], pos: usize, len: usize) -> i32 {
        let magnitude = Self::get_bitu(buf, pos + 1, len - 1) as i32;
        if Self::get_bitu(buf, pos, 1) == 1 {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Extracts a 38 bit signed integer (station coordinates)
    pub fn get_bits_38(buf: &[u8], pos: usize) -> i64 {
        let high = Self::get_bits(buf, pos, 32) as i64;
        let low = Self::get_bitu(buf, pos + 32, 6) as i64;
        (high << 6) | low
    }

    /// Inserts `len` bits (1..=32) of `data` starting at bit `pos`.
    /// Upper bits of `data` that do not fit are discarded.
    pub fn set_bitu(buf: &mut [u8], pos: usize, len: usize, data: u32) {
        if len == 0 || len > 32 {
            return;
        }
        let mut mask = 1_u32 << (len - 1);
        for i in pos..pos + len {
            let bit = 1_u8 << (7 - i % 8);
            if data & mask != 0 {
                buf[i / 8] |= bit;
            } else {
                buf[i / 8] &= !bit;
            }
            mask >>= 1;
        }
    }

    /// Inserts a two's complement signed integer on `len` bits.
    pub fn set_bits(buf: &mut [u8], pos: usize, len: usize, data: i32) {
        Self::set_bitu(buf, pos, len, data as u32);
    }

    /// Inserts a sign-magnitude integer on `len` bits (GLONASS fields).
    pub fn set_bitg(buf: &mut [u8], pos: usize, len: usize, data: i32) {
        Self::set_bitu(buf, pos, 1, (data < 0) as u32);
        Self::set_bitu(buf, pos + 1, len - 1, data.unsigned_abs());
    }

    /// Inserts a 38 bit signed integer (station coordinates)
    pub fn set_bits_38(buf: &mut [u8], pos: usize, data: i64) {
        Self::set_bits(buf, pos, 32, (data >> 6) as i32);
        Self::set_bitu(buf, pos + 32, 6, (data & 0x3f) as u32);
    }
}
