// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Primitive codecs shared by every body decoder: a checked slice cursor,
//! fixed-length little-endian integers, length-encoded integers and strings.

use byteorder::{ByteOrder, LittleEndian as LE};
use bytes::BufMut;

use crate::error::DecodeError;

/// Decodes a fixed-length little-endian integer out of at most 8 bytes.
pub fn fixed_length_int(buf: &[u8]) -> u64 {
    debug_assert!(buf.len() <= 8);
    let mut num = 0_u64;
    for (i, b) in buf.iter().enumerate() {
        num |= (*b as u64) << (8 * i);
    }
    num
}

/// Number of bytes needed to hold a bitmap with one bit per column.
pub fn bitmap_byte_size(column_count: usize) -> usize {
    (column_count + 7) / 8
}

/// A decoded length-encoded integer.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LenEncInt {
    pub value: u64,
    /// `true` if the first byte was the `0xfb` NULL marker.
    pub is_null: bool,
    /// Number of bytes the encoding occupies.
    pub len: usize,
}

/// Decodes a length-encoded integer from the head of `buf`.
///
/// The first byte selects the width:
///
/// *   `0x00..=0xfa` — the value itself, one byte;
/// *   `0xfb` — NULL marker;
/// *   `0xfc` / `0xfd` / `0xfe` — 2-, 3- and 8-byte little-endian values.
///
/// `0xff` is not a valid prefix.
pub fn lenenc_int(buf: &[u8]) -> Result<LenEncInt, DecodeError> {
    let first = *buf.first().ok_or(DecodeError::Truncated)?;

    let (value, is_null, len) = match first {
        0xfb => (0, true, 1),
        0xfc => (
            eat_checked(buf, 3).map(|b| LE::read_u16(&b[1..]) as u64)?,
            false,
            3,
        ),
        0xfd => (
            eat_checked(buf, 4).map(|b| LE::read_u24(&b[1..]) as u64)?,
            false,
            4,
        ),
        0xfe => (
            eat_checked(buf, 9).map(|b| LE::read_u64(&b[1..]))?,
            false,
            9,
        ),
        0xff => {
            return Err(DecodeError::OutOfRange(
                "length-encoded integer prefix 0xff",
            ))
        }
        x => (x as u64, false, 1),
    };

    Ok(LenEncInt {
        value,
        is_null,
        len,
    })
}

fn eat_checked(buf: &[u8], n: usize) -> Result<&[u8], DecodeError> {
    buf.get(..n).ok_or(DecodeError::Truncated)
}

/// Returns the length of the length-encoded representation of `x`.
pub fn lenenc_int_len(x: u64) -> usize {
    if x < 251 {
        1
    } else if x <= 0xffff {
        3
    } else if x <= 0xff_ffff {
        4
    } else {
        9
    }
}

/// Appends the length-encoded representation of `x` to `buf`.
pub fn put_lenenc_int(buf: &mut impl BufMut, x: u64) {
    if x < 251 {
        buf.put_u8(x as u8);
    } else if x <= 0xffff {
        buf.put_u8(0xfc);
        buf.put_u16_le(x as u16);
    } else if x <= 0xff_ffff {
        buf.put_u8(0xfd);
        buf.put_uint_le(x, 3);
    } else {
        buf.put_u8(0xfe);
        buf.put_u64_le(x);
    }
}

/// Cursor over a byte slice. Checked eats return `None` instead of reading
/// out of bounds; callers map that to [`DecodeError::Truncated`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct ParseBuf<'a>(pub &'a [u8]);

impl<'a> ParseBuf<'a> {
    /// Returns the number of bytes left in the buffer.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Eats `n` bytes if at least `n` bytes are left.
    pub fn checked_eat(&mut self, n: usize) -> Option<&'a [u8]> {
        let head = self.0.get(..n)?;
        self.0 = &self.0[n..];
        Some(head)
    }

    /// Eats everything that's left.
    pub fn eat_all(&mut self) -> &'a [u8] {
        let out = self.0;
        self.0 = &[];
        out
    }

    pub fn checked_eat_u8(&mut self) -> Option<u8> {
        self.checked_eat(1).map(|b| b[0])
    }

    pub fn checked_eat_u16_le(&mut self) -> Option<u16> {
        self.checked_eat(2).map(LE::read_u16)
    }

    pub fn checked_eat_u32_le(&mut self) -> Option<u32> {
        self.checked_eat(4).map(LE::read_u32)
    }

    pub fn checked_eat_u64_le(&mut self) -> Option<u64> {
        self.checked_eat(8).map(LE::read_u64)
    }

    /// Eats an `n`-byte fixed-length little-endian integer, `n <= 8`.
    pub fn checked_eat_uint_le(&mut self, n: usize) -> Option<u64> {
        self.checked_eat(n).map(fixed_length_int)
    }

    /// Eats a length-encoded integer.
    pub fn eat_lenenc_int(&mut self) -> Result<LenEncInt, DecodeError> {
        let int = lenenc_int(self.0)?;
        self.0 = &self.0[int.len..];
        Ok(int)
    }

    /// Eats a length-encoded string.
    ///
    /// A NULL marker and a zero length both decode to an empty slice.
    pub fn eat_lenenc_str(&mut self) -> Result<&'a [u8], DecodeError> {
        let int = self.eat_lenenc_int()?;
        if int.is_null || int.value == 0 {
            return Ok(&[]);
        }
        self.checked_eat(int.value as usize)
            .ok_or(DecodeError::Truncated)
    }
}
