// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Decoder error taxonomy.

use std::io;

use crate::constants::EventType;

/// Error returned by every layer of the decoder.
///
/// Decoders never index out of bounds — a short buffer surfaces as
/// [`DecodeError::Truncated`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The first four bytes of the file aren't `[0xfe, b'b', b'i', b'n']`.
    #[error("invalid binlog file header")]
    BadMagic,

    /// The byte source ended inside a structure, or a structure's announced
    /// length disagrees with the bytes actually available.
    #[error("unexpected end of event data")]
    Truncated,

    /// Event type tag outside the official numbering.
    #[error("got unknown event type {0:#04x}")]
    UnknownEventType(u8),

    /// The tag is a well-known event type, but no body decoder is registered
    /// for it.
    #[error("no body decoder for event type {0:?}")]
    UnsupportedEventType(EventType),

    /// CRC32 mismatch, or the checksum trailer is malformed.
    #[error("event checksum validation failed")]
    ChecksumMismatch,

    /// The buffer passed to the event header codec is shorter than the
    /// announced header length.
    #[error("event header needs {need} bytes, got {got}")]
    InvalidHeaderSize { got: usize, need: usize },

    /// A TABLE_MAP column type whose metadata layout is intentionally not
    /// supported.
    #[error("unsupported column type {0:#04x} in table map")]
    UnsupportedColumnType(u8),

    /// A body decoder needed the format description before one was seen.
    #[error("no format description event seen yet")]
    MissingFormatDescription,

    /// A rows event referenced a table id with no prior TABLE_MAP.
    #[error("no table map event for table id {0}")]
    TableMapMissing(u64),

    /// A value outside the range a codec accepts (e.g. the `0xff`
    /// length-encoded integer prefix).
    #[error("value out of range: {0}")]
    OutOfRange(&'static str),

    /// Error reported by the byte source.
    #[error(transparent)]
    Io(#[from] io::Error),
}
