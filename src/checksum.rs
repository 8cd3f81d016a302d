// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Event checksum validation.
//!
//! Since MySql 5.6.2 the server may append a checksum to every event it
//! writes. When the format description's server version says checksums are
//! on, the last five bytes of every event body are the algorithm tag
//! followed by a little-endian CRC32 computed over the raw header bytes and
//! the body without the trailer.

use byteorder::{ByteOrder, LittleEndian as LE};

use crate::{error::DecodeError, misc::raw::RawConst};

/// Length of the checksum algorithm description.
pub const BINLOG_CHECKSUM_ALG_DESC_LEN: usize = 1;
/// Length of the checksum value.
pub const BINLOG_CHECKSUM_LEN: usize = 4;

/// Enumeration spcifying checksum algorithm used to encode a binary log event.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[allow(non_camel_case_types)]
#[repr(u8)]
pub enum ChecksumAlg {
    /// Events are without checksum though its generator is checksum-capable
    /// New Master (NM).
    BINLOG_CHECKSUM_ALG_OFF = 0,
    /// CRC32 of zlib algorithm
    BINLOG_CHECKSUM_ALG_CRC32 = 1,
    /// Special value to tag undetermined yet checksum.
    BINLOG_CHECKSUM_ALG_UNDEF = 255,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown checksum algorithm {}", _0)]
#[repr(transparent)]
pub struct UnknownChecksumAlg(pub u8);

impl From<UnknownChecksumAlg> for u8 {
    fn from(x: UnknownChecksumAlg) -> Self {
        x.0
    }
}

impl TryFrom<u8> for ChecksumAlg {
    type Error = UnknownChecksumAlg;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::BINLOG_CHECKSUM_ALG_OFF),
            1 => Ok(Self::BINLOG_CHECKSUM_ALG_CRC32),
            255 => Ok(Self::BINLOG_CHECKSUM_ALG_UNDEF),
            x => Err(UnknownChecksumAlg(x)),
        }
    }
}

/// The checksum trailer of an event, as read off the stream.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct ChecksumPart {
    /// Raw algorithm description.
    pub algorithm: RawConst<u8, ChecksumAlg>,
    /// Little-endian CRC32 value.
    pub value: [u8; BINLOG_CHECKSUM_LEN],
}

/// Validates the checksum trailer of an event body.
///
/// Returns the body with the trailer cut off, and the trailer itself.
/// When `has_checksum` is `false` this is the identity.
///
/// The CRC32 (IEEE polynomial, as in zlib) covers `header_raw` followed by
/// the trimmed body. An OFF or UNDEF algorithm tag validates trivially, and
/// so does an unrecognized one — the raw tag stays available on the returned
/// part for callers that care.
pub fn validate<'a>(
    header_raw: &[u8],
    body: &'a [u8],
    has_checksum: bool,
) -> Result<(&'a [u8], Option<ChecksumPart>), DecodeError> {
    if !has_checksum {
        return Ok((body, None));
    }

    let trailer_len = BINLOG_CHECKSUM_ALG_DESC_LEN + BINLOG_CHECKSUM_LEN;
    if body.len() < trailer_len {
        return Err(DecodeError::ChecksumMismatch);
    }

    let (body, trailer) = body.split_at(body.len() - trailer_len);
    let mut value = [0_u8; BINLOG_CHECKSUM_LEN];
    value.copy_from_slice(&trailer[BINLOG_CHECKSUM_ALG_DESC_LEN..]);
    let part = ChecksumPart {
        algorithm: RawConst::new(trailer[0]),
        value,
    };

    if let Ok(ChecksumAlg::BINLOG_CHECKSUM_ALG_CRC32) = part.algorithm.get() {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(header_raw);
        hasher.update(body);
        if hasher.finalize() != LE::read_u32(&part.value) {
            return Err(DecodeError::ChecksumMismatch);
        }
    }

    Ok((body, Some(part)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crc(parts: &[&[u8]]) -> [u8; 4] {
        let mut hasher = crc32fast::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize().to_le_bytes()
    }

    #[test]
    fn identity_without_checksum() {
        let (body, part) = validate(b"hdr", b"body", false).unwrap();
        assert_eq!(body, b"body");
        assert!(part.is_none());
    }

    #[test]
    fn crc32_accepts_valid_trailer() {
        let header = [1_u8, 2, 3, 4];
        let payload = [0x2a_u8; 9];

        let mut body = payload.to_vec();
        body.push(ChecksumAlg::BINLOG_CHECKSUM_ALG_CRC32 as u8);
        body.extend_from_slice(&crc(&[&header, &payload]));

        let (trimmed, part) = validate(&header, &body, true).unwrap();
        assert_eq!(trimmed, payload);
        let part = part.unwrap();
        assert_eq!(
            part.algorithm.get(),
            Ok(ChecksumAlg::BINLOG_CHECKSUM_ALG_CRC32)
        );
        assert_eq!(part.value, crc(&[&header, &payload]));
    }

    #[test]
    fn crc32_rejects_flipped_bits() {
        let header = [1_u8, 2, 3, 4];
        let payload = [0x2a_u8; 9];

        let mut body = payload.to_vec();
        body.push(1);
        body.extend_from_slice(&crc(&[&header, &payload]));

        // flip one bit in the body
        let mut tampered = body.clone();
        tampered[3] ^= 0x10;
        assert!(matches!(
            validate(&header, &tampered, true),
            Err(DecodeError::ChecksumMismatch)
        ));

        // flip one bit in the header
        let mut bad_header = header;
        bad_header[0] ^= 0x01;
        assert!(matches!(
            validate(&bad_header, &body, true),
            Err(DecodeError::ChecksumMismatch)
        ));
    }

    #[test]
    fn off_and_undef_validate_trivially() {
        for alg in [0_u8, 0xff] {
            let mut body = b"payload".to_vec();
            body.push(alg);
            body.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);

            let (trimmed, part) = validate(b"hdr", &body, true).unwrap();
            assert_eq!(trimmed, b"payload");
            assert_eq!(part.unwrap().algorithm.0, alg);
        }
    }

    #[test]
    fn short_trailer_is_malformed() {
        assert!(matches!(
            validate(b"hdr", &[1, 2, 3, 4], true),
            Err(DecodeError::ChecksumMismatch)
        ));
    }

    #[test]
    fn empty_body_with_checksum() {
        // trailer occupies the whole body, the trimmed body is empty
        let mut body = vec![1_u8];
        body.extend_from_slice(&crc(&[b"hdr", b""]));
        let (trimmed, part) = validate(b"hdr", &body, true).unwrap();
        assert!(trimmed.is_empty());
        assert!(part.is_some());
    }
}
