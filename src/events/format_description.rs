// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use crate::{
    checksum::{BINLOG_CHECKSUM_ALG_DESC_LEN, BINLOG_CHECKSUM_LEN},
    constants::EventType,
    context::DecodingContext,
    error::DecodeError,
    events::EventBody,
    io::ParseBuf,
    misc::split_version,
    registry::BodyDecoder,
};

/// A format description event is the first event of a binlog for
/// binlog-version 4. It parameterizes the decoding of every event after it.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct FormatDescriptionEvent {
    /// Version of this binlog format.
    pub binlog_version: u16,
    /// Version of the MySQL Server that created the binlog, with the
    /// trailing NUL padding of the 50-byte field removed.
    pub server_version: String,
    /// Seconds since Unix epoch when the binlog was created.
    pub create_timestamp: u32,
    /// Declared length of the common event header for all subsequent events.
    pub event_header_length: u8,
    /// An array indexed by event type tag - 1 holding the length of the
    /// event-type specific header prefix.
    pub event_type_header_lengths: Vec<u8>,
    /// Whether events in this file end with a checksum trailer.
    ///
    /// Derived from `server_version` — checksums exist since MySql 5.6.2.
    pub has_checksum: bool,
}

impl FormatDescriptionEvent {
    /// Length of the server version field.
    pub const SERVER_VER_LEN: usize = 50;
    /// First MySql version that can write binlog checksums.
    pub const CHECKSUM_VERSION_PRODUCT: (u16, u16, u16) = (5, 6, 2);

    /// Returns the post-header length recorded for the given event type,
    /// or `0` if the table doesn't cover it.
    pub fn event_type_header_length(&self, event_type: EventType) -> u8 {
        if event_type == EventType::UNKNOWN_EVENT {
            return 0;
        }
        self.event_type_header_lengths
            .get((event_type as u8 as usize).saturating_sub(1))
            .copied()
            .unwrap_or(0)
    }

    /// Width in bytes of the `table_id` field of the given event type.
    ///
    /// Old servers record a 6-byte post-header for TABLE_MAP and rows
    /// events and write 4-byte table ids; everything else writes 6 bytes.
    pub fn table_id_width(&self, event_type: EventType) -> usize {
        if self.event_type_header_length(event_type) == 6 {
            4
        } else {
            6
        }
    }
}

pub(crate) struct FormatDescriptionDecoder;

impl BodyDecoder for FormatDescriptionDecoder {
    fn event_types(&self) -> &'static [EventType] {
        &[EventType::FORMAT_DESCRIPTION_EVENT]
    }

    fn decode(
        &self,
        _event_type: EventType,
        data: &[u8],
        ctx: &DecodingContext,
    ) -> Result<EventBody, DecodeError> {
        let mut buf = ParseBuf(data);

        let binlog_version = buf.checked_eat_u16_le().ok_or(DecodeError::Truncated)?;

        let server_version_raw = buf
            .checked_eat(FormatDescriptionEvent::SERVER_VER_LEN)
            .ok_or(DecodeError::Truncated)?;
        let end = server_version_raw
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |pos| pos + 1);
        let server_version = String::from_utf8_lossy(&server_version_raw[..end]).into_owned();

        let create_timestamp = buf.checked_eat_u32_le().ok_or(DecodeError::Truncated)?;
        let event_header_length = buf.checked_eat_u8().ok_or(DecodeError::Truncated)?;

        let has_checksum =
            split_version(&server_version) >= FormatDescriptionEvent::CHECKSUM_VERSION_PRODUCT;

        let mut event_type_header_lengths = buf.eat_all().to_vec();

        // The first format description of a file carries its own checksum
        // trailer: the driver couldn't strip it because the checksum flag
        // only becomes known while this very event is decoded. A mid-stream
        // format description arrives with the trailer already stripped.
        let trailer_len = BINLOG_CHECKSUM_ALG_DESC_LEN + BINLOG_CHECKSUM_LEN;
        if has_checksum && !ctx.has_checksum() && event_type_header_lengths.len() >= trailer_len {
            event_type_header_lengths.truncate(event_type_header_lengths.len() - trailer_len);
        }

        Ok(EventBody::FormatDescription(FormatDescriptionEvent {
            binlog_version,
            server_version,
            create_timestamp,
            event_header_length,
            event_type_header_lengths,
            has_checksum,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fde_body(server_version: &str, type_header_lengths: &[u8]) -> Vec<u8> {
        let mut body = vec![0x04, 0x00];
        let mut version = [0_u8; FormatDescriptionEvent::SERVER_VER_LEN];
        version[..server_version.len()].copy_from_slice(server_version.as_bytes());
        body.extend_from_slice(&version);
        body.extend_from_slice(&[0, 0, 0, 0]); // create timestamp
        body.push(19);
        body.extend_from_slice(type_header_lengths);
        body
    }

    fn decode(body: &[u8]) -> FormatDescriptionEvent {
        let ctx = DecodingContext::new();
        match FormatDescriptionDecoder
            .decode(EventType::FORMAT_DESCRIPTION_EVENT, body, &ctx)
            .unwrap()
        {
            EventBody::FormatDescription(fde) => fde,
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn parses_versioned_header_table() {
        let fde = decode(&fde_body("5.5.62", &[56, 13, 0, 8, 0]));
        assert_eq!(fde.binlog_version, 4);
        assert_eq!(fde.server_version, "5.5.62");
        assert_eq!(fde.event_header_length, 19);
        assert!(!fde.has_checksum);
        assert_eq!(fde.event_type_header_lengths, vec![56, 13, 0, 8, 0]);
        assert_eq!(
            fde.event_type_header_length(EventType::QUERY_EVENT),
            13
        );
        assert_eq!(fde.event_type_header_length(EventType::UNKNOWN_EVENT), 0);
        // beyond the recorded table
        assert_eq!(fde.event_type_header_length(EventType::XID_EVENT), 0);
    }

    #[test]
    fn checksum_version_boundary() {
        assert!(!decode(&fde_body("5.6.1", &[0; 40])).has_checksum);
        assert!(decode(&fde_body("8.0.33", &[0; 45])).has_checksum);

        // a checksum-capable version owns the last five bytes of the table
        let fde = decode(&fde_body("5.6.2", &[7; 40]));
        assert!(fde.has_checksum);
        assert_eq!(fde.event_type_header_lengths, vec![7; 35]);
    }

    #[test]
    fn driver_stripped_trailer_is_not_cut_twice() {
        let body = fde_body("5.6.10", &[7; 35]);

        let mut ctx = DecodingContext::new();
        ctx.set_description(decode(&fde_body("5.6.10", &[7; 40])));
        assert!(ctx.has_checksum());

        match FormatDescriptionDecoder
            .decode(EventType::FORMAT_DESCRIPTION_EVENT, &body, &ctx)
            .unwrap()
        {
            EventBody::FormatDescription(fde) => {
                assert_eq!(fde.event_type_header_lengths, vec![7; 35])
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn table_id_width_toggle() {
        let mut fde = decode(&fde_body("5.6.10", &[0; 45]));
        assert_eq!(fde.table_id_width(EventType::TABLE_MAP_EVENT), 6);

        fde.event_type_header_lengths[EventType::TABLE_MAP_EVENT as usize - 1] = 6;
        assert_eq!(fde.table_id_width(EventType::TABLE_MAP_EVENT), 4);

        fde.event_type_header_lengths[EventType::TABLE_MAP_EVENT as usize - 1] = 8;
        assert_eq!(fde.table_id_width(EventType::TABLE_MAP_EVENT), 6);
    }

    #[test]
    fn truncated_body() {
        let ctx = DecodingContext::new();
        assert!(matches!(
            FormatDescriptionDecoder.decode(
                EventType::FORMAT_DESCRIPTION_EVENT,
                &[0x04, 0x00, b'5'],
                &ctx
            ),
            Err(DecodeError::Truncated)
        ));
    }
}
