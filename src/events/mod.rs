// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Binlog events: the common header, the per-type bodies and their decoders.
//!
//! Structures own the bytes they were decoded from, so events outlive the
//! byte source that produced them.

use crate::{
    checksum::ChecksumPart,
    constants::{EventFlags, EventType, UnknownEventType},
    context::DecodingContext,
    error::DecodeError,
    io::ParseBuf,
    misc::raw::RawConst,
    registry::BodyDecoder,
};

pub mod format_description;
pub mod gtid;
pub mod intvar;
pub mod query;
pub mod rotate;
pub mod rows;
pub mod table_map;
pub mod xid;

pub use self::{
    format_description::FormatDescriptionEvent,
    intvar::IntvarEvent,
    query::{QueryEvent, StatusVar, StatusVarKey, StatusVars},
    rotate::RotateEvent,
    rows::{RowsEvent, RowsEventVersion},
    table_map::TableMapEvent,
    xid::XidEvent,
};

/// The binlog event header starts each event and is 19 bytes long assuming
/// binlog version >= 2 (13 bytes for the legacy version 1 layout, which has
/// no `log_pos` and no `flags`).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct EventHeader {
    /// Seconds since unix epoch.
    pub timestamp: u32,
    /// Raw event type.
    pub event_type: RawConst<u8, EventType>,
    /// Server-id of the originating mysql-server.
    ///
    /// Used to filter out events in circular replication.
    pub server_id: u32,
    /// Size of the event (header, post-header, body), including the checksum
    /// trailer when one is present.
    pub event_size: u32,
    /// Byte offset of the event's end in the file. Zero in the legacy
    /// header layout.
    pub log_pos: u32,
    /// Raw event flags. Use [`Self::get_flags`].
    pub flags: u16,
    /// The bytes this header was decoded from. Checksum input.
    pub raw: Vec<u8>,
}

impl EventHeader {
    /// Binlog event header length for binlog version >= 2.
    pub const LEN: usize = 19;
    /// Binlog event header length for binlog version 1.
    pub const LEN_V1: usize = 13;

    /// Decodes an event header out of `buf`.
    ///
    /// `header_length` is the length announced by the format description
    /// (19, or 13 for pre-v2 files); `buf` must hold at least that many
    /// bytes.
    pub fn read(buf: &[u8], header_length: usize) -> Result<Self, DecodeError> {
        if buf.len() < header_length || header_length < Self::LEN_V1 {
            return Err(DecodeError::InvalidHeaderSize {
                got: buf.len(),
                need: header_length.max(Self::LEN_V1),
            });
        }

        let raw = &buf[..header_length];
        let mut buf = ParseBuf(raw);

        // the eats can't fail: the length is checked above
        let timestamp = buf.checked_eat_u32_le().ok_or(DecodeError::Truncated)?;
        let event_type = buf.checked_eat_u8().ok_or(DecodeError::Truncated)?;
        let server_id = buf.checked_eat_u32_le().ok_or(DecodeError::Truncated)?;
        let event_size = buf.checked_eat_u32_le().ok_or(DecodeError::Truncated)?;

        let (log_pos, flags) = if header_length > Self::LEN_V1 {
            (
                buf.checked_eat_u32_le().ok_or(DecodeError::Truncated)?,
                buf.checked_eat_u16_le().ok_or(DecodeError::Truncated)?,
            )
        } else {
            (0, 0)
        };

        Ok(Self {
            timestamp,
            event_type: RawConst::new(event_type),
            server_id,
            event_size,
            log_pos,
            flags,
            raw: raw.to_vec(),
        })
    }

    /// Returns the parsed event flags. Unknown bits are truncated.
    pub fn get_flags(&self) -> EventFlags {
        EventFlags::from_bits_truncate(self.flags)
    }

    /// Returns the parsed event type.
    pub fn get_event_type(&self) -> Result<EventType, UnknownEventType> {
        self.event_type.get()
    }
}

/// A decoded binlog event: header, typed body, and the checksum trailer when
/// the file carries checksums.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Event {
    pub header: EventHeader,
    pub body: EventBody,
    pub checksum: Option<ChecksumPart>,
}

/// Event-type specific data.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EventBody {
    FormatDescription(FormatDescriptionEvent),
    Query(QueryEvent),
    Rotate(RotateEvent),
    Intvar(IntvarEvent),
    Xid(XidEvent),
    TableMap(TableMapEvent),
    WriteRows(RowsEvent),
    UpdateRows(RowsEvent),
    DeleteRows(RowsEvent),
    /// Stored raw, no interpretation.
    AnonymousGtid(Vec<u8>),
    /// Stored raw, no interpretation.
    PreviousGtids(Vec<u8>),
}

/// Decoder for the `UNKNOWN_EVENT` tag.
///
/// The tag is part of the official numbering, so it passes the driver's
/// known-name check, but a well-formed binlog never contains it — decoding
/// refuses.
pub(crate) struct UnknownEventDecoder;

impl BodyDecoder for UnknownEventDecoder {
    fn event_types(&self) -> &'static [EventType] {
        &[EventType::UNKNOWN_EVENT]
    }

    fn decode(
        &self,
        event_type: EventType,
        _data: &[u8],
        _ctx: &DecodingContext,
    ) -> Result<EventBody, DecodeError> {
        Err(DecodeError::UnsupportedEventType(event_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [u8; 19] = [
        0x7c, 0x35, 0xbb, 0x4a, // timestamp
        0x0f, // event type
        0x01, 0x00, 0x00, 0x00, // server id
        0x5e, 0x00, 0x00, 0x00, // event size
        0x62, 0x00, 0x00, 0x00, // log pos
        0x01, 0x00, // flags
    ];

    #[test]
    fn header_v4_layout() {
        let header = EventHeader::read(&HEADER, EventHeader::LEN).unwrap();
        assert_eq!(header.timestamp, 1253782908);
        assert_eq!(
            header.get_event_type(),
            Ok(EventType::FORMAT_DESCRIPTION_EVENT)
        );
        assert_eq!(header.server_id, 1);
        assert_eq!(header.event_size, 94);
        assert_eq!(header.log_pos, 98);
        assert_eq!(
            header.get_flags(),
            EventFlags::LOG_EVENT_BINLOG_IN_USE_F
        );
        assert_eq!(header.raw, HEADER);
    }

    #[test]
    fn header_v1_layout_has_no_log_pos() {
        let header = EventHeader::read(&HEADER[..13], EventHeader::LEN_V1).unwrap();
        assert_eq!(header.event_size, 94);
        assert_eq!(header.log_pos, 0);
        assert_eq!(header.flags, 0);
        assert_eq!(header.raw.len(), 13);
    }

    #[test]
    fn header_too_short() {
        assert!(matches!(
            EventHeader::read(&HEADER[..10], EventHeader::LEN),
            Err(DecodeError::InvalidHeaderSize { got: 10, need: 19 })
        ));
    }
}
