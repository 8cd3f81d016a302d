// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use bitvec::{order::Lsb0, vec::BitVec};

use crate::{
    constants::{EventType, RowsEventFlags},
    context::DecodingContext,
    error::DecodeError,
    events::EventBody,
    io::{bitmap_byte_size, ParseBuf},
    registry::BodyDecoder,
};

/// Layout revision of a rows event, derived from its tag.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum RowsEventVersion {
    /// Tags 0x14..0x16.
    V0,
    /// Tags 0x17..0x19 (mysql 5.1.15 - 5.6.x).
    V1,
    /// Tags 0x1e..0x20 (mysql 5.6.x+), with the extra-data post-header.
    V2,
}

impl RowsEventVersion {
    fn from_event_type(event_type: EventType) -> Option<Self> {
        use EventType::*;
        match event_type {
            WRITE_ROWS_EVENT_V0 | UPDATE_ROWS_EVENT_V0 | DELETE_ROWS_EVENT_V0 => Some(Self::V0),
            WRITE_ROWS_EVENT_V1 | UPDATE_ROWS_EVENT_V1 | DELETE_ROWS_EVENT_V1 => Some(Self::V1),
            WRITE_ROWS_EVENT_V2 | UPDATE_ROWS_EVENT_V2 | DELETE_ROWS_EVENT_V2 => Some(Self::V2),
            _ => None,
        }
    }
}

/// Common header-level structure of all row-containing binlog events.
///
/// The row images themselves are kept as raw bytes in `rows_data` — their
/// decoding needs the full column-type machinery and is out of scope here.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct RowsEvent {
    pub version: RowsEventVersion,
    /// Table identifier, resolving to a prior TABLE_MAP event.
    pub table_id: u64,
    /// Raw rows event flags. Use [`Self::get_flags`].
    pub flags: u16,
    /// Raw extra data. Empty below v2.
    pub extra_data: Vec<u8>,
    /// Number of columns.
    pub column_count: u64,
    /// Bit-field indicating whether each column is present.
    pub columns_present: BitVec<u8, Lsb0>,
    /// Second present-bitmap (after-image), carried by UPDATE v1/v2 only.
    pub columns_present_update: Option<BitVec<u8, Lsb0>>,
    /// Undecoded row images.
    pub rows_data: Vec<u8>,
}

impl RowsEvent {
    /// Returns the parsed event flags. Unknown bits are truncated.
    pub fn get_flags(&self) -> RowsEventFlags {
        RowsEventFlags::from_bits_truncate(self.flags)
    }
}

pub(crate) struct RowsEventDecoder;

impl BodyDecoder for RowsEventDecoder {
    fn event_types(&self) -> &'static [EventType] {
        use EventType::*;
        &[
            WRITE_ROWS_EVENT_V0,
            UPDATE_ROWS_EVENT_V0,
            DELETE_ROWS_EVENT_V0,
            WRITE_ROWS_EVENT_V1,
            UPDATE_ROWS_EVENT_V1,
            DELETE_ROWS_EVENT_V1,
            WRITE_ROWS_EVENT_V2,
            UPDATE_ROWS_EVENT_V2,
            DELETE_ROWS_EVENT_V2,
        ]
    }

    fn decode(
        &self,
        event_type: EventType,
        data: &[u8],
        ctx: &DecodingContext,
    ) -> Result<EventBody, DecodeError> {
        let description = ctx.require_description()?;
        let version = RowsEventVersion::from_event_type(event_type)
            .ok_or(DecodeError::UnsupportedEventType(event_type))?;
        let mut buf = ParseBuf(data);

        let table_id_width = description.table_id_width(event_type);
        let table_id = buf
            .checked_eat_uint_le(table_id_width)
            .ok_or(DecodeError::Truncated)?;

        if ctx.table_map(table_id).is_none() {
            return Err(DecodeError::TableMapMissing(table_id));
        }

        let flags = buf.checked_eat_u16_le().ok_or(DecodeError::Truncated)?;

        let extra_data = if version == RowsEventVersion::V2 {
            // the length counts its own two bytes
            let extra_data_len = buf.checked_eat_u16_le().ok_or(DecodeError::Truncated)? as usize;
            buf.checked_eat(extra_data_len.saturating_sub(2))
                .ok_or(DecodeError::Truncated)?
        } else {
            &[][..]
        };

        let column_count = buf.eat_lenenc_int()?.value;
        let bitmap_len = bitmap_byte_size(column_count as usize);

        let columns_present = buf.checked_eat(bitmap_len).ok_or(DecodeError::Truncated)?;
        let mut columns_present = BitVec::from_slice(columns_present);
        columns_present.truncate(column_count as usize);

        let is_update = matches!(
            event_type,
            EventType::UPDATE_ROWS_EVENT_V1 | EventType::UPDATE_ROWS_EVENT_V2
        );
        let columns_present_update = if is_update {
            let bitmap = buf.checked_eat(bitmap_len).ok_or(DecodeError::Truncated)?;
            let mut bitmap = BitVec::from_slice(bitmap);
            bitmap.truncate(column_count as usize);
            Some(bitmap)
        } else {
            None
        };

        let rows_data = buf.eat_all().to_vec();

        let event = RowsEvent {
            version,
            table_id,
            flags,
            extra_data: extra_data.to_vec(),
            column_count,
            columns_present,
            columns_present_update,
            rows_data,
        };

        Ok(match event_type {
            EventType::WRITE_ROWS_EVENT_V0
            | EventType::WRITE_ROWS_EVENT_V1
            | EventType::WRITE_ROWS_EVENT_V2 => EventBody::WriteRows(event),
            EventType::UPDATE_ROWS_EVENT_V0
            | EventType::UPDATE_ROWS_EVENT_V1
            | EventType::UPDATE_ROWS_EVENT_V2 => EventBody::UpdateRows(event),
            _ => EventBody::DeleteRows(event),
        })
    }
}
