// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::convert::TryFrom;

use bitvec::{order::Lsb0, vec::BitVec};

use crate::{
    constants::{ColumnType, EventType, UnknownColumnType},
    context::DecodingContext,
    error::DecodeError,
    events::EventBody,
    io::{bitmap_byte_size, ParseBuf},
    misc::raw::RawText,
    registry::BodyDecoder,
};

/// Table map event.
///
/// In row-based mode, every row operation event is preceded by a
/// Table_map_event which maps a table definition to a number.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct TableMapEvent {
    /// The number that identifies the table.
    pub table_id: u64,
    /// Reserved for future use; currently always 0.
    pub flags: u16,
    /// The name of the database in which the table resides.
    pub schema: RawText,
    /// The name of the table.
    pub table: RawText,
    /// Number of columns, as announced on the wire.
    pub column_count: u64,
    /// The type of each column in the table, listed from left to right.
    pub column_types: Vec<u8>,
    /// Decoded per-column metadata, one entry per column.
    pub column_meta: Vec<u16>,
    /// For each column, a bit indicating whether data in the column can be
    /// NULL or not. `(column_count + 7) / 8` bytes on the wire.
    pub null_bitmap: BitVec<u8, Lsb0>,
}

impl TableMapEvent {
    /// Returns the type of the column at `index`.
    pub fn column_type(
        &self,
        index: usize,
    ) -> Option<Result<ColumnType, UnknownColumnType>> {
        self.column_types.get(index).map(|t| ColumnType::try_from(*t))
    }
}

/// Decodes the column metadata blob, advancing a cursor per column type.
///
/// Stored `u16` layouts:
///
/// *   STRING — real type in the high byte, field length in the low byte;
/// *   NEWDECIMAL — precision in the high byte, decimals in the low byte;
/// *   VAR_STRING / VARCHAR / BIT — little-endian u16;
/// *   BLOB / DOUBLE / FLOAT / GEOMETRY / JSON and the fractional-seconds
///     temporal types — single byte;
/// *   anything else — 0, consuming nothing.
fn decode_meta(meta: &[u8], column_types: &[u8]) -> Result<Vec<u16>, DecodeError> {
    use ColumnType::*;

    let mut buf = ParseBuf(meta);
    let mut column_meta = Vec::with_capacity(column_types.len());

    for t in column_types {
        let meta = match ColumnType::try_from(*t) {
            Ok(MYSQL_TYPE_STRING) | Ok(MYSQL_TYPE_NEWDECIMAL) => {
                let bytes = buf.checked_eat(2).ok_or(DecodeError::Truncated)?;
                ((bytes[0] as u16) << 8) + bytes[1] as u16
            }
            Ok(MYSQL_TYPE_VAR_STRING) | Ok(MYSQL_TYPE_VARCHAR) | Ok(MYSQL_TYPE_BIT) => {
                buf.checked_eat_u16_le().ok_or(DecodeError::Truncated)?
            }
            Ok(MYSQL_TYPE_BLOB)
            | Ok(MYSQL_TYPE_DOUBLE)
            | Ok(MYSQL_TYPE_FLOAT)
            | Ok(MYSQL_TYPE_GEOMETRY)
            | Ok(MYSQL_TYPE_JSON)
            | Ok(MYSQL_TYPE_TIME2)
            | Ok(MYSQL_TYPE_DATETIME2)
            | Ok(MYSQL_TYPE_TIMESTAMP2) => {
                buf.checked_eat_u8().ok_or(DecodeError::Truncated)? as u16
            }
            Ok(MYSQL_TYPE_NEWDATE)
            | Ok(MYSQL_TYPE_ENUM)
            | Ok(MYSQL_TYPE_SET)
            | Ok(MYSQL_TYPE_TINY_BLOB)
            | Ok(MYSQL_TYPE_MEDIUM_BLOB)
            | Ok(MYSQL_TYPE_LONG_BLOB) => {
                return Err(DecodeError::UnsupportedColumnType(*t));
            }
            _ => 0,
        };
        column_meta.push(meta);
    }

    Ok(column_meta)
}

pub(crate) struct TableMapEventDecoder;

impl BodyDecoder for TableMapEventDecoder {
    fn event_types(&self) -> &'static [EventType] {
        &[EventType::TABLE_MAP_EVENT]
    }

    fn decode(
        &self,
        event_type: EventType,
        data: &[u8],
        ctx: &DecodingContext,
    ) -> Result<EventBody, DecodeError> {
        let description = ctx.require_description()?;
        let mut buf = ParseBuf(data);

        let table_id_width = description.table_id_width(event_type);
        let table_id = buf
            .checked_eat_uint_le(table_id_width)
            .ok_or(DecodeError::Truncated)?;
        let flags = buf.checked_eat_u16_le().ok_or(DecodeError::Truncated)?;

        let schema_len = buf.checked_eat_u8().ok_or(DecodeError::Truncated)? as usize;
        let schema = buf.checked_eat(schema_len).ok_or(DecodeError::Truncated)?;
        buf.checked_eat_u8().ok_or(DecodeError::Truncated)?; // 0x00 separator

        let table_len = buf.checked_eat_u8().ok_or(DecodeError::Truncated)? as usize;
        let table = buf.checked_eat(table_len).ok_or(DecodeError::Truncated)?;
        buf.checked_eat_u8().ok_or(DecodeError::Truncated)?; // 0x00 separator

        let column_count = buf.eat_lenenc_int()?.value;
        let column_types = buf
            .checked_eat(column_count as usize)
            .ok_or(DecodeError::Truncated)?;

        let meta = buf.eat_lenenc_str()?;
        let column_meta = decode_meta(meta, column_types)?;

        // the null bitmap is everything that's left, and its size is fixed
        // by the column count
        let null_bitmap = buf.eat_all();
        if null_bitmap.len() != bitmap_byte_size(column_count as usize) {
            return Err(DecodeError::Truncated);
        }
        let mut null_bitmap = BitVec::from_slice(null_bitmap);
        null_bitmap.truncate(column_count as usize);

        Ok(EventBody::TableMap(TableMapEvent {
            table_id,
            flags,
            schema: schema.into(),
            table: table.into(),
            column_count,
            column_types: column_types.to_vec(),
            column_meta,
            null_bitmap,
        }))
    }
}
