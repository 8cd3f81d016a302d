// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::{convert::TryFrom, fmt};

use crate::{
    constants::EventType,
    context::DecodingContext,
    error::DecodeError,
    events::EventBody,
    io::ParseBuf,
    misc::raw::RawText,
    registry::BodyDecoder,
};

/// A query event is created for each query that modifies the database,
/// unless the query is logged row-based.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct QueryEvent {
    /// The ID of the thread that issued this statement. It is needed for
    /// temporary tables.
    pub slave_proxy_id: u32,
    /// The time from when the query started to when it was logged in the
    /// binlog, in seconds.
    pub execution_time: u32,
    /// Error code generated by the master. If the master fails, the slave
    /// will fail with the same error code.
    pub error_code: u16,
    /// Zero or more status variables.
    ///
    /// Only present if binlog version >= 4 (empty otherwise).
    pub status_vars: StatusVars,
    /// The currently selected database name.
    pub schema: RawText,
    /// The SQL query.
    pub query: RawText,
}

/// Binlog query event status vars keys.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum StatusVarKey {
    /// Contains `Flags2` flags (4 bytes).
    Flags2 = 0,
    /// Contains the SQL mode (8 bytes).
    SqlMode,
    /// Contains values in the following order:
    ///
    /// *   1 byte `length`,
    /// *   `length` bytes catalog,
    /// *   NULL byte.
    Catalog,
    /// Contains 2-byte auto_increment_increment and 2-byte
    /// auto_increment_offset.
    AutoIncrement,
    /// Contains three 2-byte charset/collation codes.
    Charset,
    /// Contains 1 byte `length` followed by `length` bytes timezone.
    TimeZone,
    /// Like `Catalog` but without the trailing NULL byte.
    CatalogNz,
    /// Contains 2 bytes code identifying a table of month and day names.
    LcTimeNames,
    /// Contains 2 bytes value of the collation_database system variable.
    CharsetDatabase,
    /// Contains 8 bytes value of the table map that is to be updated by the
    /// multi-table update query statement.
    TableMapForUpdate,
    /// Contains 4 bytes bitfield.
    MasterDataWritten,
    /// Contains 1-byte-length-prefixed user and host.
    Invokers,
    /// Contains 1 byte `count` followed by `count` NUL-terminated database
    /// names.
    UpdatedDbNames,
    /// Contains a 3-byte microseconds value.
    Microseconds,
}

impl TryFrom<u8> for StatusVarKey {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(StatusVarKey::Flags2),
            0x01 => Ok(StatusVarKey::SqlMode),
            0x02 => Ok(StatusVarKey::Catalog),
            0x03 => Ok(StatusVarKey::AutoIncrement),
            0x04 => Ok(StatusVarKey::Charset),
            0x05 => Ok(StatusVarKey::TimeZone),
            0x06 => Ok(StatusVarKey::CatalogNz),
            0x07 => Ok(StatusVarKey::LcTimeNames),
            0x08 => Ok(StatusVarKey::CharsetDatabase),
            0x09 => Ok(StatusVarKey::TableMapForUpdate),
            0x0a => Ok(StatusVarKey::MasterDataWritten),
            0x0b => Ok(StatusVarKey::Invokers),
            0x0c => Ok(StatusVarKey::UpdatedDbNames),
            0x0d => Ok(StatusVarKey::Microseconds),
            x => Err(x),
        }
    }
}

/// Raw status variable.
///
/// Values are kept as raw bytes — interpreting them is the caller's
/// business.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct StatusVar<'a> {
    pub key: StatusVarKey,
    pub value: &'a [u8],
}

impl fmt::Debug for StatusVar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusVar")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

/// Status variables of a QueryEvent.
#[derive(Clone, Default, Eq, PartialEq, Hash)]
pub struct StatusVars(pub Vec<u8>);

impl StatusVars {
    /// Returns an iterator over QueryEvent status variables.
    pub fn iter(&self) -> StatusVarsIterator<'_> {
        StatusVarsIterator::new(&self.0)
    }

    /// Returns raw value of a status variable by key.
    pub fn get_status_var(&self, needle: StatusVarKey) -> Option<StatusVar<'_>> {
        self.iter().find(|var| var.key == needle)
    }
}

impl fmt::Debug for StatusVars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over status vars of a `QueryEvent`.
///
/// It will stop iteration if vars can't be parsed.
#[derive(Clone, Eq, PartialEq)]
pub struct StatusVarsIterator<'a> {
    pos: usize,
    status_vars: &'a [u8],
}

impl<'a> StatusVarsIterator<'a> {
    pub fn new(status_vars: &'a [u8]) -> StatusVarsIterator<'a> {
        Self {
            pos: 0,
            status_vars,
        }
    }
}

impl<'a> Iterator for StatusVarsIterator<'a> {
    type Item = StatusVar<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = *self.status_vars.get(self.pos)?;
        let key = StatusVarKey::try_from(key).ok()?;
        self.pos += 1;

        macro_rules! get_fixed {
            ($len:expr) => {{
                self.pos += $len;
                self.status_vars.get((self.pos - $len)..self.pos)?
            }};
        }

        macro_rules! get_var {
            ($suffix_len:expr) => {{
                let len = *self.status_vars.get(self.pos)? as usize;
                get_fixed!(1 + len + $suffix_len)
            }};
        }

        let value = match key {
            StatusVarKey::Flags2 => get_fixed!(4),
            StatusVarKey::SqlMode => get_fixed!(8),
            StatusVarKey::Catalog => get_var!(1),
            StatusVarKey::AutoIncrement => get_fixed!(4),
            StatusVarKey::Charset => get_fixed!(6),
            StatusVarKey::TimeZone => get_var!(0),
            StatusVarKey::CatalogNz => get_var!(0),
            StatusVarKey::LcTimeNames => get_fixed!(2),
            StatusVarKey::CharsetDatabase => get_fixed!(2),
            StatusVarKey::TableMapForUpdate => get_fixed!(8),
            StatusVarKey::MasterDataWritten => get_fixed!(4),
            StatusVarKey::Invokers => {
                let user_len = *self.status_vars.get(self.pos)? as usize;
                let host_len = *self.status_vars.get(self.pos + 1 + user_len)? as usize;
                get_fixed!(1 + user_len + 1 + host_len)
            }
            StatusVarKey::UpdatedDbNames => {
                let mut total = 1;
                let count = *self.status_vars.get(self.pos)? as usize;
                for _ in 0..count {
                    while *self.status_vars.get(self.pos + total)? != 0x00 {
                        total += 1;
                    }
                    total += 1;
                }
                get_fixed!(total)
            }
            StatusVarKey::Microseconds => get_fixed!(3),
        };

        Some(StatusVar { key, value })
    }
}

pub(crate) struct QueryEventDecoder;

impl BodyDecoder for QueryEventDecoder {
    fn event_types(&self) -> &'static [EventType] {
        &[EventType::QUERY_EVENT]
    }

    fn decode(
        &self,
        _event_type: EventType,
        data: &[u8],
        ctx: &DecodingContext,
    ) -> Result<EventBody, DecodeError> {
        let description = ctx.require_description()?;
        let mut buf = ParseBuf(data);

        let slave_proxy_id = buf.checked_eat_u32_le().ok_or(DecodeError::Truncated)?;
        let execution_time = buf.checked_eat_u32_le().ok_or(DecodeError::Truncated)?;
        let schema_len = buf.checked_eat_u8().ok_or(DecodeError::Truncated)? as usize;
        let error_code = buf.checked_eat_u16_le().ok_or(DecodeError::Truncated)?;

        let status_vars = if description.binlog_version >= 4 {
            let status_vars_len = buf.checked_eat_u16_le().ok_or(DecodeError::Truncated)? as usize;
            buf.checked_eat(status_vars_len)
                .ok_or(DecodeError::Truncated)?
        } else {
            &[][..]
        };

        let schema = buf.checked_eat(schema_len).ok_or(DecodeError::Truncated)?;
        buf.checked_eat_u8().ok_or(DecodeError::Truncated)?; // 0x00 separator

        // the query runs to the end of the body
        let query = buf.eat_all();

        Ok(EventBody::Query(QueryEvent {
            slave_proxy_id,
            execution_time,
            error_code,
            status_vars: StatusVars(status_vars.to_vec()),
            schema: schema.into(),
            query: query.into(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::format_description::FormatDescriptionEvent;

    fn ctx_v4() -> DecodingContext {
        let mut ctx = DecodingContext::new();
        ctx.set_description(FormatDescriptionEvent {
            binlog_version: 4,
            server_version: "5.6.10".into(),
            create_timestamp: 0,
            event_header_length: 19,
            event_type_header_lengths: vec![0; 40],
            has_checksum: true,
        });
        ctx
    }

    fn query_body(status_vars: &[u8], schema: &[u8], query: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&7_u32.to_le_bytes()); // slave_proxy_id
        body.extend_from_slice(&0_u32.to_le_bytes()); // execution time
        body.push(schema.len() as u8);
        body.extend_from_slice(&0_u16.to_le_bytes()); // error code
        body.extend_from_slice(&(status_vars.len() as u16).to_le_bytes());
        body.extend_from_slice(status_vars);
        body.extend_from_slice(schema);
        body.push(0x00);
        body.extend_from_slice(query);
        body
    }

    fn decode(body: &[u8], ctx: &DecodingContext) -> QueryEvent {
        match QueryEventDecoder
            .decode(EventType::QUERY_EVENT, body, ctx)
            .unwrap()
        {
            EventBody::Query(ev) => ev,
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn parses_begin() {
        let body = query_body(&[], b"test", b"BEGIN");
        let ev = decode(&body, &ctx_v4());
        assert_eq!(ev.slave_proxy_id, 7);
        assert_eq!(ev.execution_time, 0);
        assert_eq!(ev.error_code, 0);
        assert_eq!(ev.schema.as_str(), "test");
        assert_eq!(ev.query.as_str(), "BEGIN");
        assert!(ev.status_vars.0.is_empty());
    }

    #[test]
    fn walks_status_vars() {
        // Q_FLAGS2_CODE, Q_SQL_MODE_CODE, Q_CHARSET_CODE, Q_MICROSECONDS
        let mut vars = vec![0x00, 0x01, 0x02, 0x03, 0x04];
        vars.extend_from_slice(&[0x01, 1, 2, 3, 4, 5, 6, 7, 8]);
        vars.extend_from_slice(&[0x04, 0x08, 0x00, 0x08, 0x00, 0x08, 0x00]);
        vars.extend_from_slice(&[0x0d, 0xaa, 0xbb, 0xcc]);

        let body = query_body(&vars, b"mysql", b"COMMIT");
        let ev = decode(&body, &ctx_v4());

        let seen: Vec<_> = ev.status_vars.iter().map(|var| var.key).collect();
        assert_eq!(
            seen,
            vec![
                StatusVarKey::Flags2,
                StatusVarKey::SqlMode,
                StatusVarKey::Charset,
                StatusVarKey::Microseconds,
            ]
        );
        assert_eq!(
            ev.status_vars
                .get_status_var(StatusVarKey::Flags2)
                .unwrap()
                .value,
            &[0x01, 0x02, 0x03, 0x04]
        );
        assert_eq!(
            ev.status_vars
                .get_status_var(StatusVarKey::Microseconds)
                .unwrap()
                .value,
            &[0xaa, 0xbb, 0xcc]
        );
        assert_eq!(ev.query.as_str(), "COMMIT");
    }

    #[test]
    fn var_length_status_vars() {
        // Q_CATALOG (len + str + NUL), then Q_TIME_ZONE_CODE (len + str)
        let mut vars = vec![0x02, 3, b's', b't', b'd', 0x00];
        vars.extend_from_slice(&[0x05, 3, b'U', b'T', b'C']);

        let body = query_body(&vars, b"db", b"DROP TABLE t");
        let ev = decode(&body, &ctx_v4());

        assert_eq!(
            ev.status_vars
                .get_status_var(StatusVarKey::Catalog)
                .unwrap()
                .value,
            &[3, b's', b't', b'd', 0x00]
        );
        assert_eq!(
            ev.status_vars
                .get_status_var(StatusVarKey::TimeZone)
                .unwrap()
                .value,
            &[3, b'U', b'T', b'C']
        );
    }

    #[test]
    fn unknown_status_key_stops_iteration() {
        let vars = vec![0x00, 1, 2, 3, 4, 0x7f, 0xde, 0xad];
        let body = query_body(&vars, b"", b"SELECT 1");
        let ev = decode(&body, &ctx_v4());
        assert_eq!(ev.status_vars.iter().count(), 1);
    }

    #[test]
    fn requires_format_description() {
        let ctx = DecodingContext::new();
        let body = query_body(&[], b"test", b"BEGIN");
        assert!(matches!(
            QueryEventDecoder.decode(EventType::QUERY_EVENT, &body, &ctx),
            Err(DecodeError::MissingFormatDescription)
        ));
    }

    #[test]
    fn truncated_schema() {
        let mut body = query_body(&[], b"test", b"BEGIN");
        body.truncate(14); // cut inside the schema
        assert!(matches!(
            QueryEventDecoder.decode(EventType::QUERY_EVENT, &body, &ctx_v4()),
            Err(DecodeError::Truncated)
        ));
    }
}
