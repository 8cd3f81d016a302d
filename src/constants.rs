// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Binlog constants: event type tags, column types, flag words.

use std::convert::TryFrom;

/// Binlog Event Type.
///
/// The official numbering. Every tag here has a well-known name; only a
/// subset has a registered body decoder (see `registry`).
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EventType {
    /// Placeholder tag. A healthy server never writes it, and decoding
    /// refuses it.
    UNKNOWN_EVENT = 0x00,
    /// Opened binlog files of versions 1 to 3; v4 files open with a
    /// `FORMAT_DESCRIPTION_EVENT` instead.
    START_EVENT_V3 = 0x01,
    /// A data-modifying statement, logged as SQL text.
    QUERY_EVENT = 0x02,
    /// Clean server shutdown. Empty body.
    STOP_EVENT = 0x03,
    /// Closes the file and names the log file that continues the stream.
    ROTATE_EVENT = 0x04,
    INTVAR_EVENT = 0x05,
    LOAD_EVENT = 0x06,
    SLAVE_EVENT = 0x07,
    CREATE_FILE_EVENT = 0x08,
    APPEND_BLOCK_EVENT = 0x09,
    EXEC_LOAD_EVENT = 0x0a,
    DELETE_FILE_EVENT = 0x0b,
    NEW_LOAD_EVENT = 0x0c,
    RAND_EVENT = 0x0d,
    USER_VAR_EVENT = 0x0e,
    /// First event of every v4 file; fixes the layout of everything that
    /// follows it (header length, per-type post-header sizes, checksums).
    FORMAT_DESCRIPTION_EVENT = 0x0f,
    XID_EVENT = 0x10,
    BEGIN_LOAD_QUERY_EVENT = 0x11,
    EXECUTE_LOAD_QUERY_EVENT = 0x12,
    TABLE_MAP_EVENT = 0x13,
    WRITE_ROWS_EVENT_V0 = 0x14,
    UPDATE_ROWS_EVENT_V0 = 0x15,
    DELETE_ROWS_EVENT_V0 = 0x16,
    WRITE_ROWS_EVENT_V1 = 0x17,
    UPDATE_ROWS_EVENT_V1 = 0x18,
    DELETE_ROWS_EVENT_V1 = 0x19,
    INCIDENT_EVENT = 0x1a,
    HEARTBEAT_EVENT = 0x1b,
    IGNORABLE_EVENT = 0x1c,
    ROWS_QUERY_EVENT = 0x1d,
    WRITE_ROWS_EVENT_V2 = 0x1e,
    UPDATE_ROWS_EVENT_V2 = 0x1f,
    DELETE_ROWS_EVENT_V2 = 0x20,
    GTID_EVENT = 0x21,
    ANONYMOUS_GTID_EVENT = 0x22,
    PREVIOUS_GTIDS_EVENT = 0x23,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown event type {}", _0)]
#[repr(transparent)]
pub struct UnknownEventType(pub u8);

impl From<UnknownEventType> for u8 {
    fn from(x: UnknownEventType) -> Self {
        x.0
    }
}

impl TryFrom<u8> for EventType {
    type Error = UnknownEventType;

    fn try_from(byte: u8) -> Result<Self, UnknownEventType> {
        match byte {
            0x00 => Ok(Self::UNKNOWN_EVENT),
            0x01 => Ok(Self::START_EVENT_V3),
            0x02 => Ok(Self::QUERY_EVENT),
            0x03 => Ok(Self::STOP_EVENT),
            0x04 => Ok(Self::ROTATE_EVENT),
            0x05 => Ok(Self::INTVAR_EVENT),
            0x06 => Ok(Self::LOAD_EVENT),
            0x07 => Ok(Self::SLAVE_EVENT),
            0x08 => Ok(Self::CREATE_FILE_EVENT),
            0x09 => Ok(Self::APPEND_BLOCK_EVENT),
            0x0a => Ok(Self::EXEC_LOAD_EVENT),
            0x0b => Ok(Self::DELETE_FILE_EVENT),
            0x0c => Ok(Self::NEW_LOAD_EVENT),
            0x0d => Ok(Self::RAND_EVENT),
            0x0e => Ok(Self::USER_VAR_EVENT),
            0x0f => Ok(Self::FORMAT_DESCRIPTION_EVENT),
            0x10 => Ok(Self::XID_EVENT),
            0x11 => Ok(Self::BEGIN_LOAD_QUERY_EVENT),
            0x12 => Ok(Self::EXECUTE_LOAD_QUERY_EVENT),
            0x13 => Ok(Self::TABLE_MAP_EVENT),
            0x14 => Ok(Self::WRITE_ROWS_EVENT_V0),
            0x15 => Ok(Self::UPDATE_ROWS_EVENT_V0),
            0x16 => Ok(Self::DELETE_ROWS_EVENT_V0),
            0x17 => Ok(Self::WRITE_ROWS_EVENT_V1),
            0x18 => Ok(Self::UPDATE_ROWS_EVENT_V1),
            0x19 => Ok(Self::DELETE_ROWS_EVENT_V1),
            0x1a => Ok(Self::INCIDENT_EVENT),
            0x1b => Ok(Self::HEARTBEAT_EVENT),
            0x1c => Ok(Self::IGNORABLE_EVENT),
            0x1d => Ok(Self::ROWS_QUERY_EVENT),
            0x1e => Ok(Self::WRITE_ROWS_EVENT_V2),
            0x1f => Ok(Self::UPDATE_ROWS_EVENT_V2),
            0x20 => Ok(Self::DELETE_ROWS_EVENT_V2),
            0x21 => Ok(Self::GTID_EVENT),
            0x22 => Ok(Self::ANONYMOUS_GTID_EVENT),
            0x23 => Ok(Self::PREVIOUS_GTIDS_EVENT),
            x => Err(UnknownEventType(x)),
        }
    }
}

impl EventType {
    /// Returns `true` for the nine rows-event tags (v0, v1 and v2).
    pub fn is_rows_event(&self) -> bool {
        matches!(
            self,
            Self::WRITE_ROWS_EVENT_V0
                | Self::UPDATE_ROWS_EVENT_V0
                | Self::DELETE_ROWS_EVENT_V0
                | Self::WRITE_ROWS_EVENT_V1
                | Self::UPDATE_ROWS_EVENT_V1
                | Self::DELETE_ROWS_EVENT_V1
                | Self::WRITE_ROWS_EVENT_V2
                | Self::UPDATE_ROWS_EVENT_V2
                | Self::DELETE_ROWS_EVENT_V2
        )
    }
}

/// Type of the value stored in a column of a TABLE_MAP event.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ColumnType {
    MYSQL_TYPE_DECIMAL = 0x00,
    MYSQL_TYPE_TINY = 0x01,
    MYSQL_TYPE_SHORT = 0x02,
    MYSQL_TYPE_LONG = 0x03,
    MYSQL_TYPE_FLOAT = 0x04,
    MYSQL_TYPE_DOUBLE = 0x05,
    MYSQL_TYPE_NULL = 0x06,
    MYSQL_TYPE_TIMESTAMP = 0x07,
    MYSQL_TYPE_LONGLONG = 0x08,
    MYSQL_TYPE_INT24 = 0x09,
    MYSQL_TYPE_DATE = 0x0a,
    MYSQL_TYPE_TIME = 0x0b,
    MYSQL_TYPE_DATETIME = 0x0c,
    MYSQL_TYPE_YEAR = 0x0d,
    MYSQL_TYPE_NEWDATE = 0x0e,
    MYSQL_TYPE_VARCHAR = 0x0f,
    MYSQL_TYPE_BIT = 0x10,
    // mysql 5.6
    MYSQL_TYPE_TIMESTAMP2 = 0x11,
    MYSQL_TYPE_DATETIME2 = 0x12,
    MYSQL_TYPE_TIME2 = 0x13,
    MYSQL_TYPE_JSON = 0xf5,
    MYSQL_TYPE_NEWDECIMAL = 0xf6,
    MYSQL_TYPE_ENUM = 0xf7,
    MYSQL_TYPE_SET = 0xf8,
    MYSQL_TYPE_TINY_BLOB = 0xf9,
    MYSQL_TYPE_MEDIUM_BLOB = 0xfa,
    MYSQL_TYPE_LONG_BLOB = 0xfb,
    MYSQL_TYPE_BLOB = 0xfc,
    MYSQL_TYPE_VAR_STRING = 0xfd,
    MYSQL_TYPE_STRING = 0xfe,
    MYSQL_TYPE_GEOMETRY = 0xff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown column type {}", _0)]
#[repr(transparent)]
pub struct UnknownColumnType(pub u8);

impl From<UnknownColumnType> for u8 {
    fn from(x: UnknownColumnType) -> Self {
        x.0
    }
}

impl TryFrom<u8> for ColumnType {
    type Error = UnknownColumnType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::MYSQL_TYPE_DECIMAL),
            0x01 => Ok(Self::MYSQL_TYPE_TINY),
            0x02 => Ok(Self::MYSQL_TYPE_SHORT),
            0x03 => Ok(Self::MYSQL_TYPE_LONG),
            0x04 => Ok(Self::MYSQL_TYPE_FLOAT),
            0x05 => Ok(Self::MYSQL_TYPE_DOUBLE),
            0x06 => Ok(Self::MYSQL_TYPE_NULL),
            0x07 => Ok(Self::MYSQL_TYPE_TIMESTAMP),
            0x08 => Ok(Self::MYSQL_TYPE_LONGLONG),
            0x09 => Ok(Self::MYSQL_TYPE_INT24),
            0x0a => Ok(Self::MYSQL_TYPE_DATE),
            0x0b => Ok(Self::MYSQL_TYPE_TIME),
            0x0c => Ok(Self::MYSQL_TYPE_DATETIME),
            0x0d => Ok(Self::MYSQL_TYPE_YEAR),
            0x0e => Ok(Self::MYSQL_TYPE_NEWDATE),
            0x0f => Ok(Self::MYSQL_TYPE_VARCHAR),
            0x10 => Ok(Self::MYSQL_TYPE_BIT),
            0x11 => Ok(Self::MYSQL_TYPE_TIMESTAMP2),
            0x12 => Ok(Self::MYSQL_TYPE_DATETIME2),
            0x13 => Ok(Self::MYSQL_TYPE_TIME2),
            0xf5 => Ok(Self::MYSQL_TYPE_JSON),
            0xf6 => Ok(Self::MYSQL_TYPE_NEWDECIMAL),
            0xf7 => Ok(Self::MYSQL_TYPE_ENUM),
            0xf8 => Ok(Self::MYSQL_TYPE_SET),
            0xf9 => Ok(Self::MYSQL_TYPE_TINY_BLOB),
            0xfa => Ok(Self::MYSQL_TYPE_MEDIUM_BLOB),
            0xfb => Ok(Self::MYSQL_TYPE_LONG_BLOB),
            0xfc => Ok(Self::MYSQL_TYPE_BLOB),
            0xfd => Ok(Self::MYSQL_TYPE_VAR_STRING),
            0xfe => Ok(Self::MYSQL_TYPE_STRING),
            0xff => Ok(Self::MYSQL_TYPE_GEOMETRY),
            x => Err(UnknownColumnType(x)),
        }
    }
}

/// Type of an `IntvarEvent`.
#[repr(u8)]
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum IntvarEventType {
    INVALID_INT_EVENT,
    /// Indicates the value to use for the `LAST_INSERT_ID()` function in the
    /// next statement.
    LAST_INSERT_ID_EVENT,
    /// Indicates the value to use for an `AUTO_INCREMENT` column in the next
    /// statement.
    INSERT_ID_EVENT,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown intvar event type {}", _0)]
#[repr(transparent)]
pub struct UnknownIntvarEventType(pub u8);

impl From<UnknownIntvarEventType> for u8 {
    fn from(x: UnknownIntvarEventType) -> Self {
        x.0
    }
}

impl TryFrom<u8> for IntvarEventType {
    type Error = UnknownIntvarEventType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::INVALID_INT_EVENT),
            1 => Ok(Self::LAST_INSERT_ID_EVENT),
            2 => Ok(Self::INSERT_ID_EVENT),
            x => Err(UnknownIntvarEventType(x)),
        }
    }
}

bitflags::bitflags! {
    /// Flags carried in the common event header.
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct EventFlags: u16 {
        /// Set on the format description while the file is being written
        /// and cleared on close; finding it set marks a file the server
        /// never closed.
        const LOG_EVENT_BINLOG_IN_USE_F = 0x0001;

        /// Historical, no longer written.
        const LOG_EVENT_FORCED_ROTATE_F = 0x0002;

        /// The statement only makes sense on the connection that issued it
        /// (temporary tables).
        const LOG_EVENT_THREAD_SPECIFIC_F = 0x0004;

        /// No implicit `USE` of the default database is needed to replay
        /// the statement.
        const LOG_EVENT_SUPPRESS_USE_F = 0x0008;

        /// Historical, no longer written.
        const LOG_EVENT_UPDATE_TABLE_MAP_VERSION_F = 0x0010;

        /// Synthesized by a replica rather than read off a master log;
        /// does not advance the recorded master position.
        const LOG_EVENT_ARTIFICIAL_F = 0x0020;

        /// Stamped by the replica's IO thread when copying the event into
        /// a relay log.
        const LOG_EVENT_RELAY_LOG_F = 0x0040;

        /// A reader that doesn't understand the event may skip it.
        const LOG_EVENT_IGNORABLE_F = 0x0080;

        /// Bypasses database filtering and is logged unconditionally.
        const LOG_EVENT_NO_FILTER_F = 0x0100;

        /// A parallel applier must run this event group in isolation.
        const LOG_EVENT_MTS_ISOLATE_F = 0x0200;
    }
}

bitflags::bitflags! {
    /// Flags in the post-header of rows events.
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct RowsEventFlags: u16 {
        /// Closes the statement this event belongs to.
        const STMT_END = 0x0001;
        /// Apply with foreign key checks switched off.
        const NO_FOREIGN_KEY_CHECKS = 0x0002;
        /// Apply with unique key checks switched off.
        const RELAXED_UNIQUE_CHECKS = 0x0004;
        /// Row images carry every column of the table, not only the
        /// changed ones.
        const COMPLETE_ROWS = 0x0008;
    }
}
