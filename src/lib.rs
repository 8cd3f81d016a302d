// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Streaming decoder for MySql binary log files.
//!
//! This crate turns the on-disk append-only binlog event stream into a
//! typed sequence of replication events. It:
//!
//! * validates the binlog file magic;
//! * decodes common event headers (legacy 13-byte and v4 19-byte layouts);
//! * dispatches per-type body decoders through a registry indexed by the
//!   one-byte event type tag;
//! * threads a per-file context (format description, table maps) across
//!   events that depend on it;
//! * verifies per-event CRC32 checksums when the server version enables
//!   them;
//! * honors caller-supplied position/time windows for selective decoding.
//!
//! The decoder consumes any [`std::io::Read`] — file handling, buffering
//! and everything downstream of the decoded events is the caller's
//! business. Row images inside rows events are surfaced as raw bytes; this
//! crate decodes up to the rows-event header and bitmaps.
//!
//! ```no_run
//! use mysql_binlog_reader::{BinlogDecoder, EventBody};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = std::fs::File::open("mysql-bin.000004")?;
//! let mut decoder = BinlogDecoder::new(std::io::BufReader::new(file))?;
//!
//! decoder.walk(|event| {
//!     if let EventBody::Query(query) = &event.body {
//!         println!("{}: {}", query.schema.as_str(), query.query.as_str());
//!     }
//!     Ok(true)
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod constants;
pub mod context;
pub mod decoder;
pub mod error;
pub mod events;
pub mod io;
pub mod misc;
pub mod registry;

pub use self::{
    context::DecodingContext,
    decoder::{BinlogDecoder, BinlogFileHeader, DecodeOptions},
    error::DecodeError,
    events::{Event, EventBody, EventHeader},
    registry::{BodyDecoder, BodyDecoderRegistry},
};
