// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! The stream driver: magic check, the per-event loop, windowing.

use std::convert::TryFrom;
use std::io::{self, Read};

use crate::{
    checksum,
    constants::EventType,
    context::DecodingContext,
    error::DecodeError,
    events::{Event, EventBody, EventHeader},
    registry::BodyDecoderRegistry,
};

/// A binlog file starts with a Binlog File Header `[ fe 'bin' ]`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct BinlogFileHeader;

impl BinlogFileHeader {
    /// Length of a binlog file header.
    pub const LEN: usize = 4;
    /// Value of a binlog file header.
    pub const VALUE: [u8; Self::LEN] = [0xfe, b'b', b'i', b'n'];

    /// Reads and validates the file magic.
    ///
    /// A file too short to hold the magic is not a binlog either.
    pub fn read<T: Read>(mut input: T) -> Result<(), DecodeError> {
        let mut buf = [0_u8; Self::LEN];
        match read_full(&mut input, &mut buf) {
            Ok(true) if buf == Self::VALUE => Ok(()),
            Ok(_) | Err(DecodeError::Truncated) => Err(DecodeError::BadMagic),
            Err(e) => Err(e),
        }
    }
}

/// Caller-supplied bounds that gate which events are surfaced.
///
/// Position and time bounds are independent alternatives: an event is
/// admitted once *any* supplied start bound admits it, and the walk stops
/// once *any* supplied end bound matches. In particular an explicit start
/// time of `0` admits every event regardless of a start position, since
/// every timestamp compares `>= 0` — callers wanting position-only
/// windowing leave the times unset.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct DecodeOptions {
    /// Byte offset from which events are surfaced. `0` means unset.
    pub start_pos: u64,
    /// Byte offset past which the walk stops. `0` means unset.
    pub end_pos: u64,
    /// Timestamp (seconds since epoch) from which events are surfaced.
    pub start_time: Option<u32>,
    /// Timestamp at which the walk stops.
    pub end_time: Option<u32>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_pos(mut self, start_pos: u64) -> Self {
        self.start_pos = start_pos;
        self
    }

    pub fn with_end_pos(mut self, end_pos: u64) -> Self {
        self.end_pos = end_pos;
        self
    }

    pub fn with_start_time(mut self, start_time: u32) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_end_time(mut self, end_time: u32) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Whether the event behind `header` falls inside the start bounds.
    pub fn need_start(&self, header: &EventHeader) -> bool {
        if self.start_pos == 0 && self.start_time.is_none() {
            return true;
        }
        let event_start = (header.log_pos as u64).saturating_sub(header.event_size as u64);
        if self.start_pos != 0 && self.start_pos <= event_start {
            return true;
        }
        matches!(self.start_time, Some(t) if header.timestamp >= t)
    }

    /// Whether the walk should stop after the event behind `header`.
    pub fn need_stop(&self, header: &EventHeader) -> bool {
        if self.end_pos != 0 && self.end_pos < header.log_pos as u64 {
            return true;
        }
        matches!(self.end_time, Some(t) if header.timestamp >= t)
    }
}

/// Streaming decoder for one binlog file.
///
/// Reads events strictly in file order from any `Read` source; the magic is
/// validated at construction. Context updates (format description, table
/// maps) happen before the triggering event is handed out, so they are
/// visible to every subsequent event's decoding.
#[derive(Debug)]
pub struct BinlogDecoder<R> {
    read: R,
    options: DecodeOptions,
    registry: BodyDecoderRegistry,
    context: DecodingContext,
    done: bool,
}

impl<R: Read> BinlogDecoder<R> {
    /// Creates a decoder over `read`, validating the file magic.
    pub fn new(read: R) -> Result<Self, DecodeError> {
        Self::with_options(read, DecodeOptions::default())
    }

    /// Creates a decoder with windowing options.
    pub fn with_options(read: R, options: DecodeOptions) -> Result<Self, DecodeError> {
        Self::with_registry(read, options, BodyDecoderRegistry::with_builtin_decoders())
    }

    /// Creates a decoder with a caller-built registry.
    pub fn with_registry(
        mut read: R,
        options: DecodeOptions,
        registry: BodyDecoderRegistry,
    ) -> Result<Self, DecodeError> {
        BinlogFileHeader::read(&mut read)?;
        Ok(Self {
            read,
            options,
            registry,
            context: DecodingContext::new(),
            done: false,
        })
    }

    /// The decoding context accumulated so far.
    pub fn context(&self) -> &DecodingContext {
        &self.context
    }

    /// Decodes the next surfaced event.
    ///
    /// Events outside the start window are read and discarded without being
    /// decoded; a clean EOF between events yields `Ok(None)`. Once an end
    /// bound matched, subsequent calls yield `Ok(None)` as well.
    pub fn next_event(&mut self) -> Result<Option<Event>, DecodeError> {
        if self.done {
            return Ok(None);
        }

        loop {
            let header_len = self.context.event_header_length();
            let mut head = vec![0_u8; header_len];
            if !read_full(&mut self.read, &mut head)? {
                return Ok(None);
            }

            let header = EventHeader::read(&head, header_len)?;
            let event_type = EventType::try_from(header.event_type.0)
                .map_err(|e| DecodeError::UnknownEventType(e.0))?;

            let body_len = (header.event_size as usize)
                .checked_sub(header_len)
                .ok_or(DecodeError::Truncated)?;

            // The format description carries file-global state and is never
            // skipped, even when it falls before the window.
            if event_type != EventType::FORMAT_DESCRIPTION_EVENT
                && !self.options.need_start(&header)
            {
                self.discard(body_len as u64)?;
                continue;
            }

            let mut body = vec![0_u8; body_len];
            if !read_full(&mut self.read, &mut body)? {
                return Err(DecodeError::Truncated);
            }

            let (body, checksum) =
                checksum::validate(&header.raw, &body, self.context.has_checksum())?;

            let decoder = self
                .registry
                .get(event_type)
                .ok_or(DecodeError::UnsupportedEventType(event_type))?;
            let body = decoder.decode(event_type, body, &self.context)?;

            match &body {
                EventBody::FormatDescription(fde) => self.context.set_description(fde.clone()),
                EventBody::TableMap(table_map) => {
                    self.context.insert_table_map(table_map.clone())
                }
                _ => (),
            }

            if self.options.need_stop(&header) {
                self.done = true;
            }

            return Ok(Some(Event {
                header,
                body,
                checksum,
            }));
        }
    }

    /// Walks every surfaced event, handing each to `f`.
    ///
    /// The walk stops when `f` returns `Ok(false)` or an error, when an end
    /// bound matches, or on clean EOF (which is not an error).
    pub fn walk<F>(&mut self, mut f: F) -> Result<(), DecodeError>
    where
        F: FnMut(Event) -> Result<bool, DecodeError>,
    {
        while let Some(event) = self.next_event()? {
            if !f(event)? {
                break;
            }
        }
        Ok(())
    }

    fn discard(&mut self, n: u64) -> Result<(), DecodeError> {
        let copied = io::copy(&mut (&mut self.read).take(n), &mut io::sink())?;
        if copied < n {
            return Err(DecodeError::Truncated);
        }
        Ok(())
    }
}

impl<R: Read> Iterator for BinlogDecoder<R> {
    type Item = Result<Event, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

/// Fills `buf` from `read`.
///
/// Returns `Ok(false)` on EOF before the first byte; EOF mid-buffer is
/// [`DecodeError::Truncated`].
fn read_full<R: Read>(read: &mut R, buf: &mut [u8]) -> Result<bool, DecodeError> {
    let mut filled = 0;
    while filled < buf.len() {
        match read.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => return Err(DecodeError::Truncated),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => (),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with(log_pos: u32, event_size: u32, timestamp: u32) -> EventHeader {
        EventHeader {
            timestamp,
            event_type: crate::misc::raw::RawConst::new(EventType::QUERY_EVENT as u8),
            server_id: 1,
            event_size,
            log_pos,
            flags: 0,
            raw: Vec::new(),
        }
    }

    #[test]
    fn no_window_admits_everything() {
        let options = DecodeOptions::default();
        assert!(options.need_start(&header_with(100, 40, 0)));
        assert!(!options.need_stop(&header_with(100, 40, 0)));
    }

    #[test]
    fn start_pos_gates_by_event_start() {
        let options = DecodeOptions::new().with_start_pos(1000);
        // event spans [960, 1000): admitted
        assert!(options.need_start(&header_with(1000, 40, 0)));
        // event spans [900, 940): skipped
        assert!(!options.need_start(&header_with(940, 40, 0)));
    }

    #[test]
    fn explicit_zero_start_time_admits_despite_position() {
        let options = DecodeOptions::new().with_start_pos(1000).with_start_time(0);
        assert!(options.need_start(&header_with(940, 40, 0)));
    }

    #[test]
    fn start_time_gates_by_timestamp() {
        let options = DecodeOptions::new().with_start_time(500);
        assert!(!options.need_start(&header_with(100, 40, 499)));
        assert!(options.need_start(&header_with(100, 40, 500)));
    }

    #[test]
    fn stop_bounds() {
        let options = DecodeOptions::new().with_end_pos(1000);
        assert!(!options.need_stop(&header_with(1000, 40, 0)));
        assert!(options.need_stop(&header_with(1001, 40, 0)));

        let options = DecodeOptions::new().with_end_time(500);
        assert!(!options.need_stop(&header_with(100, 40, 499)));
        assert!(options.need_stop(&header_with(100, 40, 500)));
    }

    #[test]
    fn magic_rejection() {
        assert!(matches!(
            BinlogFileHeader::read(&[0x00_u8, 0x00, 0x00, 0x00][..]),
            Err(DecodeError::BadMagic)
        ));
        assert!(matches!(
            BinlogFileHeader::read(&[0xfe_u8, b'b'][..]),
            Err(DecodeError::BadMagic)
        ));
        assert!(BinlogFileHeader::read(&BinlogFileHeader::VALUE[..]).is_ok());
    }
}
