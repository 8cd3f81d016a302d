// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use crate::{
    constants::EventType,
    context::DecodingContext,
    error::DecodeError,
    events::EventBody,
    io::ParseBuf,
    misc::raw::RawText,
    registry::BodyDecoder,
};

/// The rotate event is added to the binlog as last event
/// to tell the reader what binlog to request next.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct RotateEvent {
    /// Position of the first event in the next log file.
    ///
    /// Only present if binlog version > 1 (zero otherwise).
    pub position: u64,
    /// Name of the next binlog, with trailing whitespace removed.
    pub name: RawText,
}

pub(crate) struct RotateEventDecoder;

impl BodyDecoder for RotateEventDecoder {
    fn event_types(&self) -> &'static [EventType] {
        &[EventType::ROTATE_EVENT]
    }

    fn decode(
        &self,
        _event_type: EventType,
        data: &[u8],
        ctx: &DecodingContext,
    ) -> Result<EventBody, DecodeError> {
        let description = ctx.require_description()?;
        let mut buf = ParseBuf(data);

        let position = if description.binlog_version > 1 {
            buf.checked_eat_u64_le().ok_or(DecodeError::Truncated)?
        } else {
            0
        };

        let mut name = buf.eat_all();
        while let [head @ .., last] = name {
            if !last.is_ascii_whitespace() {
                break;
            }
            name = head;
        }

        Ok(EventBody::Rotate(RotateEvent {
            position,
            name: name.into(),
        }))
    }
}
