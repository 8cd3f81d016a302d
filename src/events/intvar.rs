// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use crate::{
    constants::{EventType, IntvarEventType},
    context::DecodingContext,
    error::DecodeError,
    events::EventBody,
    io::ParseBuf,
    misc::raw::RawConst,
    registry::BodyDecoder,
};

/// Integer based session-variables event.
///
/// Written every time a statement uses an AUTO_INCREMENT column or the
/// LAST_INSERT_ID() function; precedes other events for the statement.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct IntvarEvent {
    /// Subtype of this event.
    pub subtype: RawConst<u8, IntvarEventType>,
    pub value: u64,
}

pub(crate) struct IntvarEventDecoder;

impl BodyDecoder for IntvarEventDecoder {
    fn event_types(&self) -> &'static [EventType] {
        &[EventType::INTVAR_EVENT]
    }

    fn decode(
        &self,
        _event_type: EventType,
        data: &[u8],
        _ctx: &DecodingContext,
    ) -> Result<EventBody, DecodeError> {
        let mut buf = ParseBuf(data);

        let subtype = buf.checked_eat_u8().ok_or(DecodeError::Truncated)?;
        let value = buf.checked_eat_u64_le().ok_or(DecodeError::Truncated)?;

        if !buf.is_empty() {
            return Err(DecodeError::Truncated);
        }

        Ok(EventBody::Intvar(IntvarEvent {
            subtype: RawConst::new(subtype),
            value,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insert_id() {
        let body = [0x02, 0x2a, 0, 0, 0, 0, 0, 0, 0];
        match IntvarEventDecoder
            .decode(EventType::INTVAR_EVENT, &body, &DecodingContext::new())
            .unwrap()
        {
            EventBody::Intvar(ev) => {
                assert_eq!(ev.subtype.get(), Ok(IntvarEventType::INSERT_ID_EVENT));
                assert_eq!(ev.value, 42);
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn exact_size_enforced() {
        let ctx = DecodingContext::new();
        assert!(matches!(
            IntvarEventDecoder.decode(EventType::INTVAR_EVENT, &[0x01, 0x2a], &ctx),
            Err(DecodeError::Truncated)
        ));
        assert!(matches!(
            IntvarEventDecoder.decode(EventType::INTVAR_EVENT, &[0x01; 10], &ctx),
            Err(DecodeError::Truncated)
        ));
    }
}
