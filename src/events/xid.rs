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
    registry::BodyDecoder,
};

/// Xid event.
///
/// Generated for a commit of a transaction that modifies one or more tables
/// of an XA-capable storage engine.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct XidEvent {
    pub xid: u64,
}

pub(crate) struct XidEventDecoder;

impl BodyDecoder for XidEventDecoder {
    fn event_types(&self) -> &'static [EventType] {
        &[EventType::XID_EVENT]
    }

    fn decode(
        &self,
        _event_type: EventType,
        data: &[u8],
        _ctx: &DecodingContext,
    ) -> Result<EventBody, DecodeError> {
        let mut buf = ParseBuf(data);
        let xid = buf.checked_eat_u64_le().ok_or(DecodeError::Truncated)?;

        if !buf.is_empty() {
            return Err(DecodeError::Truncated);
        }

        Ok(EventBody::Xid(XidEvent { xid }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_xid() {
        let body = 3620_u64.to_le_bytes();
        match XidEventDecoder
            .decode(EventType::XID_EVENT, &body, &DecodingContext::new())
            .unwrap()
        {
            EventBody::Xid(ev) => assert_eq!(ev.xid, 3620),
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn short_body() {
        assert!(matches!(
            XidEventDecoder.decode(EventType::XID_EVENT, &[1, 2, 3], &DecodingContext::new()),
            Err(DecodeError::Truncated)
        ));
    }
}
