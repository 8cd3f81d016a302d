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
    registry::BodyDecoder,
};

/// Decoder for the GTID bookkeeping events this crate recognizes but does
/// not interpret: the raw body is retained for the caller.
pub(crate) struct RawGtidDecoder;

impl BodyDecoder for RawGtidDecoder {
    fn event_types(&self) -> &'static [EventType] {
        &[
            EventType::ANONYMOUS_GTID_EVENT,
            EventType::PREVIOUS_GTIDS_EVENT,
        ]
    }

    fn decode(
        &self,
        event_type: EventType,
        data: &[u8],
        _ctx: &DecodingContext,
    ) -> Result<EventBody, DecodeError> {
        let data = data.to_vec();
        Ok(match event_type {
            EventType::ANONYMOUS_GTID_EVENT => EventBody::AnonymousGtid(data),
            _ => EventBody::PreviousGtids(data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodies_kept_raw() {
        let ctx = DecodingContext::new();
        let data = [1_u8, 2, 3, 4];

        match RawGtidDecoder
            .decode(EventType::PREVIOUS_GTIDS_EVENT, &data, &ctx)
            .unwrap()
        {
            EventBody::PreviousGtids(body) => assert_eq!(body, data),
            other => panic!("unexpected body {:?}", other),
        }

        match RawGtidDecoder
            .decode(EventType::ANONYMOUS_GTID_EVENT, &data, &ctx)
            .unwrap()
        {
            EventBody::AnonymousGtid(body) => assert_eq!(body, data),
            other => panic!("unexpected body {:?}", other),
        }
    }
}
