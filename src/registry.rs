// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! The event-type → body-decoder table.

use std::fmt;

use crate::{
    constants::EventType,
    context::DecodingContext,
    error::DecodeError,
    events::{
        format_description::FormatDescriptionDecoder, gtid::RawGtidDecoder,
        intvar::IntvarEventDecoder, query::QueryEventDecoder, rotate::RotateEventDecoder,
        rows::RowsEventDecoder, table_map::TableMapEventDecoder, xid::XidEventDecoder,
        EventBody, UnknownEventDecoder,
    },
};

/// A body decoder parses the type-specific payload of an event.
///
/// Decoders are pure: they read the body slice (checksum trailer already
/// removed) and the decoding context, and perform no I/O. A decoder
/// advertises the set of tags it claims; the driver passes the concrete tag
/// back in so one decoder can serve several related types.
pub trait BodyDecoder: Sync {
    /// Event-type tags this decoder claims.
    fn event_types(&self) -> &'static [EventType];

    /// Parses `data` into an event body.
    fn decode(
        &self,
        event_type: EventType,
        data: &[u8],
        ctx: &DecodingContext,
    ) -> Result<EventBody, DecodeError>;
}

static FORMAT_DESCRIPTION_DECODER: FormatDescriptionDecoder = FormatDescriptionDecoder;
static QUERY_DECODER: QueryEventDecoder = QueryEventDecoder;
static ROTATE_DECODER: RotateEventDecoder = RotateEventDecoder;
static INTVAR_DECODER: IntvarEventDecoder = IntvarEventDecoder;
static XID_DECODER: XidEventDecoder = XidEventDecoder;
static TABLE_MAP_DECODER: TableMapEventDecoder = TableMapEventDecoder;
static ROWS_DECODER: RowsEventDecoder = RowsEventDecoder;
static RAW_GTID_DECODER: RawGtidDecoder = RawGtidDecoder;
static UNKNOWN_DECODER: UnknownEventDecoder = UnknownEventDecoder;

/// Table of body decoders, indexed by the one-byte event type tag.
///
/// Built once at decoder construction — registration is not allowed to race
/// with decoding, and a duplicate registration is a programming error that
/// surfaces immediately instead of mid-file.
pub struct BodyDecoderRegistry {
    slots: [Option<&'static dyn BodyDecoder>; 256],
}

impl BodyDecoderRegistry {
    /// Creates a registry with no decoders.
    pub fn empty() -> Self {
        Self { slots: [None; 256] }
    }

    /// Creates a registry with every built-in decoder registered.
    pub fn with_builtin_decoders() -> Self {
        let mut registry = Self::empty();
        registry.register(&FORMAT_DESCRIPTION_DECODER);
        registry.register(&QUERY_DECODER);
        registry.register(&ROTATE_DECODER);
        registry.register(&INTVAR_DECODER);
        registry.register(&XID_DECODER);
        registry.register(&TABLE_MAP_DECODER);
        registry.register(&ROWS_DECODER);
        registry.register(&RAW_GTID_DECODER);
        registry.register(&UNKNOWN_DECODER);
        registry
    }

    /// Registers `decoder` for every tag it claims.
    ///
    /// # Panics
    ///
    /// Panics if one of the claimed tags already has a decoder.
    pub fn register(&mut self, decoder: &'static dyn BodyDecoder) {
        for event_type in decoder.event_types() {
            let slot = &mut self.slots[*event_type as u8 as usize];
            if slot.is_some() {
                panic!("Redefinition of body decoder for {:?}", event_type);
            }
            *slot = Some(decoder);
        }
    }

    /// Returns the decoder registered for `event_type`, if any.
    pub fn get(&self, event_type: EventType) -> Option<&'static dyn BodyDecoder> {
        self.slots[event_type as u8 as usize]
    }
}

impl Default for BodyDecoderRegistry {
    fn default() -> Self {
        Self::with_builtin_decoders()
    }
}

impl fmt::Debug for BodyDecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<u8> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(tag, slot)| slot.map(|_| tag as u8))
            .collect();
        f.debug_struct("BodyDecoderRegistry")
            .field("registered_tags", &tags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_cover_supported_tags() {
        let registry = BodyDecoderRegistry::with_builtin_decoders();

        for ty in [
            EventType::UNKNOWN_EVENT,
            EventType::QUERY_EVENT,
            EventType::ROTATE_EVENT,
            EventType::INTVAR_EVENT,
            EventType::FORMAT_DESCRIPTION_EVENT,
            EventType::XID_EVENT,
            EventType::TABLE_MAP_EVENT,
            EventType::WRITE_ROWS_EVENT_V0,
            EventType::UPDATE_ROWS_EVENT_V1,
            EventType::DELETE_ROWS_EVENT_V2,
            EventType::ANONYMOUS_GTID_EVENT,
            EventType::PREVIOUS_GTIDS_EVENT,
        ] {
            assert!(registry.get(ty).is_some(), "{:?} has no decoder", ty);
        }

        for ty in [
            EventType::START_EVENT_V3,
            EventType::STOP_EVENT,
            EventType::LOAD_EVENT,
            EventType::INCIDENT_EVENT,
            EventType::HEARTBEAT_EVENT,
            EventType::GTID_EVENT,
        ] {
            assert!(registry.get(ty).is_none(), "{:?} has a decoder", ty);
        }
    }

    #[test]
    #[should_panic(expected = "Redefinition of body decoder")]
    fn duplicate_registration_panics() {
        let mut registry = BodyDecoderRegistry::with_builtin_decoders();
        registry.register(&XID_DECODER);
    }
}
