// Copyright (c) 2024 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Per-file decoding state threaded across events.

use std::collections::HashMap;

use crate::{
    error::DecodeError,
    events::{EventHeader, FormatDescriptionEvent, TableMapEvent},
};

/// State the decoder accumulates while walking one binlog file.
///
/// Different server versions lay events out differently, so decoding every
/// event after the first depends on the format description; rows events
/// additionally depend on the table maps seen before them. One context
/// belongs to exactly one decoder — nothing is shared between files.
#[derive(Debug, Clone, Default)]
pub struct DecodingContext {
    description: Option<FormatDescriptionEvent>,
    table_info: HashMap<u64, TableMapEvent>,
}

impl DecodingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The format description of the current file, once one was decoded.
    pub fn description(&self) -> Option<&FormatDescriptionEvent> {
        self.description.as_ref()
    }

    /// The format description, or [`DecodeError::MissingFormatDescription`].
    pub fn require_description(&self) -> Result<&FormatDescriptionEvent, DecodeError> {
        self.description
            .as_ref()
            .ok_or(DecodeError::MissingFormatDescription)
    }

    /// Pins the format description for the rest of the file.
    pub fn set_description(&mut self, description: FormatDescriptionEvent) {
        self.description = Some(description);
    }

    /// Header length every subsequent event uses.
    ///
    /// Before the format description is seen this is the v4 default of
    /// [`EventHeader::LEN`] bytes.
    pub fn event_header_length(&self) -> usize {
        match &self.description {
            Some(description) => description.event_header_length as usize,
            None => EventHeader::LEN,
        }
    }

    /// Whether event bodies end with a checksum trailer.
    pub fn has_checksum(&self) -> bool {
        self.description
            .as_ref()
            .map(|d| d.has_checksum)
            .unwrap_or(false)
    }

    /// Installs a table map under its table id. Later maps win.
    pub fn insert_table_map(&mut self, table_map: TableMapEvent) {
        self.table_info.insert(table_map.table_id, table_map);
    }

    /// Returns the table map a rows event refers to.
    pub fn table_map(&self, table_id: u64) -> Option<&TableMapEvent> {
        self.table_info.get(&table_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_before_format_description() {
        let ctx = DecodingContext::new();
        assert_eq!(ctx.event_header_length(), 19);
        assert!(!ctx.has_checksum());
        assert!(ctx.description().is_none());
        assert!(matches!(
            ctx.require_description(),
            Err(DecodeError::MissingFormatDescription)
        ));
    }

    #[test]
    fn later_table_map_wins() {
        let mut ctx = DecodingContext::new();

        let mut first = TableMapEvent::default();
        first.table_id = 100;
        first.table = (&b"first"[..]).into();
        ctx.insert_table_map(first);

        let mut second = TableMapEvent::default();
        second.table_id = 100;
        second.table = (&b"second"[..]).into();
        ctx.insert_table_map(second);

        assert_eq!(ctx.table_map(100).unwrap().table.as_str(), "second");
        assert!(ctx.table_map(101).is_none());
    }
}
